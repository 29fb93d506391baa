//! Shared rendering-engine lifecycle management
//!
//! [`BrowserManager`] owns one lazily-launched headless Chrome instance and
//! hands out isolated execution contexts for individual capture units. The
//! engine outlives every context created from it while open, and may be
//! closed and relaunched across batches.

use crate::{engine_args, CaptureError, DeviceProfile, EngineConfig};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::Page;
use futures::StreamExt;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// The launched engine plus the task draining its CDP event stream.
struct Engine {
    browser: Arc<Mutex<Browser>>,
    handler: tokio::task::JoinHandle<()>,
}

/// An isolated browsing session created from the shared engine.
///
/// Each context has independent cookies, storage, and viewport; contexts
/// created concurrently share no mutable page state.
pub struct ExecutionContext {
    id: BrowserContextId,
    browser: Arc<Mutex<Browser>>,
    device: DeviceProfile,
}

impl ExecutionContext {
    pub fn id(&self) -> &BrowserContextId {
        &self.id
    }

    pub fn device(&self) -> &DeviceProfile {
        &self.device
    }

    /// Create a page inside this context with the device's viewport applied.
    pub async fn new_page(&self) -> Result<Page, CaptureError> {
        let params = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(self.id.clone())
            .build()
            .map_err(CaptureError::ContextFailed)?;

        let page = {
            let browser = self.browser.lock().await;
            browser
                .new_page(params)
                .await
                .map_err(|e| CaptureError::ContextFailed(e.to_string()))?
        };

        let metrics = SetDeviceMetricsOverrideParams::builder()
            .width(i64::from(self.device.width))
            .height(i64::from(self.device.height))
            .device_scale_factor(self.device.scale_factor)
            .mobile(self.device.is_mobile())
            .build()
            .map_err(CaptureError::ContextFailed)?;

        page.execute(metrics)
            .await
            .map_err(|e| CaptureError::ContextFailed(e.to_string()))?;

        Ok(page)
    }
}

/// Lifecycle manager for the one shared rendering-engine instance.
///
/// Launching is lazy and idempotent; closing is idempotent; a closed manager
/// can launch a fresh instance. Contexts are tracked so that releasing the
/// same context twice is a no-op rather than an error.
pub struct BrowserManager {
    engine: Arc<Mutex<Option<Engine>>>,
    open_contexts: Arc<Mutex<HashSet<BrowserContextId>>>,
    // Mirrors engine presence so is_launched() never takes the lock.
    launched: Arc<AtomicBool>,
    config: EngineConfig,
}

impl BrowserManager {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            engine: Arc::new(Mutex::new(None)),
            open_contexts: Arc::new(Mutex::new(HashSet::new())),
            launched: Arc::new(AtomicBool::new(false)),
            config,
        }
    }

    /// Launch the shared engine, or return the existing handle if open.
    ///
    /// The engine lock is held across the launch, so concurrent callers
    /// serialize onto a single in-flight launch and all observe the same
    /// instance.
    pub async fn launch(&self) -> Result<Arc<Mutex<Browser>>, CaptureError> {
        let mut engine = self.engine.lock().await;

        if let Some(engine) = engine.as_ref() {
            return Ok(engine.browser.clone());
        }

        let (browser, mut handler) = Browser::launch(build_browser_config(&self.config)?)
            .await
            .map_err(|e| CaptureError::LaunchFailed(e.to_string()))?;

        // The handler stream carries CDP protocol traffic and must be polled
        // for the browser connection to make progress.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("engine handler error: {e}");
                }
            }
            debug!("engine handler stream ended");
        });

        let browser = Arc::new(Mutex::new(browser));
        *engine = Some(Engine {
            browser: browser.clone(),
            handler: handler_task,
        });
        self.launched.store(true, Ordering::SeqCst);
        info!("rendering engine launched");

        Ok(browser)
    }

    /// Create an isolated execution context for a device profile.
    ///
    /// Auto-launches the engine on first use. Concurrent calls are safe and
    /// produce fully independent contexts.
    pub async fn create_context(
        &self,
        device: &DeviceProfile,
    ) -> Result<ExecutionContext, CaptureError> {
        let browser = self.launch().await?;

        let id = {
            let browser = browser.lock().await;
            let response = browser
                .execute(CreateBrowserContextParams::default())
                .await
                .map_err(|e| CaptureError::ContextFailed(e.to_string()))?;
            response.result.browser_context_id.clone()
        };

        self.open_contexts.lock().await.insert(id.clone());
        debug!(device = %device.name, "created execution context");

        Ok(ExecutionContext {
            id,
            browser,
            device: device.clone(),
        })
    }

    /// Release one execution context. Safe to call more than once on the
    /// same context; the second call is a no-op.
    pub async fn close_context(&self, context: &ExecutionContext) {
        if !self.untrack_context(&context.id).await {
            return;
        }

        let engine = self.engine.lock().await;
        if let Some(engine) = engine.as_ref() {
            let browser = engine.browser.lock().await;
            if let Err(e) = browser
                .execute(DisposeBrowserContextParams::new(context.id.clone()))
                .await
            {
                warn!("failed to dispose execution context: {e}");
            }
        }
        debug!(device = %context.device.name, "released execution context");
    }

    /// Close all contexts and the shared engine. No-op when not launched;
    /// a later [`launch`](Self::launch) starts a fresh instance.
    pub async fn close(&self) {
        let engine = self.engine.lock().await.take();
        let Some(engine) = engine else {
            return;
        };

        let ids: Vec<BrowserContextId> = self.open_contexts.lock().await.drain().collect();
        {
            let mut browser = engine.browser.lock().await;
            for id in ids {
                if let Err(e) = browser.execute(DisposeBrowserContextParams::new(id)).await {
                    warn!("failed to dispose execution context during shutdown: {e}");
                }
            }
            if let Err(e) = browser.close().await {
                warn!("engine close reported error: {e}");
            }
        }
        engine.handler.abort();

        self.launched.store(false, Ordering::SeqCst);
        info!("rendering engine closed");
    }

    /// Whether the shared engine is currently open. Pure observer.
    pub fn is_launched(&self) -> bool {
        self.launched.load(Ordering::SeqCst)
    }

    /// Remove a context from the open set. Returns whether it was still
    /// tracked; only the first caller gets `true` and proceeds to dispose.
    async fn untrack_context(&self, id: &BrowserContextId) -> bool {
        self.open_contexts.lock().await.remove(id)
    }
}

impl Clone for BrowserManager {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            open_contexts: self.open_contexts.clone(),
            launched: self.launched.clone(),
            config: self.config.clone(),
        }
    }
}

fn build_browser_config(config: &EngineConfig) -> Result<BrowserConfig, CaptureError> {
    let mut builder = BrowserConfig::builder().args(engine_args(config));

    if config.headed {
        builder = builder.with_head();
    }

    if let Some(chrome_path) = &config.chrome_path {
        builder = builder.chrome_executable(chrome_path);
    }

    builder.build().map_err(CaptureError::Configuration)
}
