//! Overlay and consent-banner suppression
//!
//! Known consent-management platforms and generic cookie-banner markup are
//! hidden with an injected style rule before capture. The selector list is
//! an allow-list of observed patterns, not a general overlay detector; sites
//! using unlisted markup keep their banners.

use crate::CaptureError;
use chromiumoxide::Page;

/// CSS selectors covering common consent-banner markup.
pub const OVERLAY_SELECTORS: &[&str] = &[
    // Consent management platforms
    "#onetrust-consent-sdk",
    "#onetrust-banner-sdk",
    "#CybotCookiebotDialog",
    "#CybotCookiebotDialogBodyUnderlay",
    "#didomi-host",
    ".didomi-popup-open",
    "#truste-consent-track",
    ".truste_box_overlay",
    "#usercentrics-root",
    ".qc-cmp2-container",
    "#sp_message_container_1",
    // Generic id/class patterns
    "#cookie-banner",
    "#cookie-notice",
    "#cookie-consent",
    "#gdpr-banner",
    "#gdpr-consent-tool-wrapper",
    ".cookie-banner",
    ".cookie-consent",
    ".cookie-notice",
    ".gdpr-banner",
    // Attribute selectors for flexible matching
    "[class*=\"cookie-banner\"]",
    "[class*=\"cookie-consent\"]",
    "[id*=\"cookie-banner\"]",
    "[id*=\"cookie-consent\"]",
    "[aria-label=\"cookie banner\"]",
];

/// Style rule that freezes CSS animations and transitions so repeated
/// captures of the same page are comparable.
pub(crate) const DISABLE_ANIMATIONS_CSS: &str =
    "*, *::before, *::after { animation: none !important; transition: none !important; }";

/// JavaScript that appends a style element with the given CSS.
///
/// The CSS is embedded in a single-quoted literal; selectors use double
/// quotes internally so no escaping is required.
pub(crate) fn inject_style_script(css: &str) -> String {
    debug_assert!(!css.contains('\''));
    format!(
        "(() => {{ const style = document.createElement('style'); \
         style.textContent = '{css}'; \
         document.documentElement.appendChild(style); }})()"
    )
}

/// Hide known consent-banner overlays on the page.
pub async fn hide_overlays(page: &Page) -> Result<(), CaptureError> {
    let css = format!(
        "{} {{ display: none !important; visibility: hidden !important; }}",
        OVERLAY_SELECTORS.join(", ")
    );
    page.evaluate(inject_style_script(&css))
        .await
        .map_err(|e| CaptureError::Script(e.to_string()))?;
    Ok(())
}

/// Disable CSS animations and transitions on the page.
pub(crate) async fn disable_animations(page: &Page) -> Result<(), CaptureError> {
    page.evaluate(inject_style_script(DISABLE_ANIMATIONS_CSS))
        .await
        .map_err(|e| CaptureError::Script(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_list_is_non_empty() {
        assert!(!OVERLAY_SELECTORS.is_empty());
    }

    #[test]
    fn covers_major_consent_platforms() {
        let joined = OVERLAY_SELECTORS.join(" ");
        assert!(joined.contains("onetrust"));
        assert!(joined.contains("Cookiebot"));
        assert!(joined.contains("didomi"));
        assert!(joined.contains("truste"));
    }

    #[test]
    fn covers_generic_cookie_patterns() {
        assert!(OVERLAY_SELECTORS.contains(&"#cookie-banner"));
        assert!(OVERLAY_SELECTORS.contains(&".cookie-consent"));
        assert!(OVERLAY_SELECTORS.contains(&"#gdpr-banner"));
    }

    #[test]
    fn includes_attribute_selectors() {
        assert!(OVERLAY_SELECTORS.iter().any(|s| s.contains("[class*=")));
        assert!(OVERLAY_SELECTORS.iter().any(|s| s.contains("[id*=")));
    }

    #[test]
    fn no_selector_uses_single_quotes() {
        // The injection script wraps the CSS in single quotes.
        assert!(OVERLAY_SELECTORS.iter().all(|s| !s.contains('\'')));
        assert!(!DISABLE_ANIMATIONS_CSS.contains('\''));
    }

    #[test]
    fn injection_script_embeds_the_css() {
        let script = inject_style_script("#x { display: none; }");
        assert!(script.contains("document.createElement('style')"));
        assert!(script.contains("#x { display: none; }"));
    }
}
