//! Runtime environment detection — which capture provider is active.
//!
//! The host may hand us an extension-style capability object that can find
//! the active tab and capture it. When it does, captures go through that
//! object; otherwise they fall back to rasterizing the screen.

use crate::capture::{CaptureProvider, ExtensionCapture, Rasterizer, RenderRoot, WebCapture};
use std::sync::Arc;

/// A browser-style tab, as reported by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tab {
    pub id: Option<u32>,
    pub title: Option<String>,
    pub url: Option<String>,
}

/// Tab query and capture capability.
pub trait TabApi: Send + Sync {
    /// Locate the active tab in the current window.
    fn query_active_tab(&self) -> Result<Tab, String>;

    /// Capture the visible contents of `tab` as an encoded image string
    /// (`data:image/png;base64,...`).
    fn capture_visible_tab(&self, tab: &Tab) -> Result<String, String>;
}

/// Accessing the host capability object failed.
#[derive(Debug, thiserror::Error)]
#[error("Host capability access failed: {0}")]
pub struct HostAccessError(pub String);

/// The host-provided extension capability object.
pub trait ExtensionHost: Send + Sync {
    /// The tab capability, if this host exposes one.
    ///
    /// `Ok(None)` means the object exists but is only partially defined.
    fn tabs(&self) -> Result<Option<Arc<dyn TabApi>>, HostAccessError>;
}

/// True only if `host` exists and exposes a usable tab capability.
///
/// Never fails: an absent host, a missing tab field, or an access error
/// all read as "not an extension environment".
pub fn is_extension_environment(host: Option<&dyn ExtensionHost>) -> bool {
    let Some(host) = host else {
        return false;
    };
    match host.tabs() {
        Ok(Some(_)) => true,
        Ok(None) => false,
        Err(e) => {
            log::debug!("[ENV] Extension host not usable: {}", e);
            false
        }
    }
}

/// Capabilities resolved once at startup and injected into the workflow.
pub struct EnvironmentCapabilities {
    extension: Option<Arc<dyn ExtensionHost>>,
    rasterizer: Arc<dyn Rasterizer>,
    render_root: RenderRoot,
}

impl EnvironmentCapabilities {
    /// Resolve the environment. The extension host is kept only if detection
    /// says it is usable.
    pub fn resolve(
        host: Option<Arc<dyn ExtensionHost>>,
        rasterizer: Arc<dyn Rasterizer>,
        render_root: RenderRoot,
    ) -> Self {
        let extension = host.filter(|h| is_extension_environment(Some(h.as_ref())));
        log::info!(
            "[ENV] Resolved environment: {}",
            if extension.is_some() { "extension" } else { "web" }
        );
        Self {
            extension,
            rasterizer,
            render_root,
        }
    }

    pub fn is_extension(&self) -> bool {
        self.extension.is_some()
    }

    /// Build the capture provider variant this environment supports.
    pub fn capture_provider(&self) -> CaptureProvider {
        match &self.extension {
            Some(host) => CaptureProvider::Extension(ExtensionCapture::new(Some(host.clone()))),
            None => CaptureProvider::Web(WebCapture::new(
                self.rasterizer.clone(),
                self.render_root.clone(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    struct NoopTabs;

    impl TabApi for NoopTabs {
        fn query_active_tab(&self) -> Result<Tab, String> {
            Ok(Tab::default())
        }
        fn capture_visible_tab(&self, _tab: &Tab) -> Result<String, String> {
            Err("unused".into())
        }
    }

    struct WithTabs;
    impl ExtensionHost for WithTabs {
        fn tabs(&self) -> Result<Option<Arc<dyn TabApi>>, HostAccessError> {
            Ok(Some(Arc::new(NoopTabs)))
        }
    }

    struct WithoutTabs;
    impl ExtensionHost for WithoutTabs {
        fn tabs(&self) -> Result<Option<Arc<dyn TabApi>>, HostAccessError> {
            Ok(None)
        }
    }

    struct Throwing;
    impl ExtensionHost for Throwing {
        fn tabs(&self) -> Result<Option<Arc<dyn TabApi>>, HostAccessError> {
            Err(HostAccessError("permission denied".into()))
        }
    }

    struct BlankRasterizer;
    impl Rasterizer for BlankRasterizer {
        fn render_element_to_image(&self, _root: &RenderRoot) -> Result<RgbaImage, String> {
            Ok(RgbaImage::new(2, 2))
        }
    }

    #[test]
    fn absent_host_is_not_extension() {
        assert!(!is_extension_environment(None));
    }

    #[test]
    fn host_without_tabs_is_not_extension() {
        assert!(!is_extension_environment(Some(&WithoutTabs)));
    }

    #[test]
    fn throwing_host_is_not_extension() {
        assert!(!is_extension_environment(Some(&Throwing)));
    }

    #[test]
    fn host_with_tabs_is_extension() {
        assert!(is_extension_environment(Some(&WithTabs)));
    }

    #[test]
    fn resolve_picks_web_when_host_is_partial() {
        let env = EnvironmentCapabilities::resolve(
            Some(Arc::new(WithoutTabs)),
            Arc::new(BlankRasterizer),
            RenderRoot::Primary,
        );
        assert!(!env.is_extension());
        assert!(matches!(env.capture_provider(), CaptureProvider::Web(_)));
    }

    #[test]
    fn resolve_picks_extension_when_tabs_exist() {
        let env = EnvironmentCapabilities::resolve(
            Some(Arc::new(WithTabs)),
            Arc::new(BlankRasterizer),
            RenderRoot::Primary,
        );
        assert!(env.is_extension());
        assert!(matches!(env.capture_provider(), CaptureProvider::Extension(_)));
    }
}
