//! Screen capture domain — public API.
//!
//! Two provider variants produce the same `ImageBlob`:
//! - `ExtensionCapture` asks the host's tab capability for the active tab
//! - `WebCapture` rasterizes a render root (a monitor on desktop)
//!
//! Both are single attempt; a failed capture leaves nothing behind.

mod blob;
mod desktop;
mod extension;
mod web;

pub use blob::{encode_png, ImageBlob};
pub use desktop::{DesktopHost, FocusedWindowTabs, ScreenRasterizer};
pub use extension::{decode_data_url, ExtensionCapture};
pub use web::{Rasterizer, RenderRoot, WebCapture};

/// Capture provider selected once at startup.
pub enum CaptureProvider {
    Extension(ExtensionCapture),
    Web(WebCapture),
}

impl CaptureProvider {
    /// Take one screenshot and return it as a PNG blob.
    pub async fn capture(&self) -> Result<ImageBlob, CaptureError> {
        let start = std::time::Instant::now();
        let result = match self {
            Self::Extension(p) => p.capture().await,
            Self::Web(p) => p.capture().await,
        };
        match &result {
            Ok(blob) => log::info!(
                "[CAPTURE] {} capture took {}ms — {} ({} bytes)",
                self.kind(),
                start.elapsed().as_millis(),
                blob.name,
                blob.len()
            ),
            Err(e) => log::warn!("[CAPTURE] {} capture failed: {}", self.kind(), e),
        }
        result
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Extension(_) => "extension",
            Self::Web(_) => "web",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Capture unavailable: {0}")]
    Unavailable(String),

    #[error("Capture failed: {0}")]
    Failed(String),
}
