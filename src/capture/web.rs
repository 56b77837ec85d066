//! Web capture — rasterize a render root into a PNG.

use super::{encode_png, CaptureError, ImageBlob};
use image::RgbaImage;
use std::sync::Arc;

/// What to rasterize.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RenderRoot {
    /// The primary monitor (or the first one if none reports as primary).
    #[default]
    Primary,
    /// A monitor by name.
    Monitor(String),
}

/// Rasterization capability.
pub trait Rasterizer: Send + Sync {
    fn render_element_to_image(&self, root: &RenderRoot) -> Result<RgbaImage, String>;
}

pub struct WebCapture {
    rasterizer: Arc<dyn Rasterizer>,
    root: RenderRoot,
}

impl WebCapture {
    pub fn new(rasterizer: Arc<dyn Rasterizer>, root: RenderRoot) -> Self {
        Self { rasterizer, root }
    }

    pub async fn capture(&self) -> Result<ImageBlob, CaptureError> {
        let rasterizer = self.rasterizer.clone();
        let root = self.root.clone();

        let png = tokio::task::spawn_blocking(move || {
            let image = rasterizer
                .render_element_to_image(&root)
                .map_err(|e| CaptureError::Failed(format!("Rasterization failed: {}", e)))?;
            encode_png(image)
        })
        .await
        .map_err(|e| CaptureError::Failed(format!("Capture task failed: {}", e)))??;

        Ok(ImageBlob::png(png))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<(u32, u32), String>);

    impl Rasterizer for Fixed {
        fn render_element_to_image(&self, root: &RenderRoot) -> Result<RgbaImage, String> {
            assert_eq!(root, &RenderRoot::Primary);
            self.0.clone().map(|(w, h)| RgbaImage::new(w, h))
        }
    }

    #[tokio::test]
    async fn rasterized_page_becomes_png_blob() {
        let capture = WebCapture::new(Arc::new(Fixed(Ok((32, 24)))), RenderRoot::Primary);
        let blob = capture.capture().await.unwrap();
        assert_eq!(&blob.bytes[..4], &[0x89, 0x50, 0x4E, 0x47]);
        assert!(blob.name.starts_with("screenshot-"));
    }

    #[tokio::test]
    async fn rasterization_error_is_capture_failed() {
        let capture = WebCapture::new(
            Arc::new(Fixed(Err("cross-origin content".into()))),
            RenderRoot::Primary,
        );
        let result = capture.capture().await;
        assert!(matches!(result, Err(CaptureError::Failed(msg)) if msg.contains("cross-origin")));
    }
}
