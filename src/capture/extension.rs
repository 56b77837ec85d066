//! Extension capture — active tab via the host's tab capability.

use super::{CaptureError, ImageBlob};
use crate::environment::ExtensionHost;
use base64::{engine::general_purpose::STANDARD, Engine};
use std::sync::Arc;

pub struct ExtensionCapture {
    host: Option<Arc<dyn ExtensionHost>>,
}

impl ExtensionCapture {
    pub fn new(host: Option<Arc<dyn ExtensionHost>>) -> Self {
        Self { host }
    }

    /// Locate the active tab, capture it, and decode the result into a blob.
    pub async fn capture(&self) -> Result<ImageBlob, CaptureError> {
        let host = self
            .host
            .clone()
            .ok_or_else(|| CaptureError::Unavailable("Extension APIs not available".into()))?;

        let tabs = match host.tabs() {
            Ok(Some(tabs)) => tabs,
            Ok(None) => {
                return Err(CaptureError::Unavailable(
                    "Extension host has no tab capability".into(),
                ))
            }
            Err(e) => return Err(CaptureError::Unavailable(e.to_string())),
        };

        // Host calls may block on the OS, keep them off the async workers.
        let data_url = tokio::task::spawn_blocking(move || {
            let tab = tabs
                .query_active_tab()
                .map_err(|e| CaptureError::Failed(format!("No active tab: {}", e)))?;
            log::debug!("[CAPTURE] Active tab: {:?}", tab.title);
            tabs.capture_visible_tab(&tab).map_err(CaptureError::Failed)
        })
        .await
        .map_err(|e| CaptureError::Failed(format!("Capture task failed: {}", e)))??;

        let bytes = decode_data_url(&data_url)?;
        Ok(ImageBlob::png(bytes))
    }
}

/// Decode a base64 `data:` URL into raw bytes.
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>, CaptureError> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| CaptureError::Failed("Capture did not return a data URL".into()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| CaptureError::Failed("Malformed data URL".into()))?;

    if !meta.ends_with(";base64") {
        return Err(CaptureError::Failed(
            "Data URL payload is not base64-encoded".into(),
        ));
    }

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| CaptureError::Failed(format!("Invalid base64 image data: {}", e)))?;
    if bytes.is_empty() {
        return Err(CaptureError::Failed("Capture produced an empty image".into()));
    }
    Ok(bytes)
}
