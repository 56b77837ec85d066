//! Object store contract — the narrow surface the upload client needs.

use crate::capture::ImageBlob;
use serde::Serialize;

/// Write options passed through to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// `Cache-Control` max-age in seconds.
    pub cache_control_secs: u32,
    /// Overwrite an existing object at the same path.
    pub upsert: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            cache_control_secs: 3600,
            upsert: false,
        }
    }
}

/// Where the backend put the object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub path: String,
}

/// A shareable link and when it stops being valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkRecord {
    pub url: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend answered and refused the request.
    #[error("{0}")]
    Rejected(String),

    /// The request never got a usable answer.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Remote object storage plus its link metadata table.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    async fn store(
        &self,
        path: &str,
        blob: &ImageBlob,
        options: &StoreOptions,
    ) -> Result<StoredObject, StoreError>;

    fn public_url_for(&self, path: &str) -> String;

    async fn insert_link_record(&self, table: &str, record: &LinkRecord) -> Result<(), StoreError>;
}
