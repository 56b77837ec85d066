//! Upload client — push a blob to object storage and return its public link.
//!
//! The object write is fatal on failure. Registering the link record is
//! best-effort: a failure is logged and the public URL is still returned.

mod store;
mod supabase;

pub use store::{LinkRecord, ObjectStore, StoreError, StoreOptions, StoredObject};
pub use supabase::SupabaseStore;

use crate::capture::ImageBlob;
use rand::Rng;
use std::sync::Arc;

/// Days a shared link stays valid.
pub const LINK_TTL_DAYS: i64 = 30;

const NAME_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const NAME_LEN: usize = 13;

/// Where and how uploads are written.
#[derive(Debug, Clone)]
pub struct UploadSettings {
    /// Public-readable folder inside the bucket.
    pub folder: String,
    pub options: StoreOptions,
    /// Metadata table for link records.
    pub links_table: String,
    pub link_ttl: chrono::Duration,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            folder: "public".to_string(),
            options: StoreOptions::default(),
            links_table: "shared_screenshots".to_string(),
            link_ttl: chrono::Duration::days(LINK_TTL_DAYS),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Upload failed: {0}")]
    Failed(String),
}

pub struct UploadClient {
    store: Arc<dyn ObjectStore>,
    settings: UploadSettings,
}

impl UploadClient {
    pub fn new(store: Arc<dyn ObjectStore>, settings: UploadSettings) -> Self {
        Self { store, settings }
    }

    /// Upload `blob` under a random name and return its public URL.
    pub async fn upload(&self, blob: &ImageBlob) -> Result<String, UploadError> {
        let start = std::time::Instant::now();
        let file_name = random_object_name(blob);
        let path = format!("{}/{}", self.settings.folder, file_name);

        let stored = self
            .store
            .store(&path, blob, &self.settings.options)
            .await
            .map_err(|e| {
                log::error!("[UPLOAD] Store write failed for {}: {}", path, e);
                UploadError::Failed(e.to_string())
            })?;

        let public_url = self.store.public_url_for(&stored.path);
        log::info!(
            "[UPLOAD] Stored {} bytes at {} in {}ms",
            blob.len(),
            stored.path,
            start.elapsed().as_millis()
        );

        let record = LinkRecord {
            url: public_url.clone(),
            expires_at: chrono::Utc::now() + self.settings.link_ttl,
        };
        if let Err(e) = self
            .store
            .insert_link_record(&self.settings.links_table, &record)
            .await
        {
            // Still return the public URL even if the record insert fails
            log::error!("[UPLOAD] Error saving link record: {}", e);
        }

        Ok(public_url)
    }
}

/// `<13 random base-36 chars>.<ext>`, keeping only the blob's extension.
pub fn random_object_name(blob: &ImageBlob) -> String {
    let mut rng = rand::thread_rng();
    let stem: String = (0..NAME_LEN)
        .map(|_| NAME_ALPHABET[rng.gen_range(0..NAME_ALPHABET.len())] as char)
        .collect();
    let ext = blob
        .extension()
        .unwrap_or_else(|| extension_for_mime(&blob.mime));
    format!("{}.{}", stem, ext)
}

fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        _ => "bin",
    }
}
