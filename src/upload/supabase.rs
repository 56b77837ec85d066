//! Supabase-compatible object store over its REST endpoints.
//!
//!   objects: POST {base}/storage/v1/object/{bucket}/{path}
//!   public:       {base}/storage/v1/object/public/{bucket}/{path}
//!   links:   POST {base}/rest/v1/{table}

use super::store::{LinkRecord, ObjectStore, StoreError, StoreOptions, StoredObject};
use crate::capture::ImageBlob;
use reqwest::Client;

pub struct SupabaseStore {
    client: Client,
    base_url: String,
    anon_key: String,
    bucket: String,
}

impl SupabaseStore {
    pub fn new(base_url: &str, anon_key: &str, bucket: &str) -> Result<Self, StoreError> {
        let client = Client::builder()
            .user_agent(concat!("snapshare/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            bucket: bucket.to_string(),
        })
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }
}

/// Pull a human-readable message out of an error body.
async fn rejection(response: reqwest::Response) -> StoreError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|json| {
            json.get("message")
                .or_else(|| json.get("error"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("HTTP {}", status));
    log::debug!("[UPLOAD] Backend returned {}: {}", status, body);
    StoreError::Rejected(message)
}

#[async_trait::async_trait]
impl ObjectStore for SupabaseStore {
    async fn store(
        &self,
        path: &str,
        blob: &ImageBlob,
        options: &StoreOptions,
    ) -> Result<StoredObject, StoreError> {
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url, self.bucket, path
        );

        let response = self
            .authorized(self.client.post(&url))
            .header("cache-control", format!("max-age={}", options.cache_control_secs))
            .header("x-upsert", options.upsert.to_string())
            .header("content-type", &blob.mime)
            .body(blob.bytes.clone())
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        Ok(StoredObject {
            path: path.to_string(),
        })
    }

    fn public_url_for(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, path
        )
    }

    async fn insert_link_record(&self, table: &str, record: &LinkRecord) -> Result<(), StoreError> {
        let url = format!("{}/rest/v1/{}", self.base_url, table);

        let response = self
            .authorized(self.client.post(&url))
            .header("Prefer", "return=representation")
            .json(&[record])
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{body_json, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn blob() -> ImageBlob {
        ImageBlob::png_at(vec![0u8; 1024], 1_700_000_000_000)
    }

    #[test]
    fn public_url_uses_public_prefix() {
        let store = SupabaseStore::new("https://proj.supabase.co/", "key", "screenshots").unwrap();
        assert_eq!(
            store.public_url_for("public/abc.png"),
            "https://proj.supabase.co/storage/v1/object/public/screenshots/public/abc.png"
        );
    }

    #[tokio::test]
    async fn store_posts_blob_with_options() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/screenshots/public/abc.png"))
            .and(header("apikey", "anon"))
            .and(header("authorization", "Bearer anon"))
            .and(header("cache-control", "max-age=3600"))
            .and(header("x-upsert", "false"))
            .and(header("content-type", "image/png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"Key": "screenshots/public/abc.png"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let store = SupabaseStore::new(&server.uri(), "anon", "screenshots").unwrap();
        let stored = store
            .store("public/abc.png", &blob(), &StoreOptions::default())
            .await
            .unwrap();
        assert_eq!(stored.path, "public/abc.png");
    }

    #[tokio::test]
    async fn store_rejection_carries_backend_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
                "statusCode": "409",
                "error": "Duplicate",
                "message": "The resource already exists"
            })))
            .mount(&server)
            .await;

        let store = SupabaseStore::new(&server.uri(), "anon", "screenshots").unwrap();
        let err = store
            .store("public/abc.png", &blob(), &StoreOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected(ref m) if m == "The resource already exists"));
    }

    #[tokio::test]
    async fn store_rejection_without_body_uses_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let store = SupabaseStore::new(&server.uri(), "anon", "screenshots").unwrap();
        let err = store
            .store("public/abc.png", &blob(), &StoreOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn link_record_is_posted_as_array() {
        let server = MockServer::start().await;
        let expires_at = chrono::DateTime::parse_from_rfc3339("2026-11-15T00:00:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        Mock::given(method("POST"))
            .and(path("/rest/v1/shared_screenshots"))
            .and(header("prefer", "return=representation"))
            .and(body_json(serde_json::json!([{
                "url": "https://example.com/a.png",
                "expires_at": "2026-11-15T00:00:00Z"
            }])))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let store = SupabaseStore::new(&server.uri(), "anon", "screenshots").unwrap();
        store
            .insert_link_record(
                "shared_screenshots",
                &LinkRecord {
                    url: "https://example.com/a.png".into(),
                    expires_at,
                },
            )
            .await
            .unwrap();
    }
}
