//! Runtime configuration from the environment (and `.env`).
//!
//! Local state lives in the platform-appropriate directories:
//!   history:  <data dir>/snapshare/screenshotHistory.json
//!   previews: <cache dir>/snapshare/previews/
//!
//! `SNAPSHARE_DATA_DIR` overrides both roots.

use std::path::PathBuf;

pub const ENV_SUPABASE_URL: &str = "SNAPSHARE_SUPABASE_URL";
pub const ENV_SUPABASE_ANON_KEY: &str = "SNAPSHARE_SUPABASE_ANON_KEY";
pub const ENV_BUCKET: &str = "SNAPSHARE_BUCKET";
pub const ENV_LINKS_TABLE: &str = "SNAPSHARE_LINKS_TABLE";
pub const ENV_DATA_DIR: &str = "SNAPSHARE_DATA_DIR";

const APP_DIR: &str = "snapshare";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub bucket: String,
    pub links_table: String,
    pub data_dir: PathBuf,
    pub preview_dir: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set — add it to the environment or .env")]
    Missing(&'static str),
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let (data_dir, preview_dir) = match get(ENV_DATA_DIR) {
            Some(root) => {
                let root = PathBuf::from(root);
                (root.clone(), root.join("previews"))
            }
            None => (
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(APP_DIR),
                dirs::cache_dir()
                    .unwrap_or_else(std::env::temp_dir)
                    .join(APP_DIR)
                    .join("previews"),
            ),
        };

        Self {
            supabase_url: get(ENV_SUPABASE_URL),
            supabase_anon_key: get(ENV_SUPABASE_ANON_KEY),
            bucket: get(ENV_BUCKET).unwrap_or_else(|| "screenshots".to_string()),
            links_table: get(ENV_LINKS_TABLE).unwrap_or_else(|| "shared_screenshots".to_string()),
            data_dir,
            preview_dir,
        }
    }

    /// Backend URL and key, both required for uploads.
    pub fn backend(&self) -> Result<(&str, &str), ConfigError> {
        let url = self
            .supabase_url
            .as_deref()
            .ok_or(ConfigError::Missing(ENV_SUPABASE_URL))?;
        let key = self
            .supabase_anon_key
            .as_deref()
            .ok_or(ConfigError::Missing(ENV_SUPABASE_ANON_KEY))?;
        Ok((url, key))
    }
}
