//! Local preview of the last capture.
//!
//! The preview is a file under the preview directory. It lives exactly as
//! long as the capture it belongs to and is removed when released.

use crate::capture::ImageBlob;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct PreviewHandle {
    path: PathBuf,
    released: bool,
}

impl PreviewHandle {
    /// Write `blob` to `<dir>/<blob name>`.
    pub fn create(dir: &Path, blob: &ImageBlob) -> std::io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&blob.name);
        std::fs::write(&path, &blob.bytes)?;
        Ok(Self {
            path,
            released: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the preview file.
    pub fn release(mut self) {
        self.remove();
    }

    /// Give up ownership of the file; it stays on disk.
    pub fn keep(mut self) -> PathBuf {
        self.released = true;
        std::mem::take(&mut self.path)
    }

    fn remove(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("[WORKFLOW] Could not remove preview {}: {}", self.path.display(), e);
            }
        }
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.remove();
    }
}
