//! Durable storage for uploaded identity documents
//!
//! Documents land on the local filesystem under a configured directory and
//! are served statically under `/uploads`. The write completes before the
//! ledger is touched, so a failed upload aborts the whole application
//! attempt instead of leaving a dangling reference.

use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

/// Document storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create upload directory: {0}")]
    CreateDirFailed(String),

    #[error("Failed to write document: {0}")]
    WriteFailed(String),

    #[error("Unsupported file name")]
    BadFileName,
}

/// Filesystem-backed document store
#[derive(Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    /// Create a store rooted at `root`, creating the directory if needed
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .map_err(|e| StorageError::CreateDirFailed(e.to_string()))?;
        Ok(Self { root })
    }

    /// Persist an uploaded document and return its serving path
    ///
    /// The stored name is `<field>-<uuid><ext>` so uploads never collide and
    /// the client-supplied name never reaches the filesystem.
    pub async fn save(
        &self,
        field_name: &str,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<String, StorageError> {
        let extension = sanitize_extension(original_name)?;
        let file_name = format!("{}-{}{}", field_name, Uuid::new_v4(), extension);
        let path = self.root.join(&file_name);

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;

        tracing::debug!(file = %file_name, size = bytes.len(), "Document stored");

        Ok(format!("/uploads/{}", file_name))
    }

    /// Directory the store writes into, for static serving
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Extract a safe extension (".png", ".pdf", ...) from a client file name
fn sanitize_extension(original_name: &str) -> Result<String, StorageError> {
    let name = Path::new(original_name)
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or(StorageError::BadFileName)?;

    match Path::new(name).extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.chars().all(|c| c.is_ascii_alphanumeric()) && ext.len() <= 8 => {
            Ok(format!(".{}", ext.to_ascii_lowercase()))
        }
        Some(_) => Err(StorageError::BadFileName),
        None => Ok(String::new()),
    }
}
