//! Document storage.
//!
//! Uploaded documents land in a directory on disk. The most recent upload
//! batch is the "active" set that interpreter-driven document queries run
//! against; the interpreter-free search endpoint scans the whole directory.

pub mod extract;

use crate::error::{AppError, AppResult};
use crate::models::DocumentMatch;
use extract::{extract_text, is_supported, snippet_around};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// One file received by the ingest endpoint.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Store for uploaded documents.
#[derive(Clone)]
pub struct DocumentStore {
    root: PathBuf,
    batch: Arc<RwLock<Vec<String>>>,
}

impl DocumentStore {
    /// Create a store rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            batch: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Directory the store writes into.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the storage directory if it does not exist.
    pub async fn init(&self) -> AppResult<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Store an upload batch. The batch replaces the previous active set;
    /// files stay on disk and remain visible to directory-wide search.
    pub async fn store_batch(&self, files: Vec<UploadedFile>) -> AppResult<Vec<String>> {
        if files.is_empty() {
            return Err(AppError::invalid_input("No files provided"));
        }

        let mut stored = Vec::with_capacity(files.len());
        for file in files {
            let name = sanitize_filename(&file.filename)?;
            let path = self.root.join(&name);
            tokio::fs::write(&path, &file.bytes).await?;
            if !is_supported(&name) {
                warn!(filename = %name, "Stored file has an unsupported format; document queries will skip it");
            }
            stored.push(name);
        }

        info!(count = stored.len(), "Stored upload batch");
        let mut batch = self.batch.write().await;
        *batch = stored.clone();
        Ok(stored)
    }

    /// File names of the active upload batch.
    pub async fn batch(&self) -> Vec<String> {
        self.batch.read().await.clone()
    }

    /// Read a stored document as text. Returns `None` for formats the
    /// extractor does not understand.
    pub async fn read_text(&self, filename: &str) -> AppResult<Option<String>> {
        let name = sanitize_filename(filename)?;
        if !is_supported(&name) {
            return Ok(None);
        }
        let path = self.root.join(&name);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|_| AppError::DocumentNotFound {
                filename: name.clone(),
            })?;
        Ok(Some(extract_text(&name, &bytes)))
    }

    /// List every stored file, sorted by name.
    pub async fn list_files(&self) -> AppResult<Vec<String>> {
        let mut names = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = dir.next_entry().await? {
            if entry.file_type().await?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Case-insensitive substring search over every stored document,
    /// returning one snippet per matching file.
    pub async fn search(&self, query: &str) -> AppResult<Vec<DocumentMatch>> {
        let needle = query.trim();
        if needle.is_empty() {
            return Err(AppError::invalid_input("Query text is required"));
        }

        let mut matches = Vec::new();
        for filename in self.list_files().await? {
            let Some(text) = self.read_text(&filename).await? else {
                continue;
            };
            if let Some(snippet) = snippet_around(&text, needle) {
                matches.push(DocumentMatch::snippet(filename, snippet));
            }
        }
        Ok(matches)
    }
}

/// Reduce an uploaded name to a bare file name, rejecting anything that
/// would escape the storage directory.
fn sanitize_filename(raw: &str) -> AppResult<String> {
    let name = Path::new(raw)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .trim()
        .to_string();

    if name.is_empty() || name == "." || name == ".." {
        return Err(AppError::invalid_input(format!(
            "Invalid file name: {:?}",
            raw
        )));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename_strips_directories() {
        assert_eq!(sanitize_filename("notes.txt").unwrap(), "notes.txt");
        assert_eq!(sanitize_filename("a/b/notes.txt").unwrap(), "notes.txt");
        assert_eq!(
            sanitize_filename("../../etc/passwd").unwrap(),
            "passwd"
        );
    }

    #[test]
    fn test_sanitize_filename_rejects_empty() {
        assert!(sanitize_filename("").is_err());
        assert!(sanitize_filename("..").is_err());
        assert!(sanitize_filename("   ").is_err());
    }
}
