//! Ingest-related data models.

use serde::{Deserialize, Serialize};

/// Request body of the database ingest endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestDatabaseRequest {
    pub connection_string: String,
}

/// Response body of the document ingest endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentIngestResponse {
    pub message: String,
    pub uploaded_files: Vec<String>,
}

impl DocumentIngestResponse {
    /// Build the standard upload confirmation for a stored batch.
    pub fn for_batch(uploaded_files: Vec<String>) -> Self {
        Self {
            message: format!("{} file(s) uploaded successfully.", uploaded_files.len()),
            uploaded_files,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_batch_message() {
        let resp = DocumentIngestResponse::for_batch(vec!["a.txt".into(), "b.csv".into()]);
        assert_eq!(resp.message, "2 file(s) uploaded successfully.");
        assert_eq!(resp.uploaded_files.len(), 2);
    }
}
