//! Integration tests for the document store.
//!
//! Tests verify that:
//! - Upload batches are stored and replace the previous active set
//! - Unsupported formats are stored but skipped during extraction
//! - Directory-wide search returns bounded snippets

use askdata::docs::{DocumentStore, UploadedFile};
use askdata::error::AppError;
use tempfile::TempDir;

fn upload(name: &str, content: &str) -> UploadedFile {
    UploadedFile {
        filename: name.to_string(),
        bytes: content.as_bytes().to_vec(),
    }
}

async fn store() -> (TempDir, DocumentStore) {
    let dir = TempDir::new().unwrap();
    let store = DocumentStore::new(dir.path());
    store.init().await.unwrap();
    (dir, store)
}

#[tokio::test]
async fn test_store_batch_writes_files() {
    let (_dir, store) = store().await;

    let stored = store
        .store_batch(vec![
            upload("notes.txt", "alpha beta"),
            upload("data.csv", "x,y\n1,2"),
        ])
        .await
        .unwrap();

    assert_eq!(stored, vec!["notes.txt", "data.csv"]);
    assert_eq!(store.batch().await, vec!["notes.txt", "data.csv"]);

    let text = store.read_text("notes.txt").await.unwrap().unwrap();
    assert_eq!(text, "alpha beta");
}

#[tokio::test]
async fn test_empty_batch_is_rejected() {
    let (_dir, store) = store().await;
    let result = store.store_batch(vec![]).await;
    assert!(matches!(result, Err(AppError::InvalidInput { .. })));
}

#[tokio::test]
async fn test_new_batch_replaces_active_set_but_keeps_files() {
    let (_dir, store) = store().await;

    store
        .store_batch(vec![upload("first.txt", "one")])
        .await
        .unwrap();
    store
        .store_batch(vec![upload("second.txt", "two")])
        .await
        .unwrap();

    // Active set is the latest batch only
    assert_eq!(store.batch().await, vec!["second.txt"]);
    // Earlier uploads are still on disk and searchable
    let all = store.list_files().await.unwrap();
    assert_eq!(all, vec!["first.txt", "second.txt"]);
}

#[tokio::test]
async fn test_unsupported_format_reads_as_none() {
    let (_dir, store) = store().await;
    store
        .store_batch(vec![upload("report.pdf", "%PDF-1.4 ...")])
        .await
        .unwrap();

    assert!(store.read_text("report.pdf").await.unwrap().is_none());
}

#[tokio::test]
async fn test_missing_file_is_an_error() {
    let (_dir, store) = store().await;
    let result = store.read_text("ghost.txt").await;
    assert!(matches!(result, Err(AppError::DocumentNotFound { .. })));
}

#[tokio::test]
async fn test_path_traversal_names_are_flattened() {
    let (dir, store) = store().await;
    store
        .store_batch(vec![upload("../escape.txt", "content")])
        .await
        .unwrap();

    // The file landed inside the store, not outside it
    assert!(dir.path().join("escape.txt").exists());
    assert!(!dir.path().parent().unwrap().join("escape.txt").exists());
}

#[tokio::test]
async fn test_search_returns_snippets_per_matching_file() {
    let (_dir, store) = store().await;
    store
        .store_batch(vec![
            upload("a.txt", "quarterly revenue grew by ten percent"),
            upload("b.txt", "nothing relevant here"),
            upload("c.md", "Revenue projections for next year"),
        ])
        .await
        .unwrap();

    let matches = store.search("revenue").await.unwrap();
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].filename, "a.txt");
    assert!(matches[0].snippet.as_ref().unwrap().contains("revenue"));
    assert_eq!(matches[1].filename, "c.md");
}

#[tokio::test]
async fn test_search_rejects_empty_query() {
    let (_dir, store) = store().await;
    let result = store.search("   ").await;
    assert!(matches!(result, Err(AppError::InvalidInput { .. })));
}
