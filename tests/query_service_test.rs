//! Integration tests for query orchestration.
//!
//! The interpreter is stubbed so the flow around it - caching, read-only
//! enforcement, SQL execution, document operations - can be exercised
//! deterministically against a temporary SQLite database.

use askdata::cache::QueryCache;
use askdata::db::{EngineCache, EngineOptions, QueryExecutor};
use askdata::docs::{DocumentStore, UploadedFile};
use askdata::error::{AppError, AppResult};
use askdata::llm::{QueryPlan, QueryPlanner};
use askdata::models::{DocumentIntent, QueryRequest, QueryResponse};
use askdata::query::QueryService;
use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::{NamedTempFile, TempDir};

/// Planner stub returning a fixed plan.
struct StubPlanner {
    plan: QueryPlan,
}

#[async_trait]
impl QueryPlanner for StubPlanner {
    async fn plan(&self, _query: &str, _schema: &serde_json::Value) -> AppResult<QueryPlan> {
        Ok(self.plan.clone())
    }

    async fn summarize(&self, _text: &str) -> AppResult<String> {
        Ok("stub summary".to_string())
    }

    async fn answer(&self, question: &str, _text: &str) -> AppResult<String> {
        Ok(format!("stub answer: {}", question))
    }
}

async fn setup_db() -> String {
    let temp_file = NamedTempFile::new().unwrap();
    let db_path = temp_file
        .into_temp_path()
        .keep()
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path))
        .unwrap()
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await.unwrap();
    sqlx::query("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL)")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO users (id, name) VALUES (1, 'ada'), (2, 'grace')")
        .execute(&pool)
        .await
        .unwrap();
    pool.close().await;
    db_path
}

struct Harness {
    service: QueryService,
    cache: Arc<QueryCache>,
    _docs_dir: TempDir,
}

async fn harness(plan: QueryPlan, docs: Vec<UploadedFile>) -> Harness {
    let docs_dir = TempDir::new().unwrap();
    let documents = Arc::new(DocumentStore::new(docs_dir.path()));
    documents.init().await.unwrap();
    if !docs.is_empty() {
        documents.store_batch(docs).await.unwrap();
    }

    let cache = Arc::new(QueryCache::new(Duration::from_secs(60)));
    let service = QueryService::new(
        Arc::new(EngineCache::new(EngineOptions::default())),
        QueryExecutor::new(),
        cache.clone(),
        documents,
        Arc::new(StubPlanner { plan }),
        false,
    );

    Harness {
        service,
        cache,
        _docs_dir: docs_dir,
    }
}

fn upload(name: &str, content: &str) -> UploadedFile {
    UploadedFile {
        filename: name.to_string(),
        bytes: content.as_bytes().to_vec(),
    }
}

#[tokio::test]
async fn test_sql_plan_executes_and_caches() {
    let db_path = setup_db().await;
    let conn = format!("sqlite:{}", db_path);
    let h = harness(
        QueryPlan::Sql {
            query: "SELECT id, name FROM users ORDER BY id".to_string(),
            explanation: Some("list users".to_string()),
        },
        vec![],
    )
    .await;

    let req = QueryRequest::database(&conn, "show me all users");
    let first = h.service.run(&req).await.unwrap();

    let QueryResponse::Database(data) = &first else {
        panic!("expected database mode");
    };
    assert_eq!(data.columns, vec!["id", "name"]);
    assert_eq!(data.results.len(), 2);
    assert_eq!(data.results[1]["name"], serde_json::json!("grace"));
    assert_eq!(data.explanation.as_deref(), Some("list users"));
    assert!(!data.cache_hit);

    // Same question again is served from the cache
    let second = h.service.run(&req).await.unwrap();
    assert!(second.cache_hit());

    // Case and whitespace changes still hit
    let third = h
        .service
        .run(&QueryRequest::database(&conn, "  SHOW ME ALL USERS "))
        .await
        .unwrap();
    assert!(third.cache_hit());
}

#[tokio::test]
async fn test_clearing_cache_forces_reexecution() {
    let db_path = setup_db().await;
    let conn = format!("sqlite:{}", db_path);
    let h = harness(
        QueryPlan::Sql {
            query: "SELECT id FROM users".to_string(),
            explanation: None,
        },
        vec![],
    )
    .await;

    let req = QueryRequest::database(&conn, "ids please");
    h.service.run(&req).await.unwrap();
    assert!(h.service.run(&req).await.unwrap().cache_hit());

    h.cache.clear().await;
    assert!(!h.service.run(&req).await.unwrap().cache_hit());
}

#[tokio::test]
async fn test_write_plan_is_rejected_before_execution() {
    let db_path = setup_db().await;
    let conn = format!("sqlite:{}", db_path);
    let h = harness(
        QueryPlan::Sql {
            query: "DELETE FROM users".to_string(),
            explanation: None,
        },
        vec![],
    )
    .await;

    let result = h
        .service
        .run(&QueryRequest::database(&conn, "remove everyone"))
        .await;
    assert!(matches!(result, Err(AppError::Permission { .. })));
}

#[tokio::test]
async fn test_sql_plan_without_connection_is_invalid() {
    let h = harness(
        QueryPlan::Sql {
            query: "SELECT 1".to_string(),
            explanation: None,
        },
        vec![],
    )
    .await;

    let result = h.service.run(&QueryRequest::document("count things")).await;
    assert!(matches!(result, Err(AppError::InvalidInput { .. })));
}

#[tokio::test]
async fn test_empty_query_is_invalid() {
    let h = harness(
        QueryPlan::Document {
            intent: None,
            keywords: vec![],
        },
        vec![],
    )
    .await;

    let result = h.service.run(&QueryRequest::document("   ")).await;
    assert!(matches!(result, Err(AppError::InvalidInput { .. })));
}

#[tokio::test]
async fn test_document_search_plan_returns_snippets() {
    let h = harness(
        QueryPlan::Document {
            intent: Some(DocumentIntent::Search),
            keywords: vec!["revenue".to_string()],
        },
        vec![
            upload("report.txt", "quarterly revenue grew by ten percent"),
            upload("misc.txt", "unrelated content"),
        ],
    )
    .await;

    let response = h
        .service
        .run(&QueryRequest::document("find revenue mentions"))
        .await
        .unwrap();

    let QueryResponse::Document(data) = &response else {
        panic!("expected document mode");
    };
    assert_eq!(data.intent, DocumentIntent::Search);
    assert_eq!(data.results.len(), 1);
    assert_eq!(data.results[0].filename, "report.txt");
    assert_eq!(data.results[0].keyword.as_deref(), Some("revenue"));
    assert!(data.results[0].snippet.as_ref().unwrap().contains("revenue"));
}

#[tokio::test]
async fn test_document_summarize_plan() {
    let h = harness(
        QueryPlan::Document {
            intent: Some(DocumentIntent::Summarize),
            keywords: vec![],
        },
        vec![upload("report.txt", "a long report body")],
    )
    .await;

    let response = h
        .service
        .run(&QueryRequest::document("summarize the report"))
        .await
        .unwrap();

    let QueryResponse::Document(data) = &response else {
        panic!("expected document mode");
    };
    assert_eq!(data.results.len(), 1);
    assert_eq!(data.results[0].summary.as_deref(), Some("stub summary"));
}

#[tokio::test]
async fn test_document_qa_plan() {
    let h = harness(
        QueryPlan::Document {
            intent: Some(DocumentIntent::Qa),
            keywords: vec![],
        },
        vec![upload("contract.txt", "signed by ada lovelace")],
    )
    .await;

    let response = h
        .service
        .run(&QueryRequest::document("who signed the contract?"))
        .await
        .unwrap();

    let QueryResponse::Document(data) = &response else {
        panic!("expected document mode");
    };
    assert_eq!(
        data.results[0].answer.as_deref(),
        Some("stub answer: who signed the contract?")
    );
}

#[tokio::test]
async fn test_missing_intent_falls_back_to_inference() {
    let h = harness(
        QueryPlan::Document {
            intent: None,
            keywords: vec![],
        },
        vec![upload("report.txt", "body")],
    )
    .await;

    let response = h
        .service
        .run(&QueryRequest::document("please give me a summary"))
        .await
        .unwrap();

    let QueryResponse::Document(data) = &response else {
        panic!("expected document mode");
    };
    assert_eq!(data.intent, DocumentIntent::Summarize);
}

#[tokio::test]
async fn test_unsupported_documents_are_skipped() {
    let h = harness(
        QueryPlan::Document {
            intent: Some(DocumentIntent::Search),
            keywords: vec!["alpha".to_string()],
        },
        vec![
            upload("binary.pdf", "alpha"),
            upload("plain.txt", "alpha beta"),
        ],
    )
    .await;

    let response = h
        .service
        .run(&QueryRequest::document("find alpha"))
        .await
        .unwrap();

    let QueryResponse::Document(data) = &response else {
        panic!("expected document mode");
    };
    assert_eq!(data.results.len(), 1);
    assert_eq!(data.results[0].filename, "plain.txt");
}

#[tokio::test]
async fn test_paged_query_appends_paging() {
    let db_path = setup_db().await;
    let h = harness(
        QueryPlan::Document {
            intent: None,
            keywords: vec![],
        },
        vec![],
    )
    .await;

    let response = h
        .service
        .paged(&askdata::models::PagedQueryRequest {
            connection_string: format!("sqlite:{}", db_path),
            sql: "SELECT id FROM users ORDER BY id".to_string(),
            limit: 1,
            offset: 1,
        })
        .await
        .unwrap();

    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0]["id"], serde_json::json!(2));
    assert!(response.sql.contains("LIMIT 1 OFFSET 1"));
}

#[tokio::test]
async fn test_paged_query_rejects_writes() {
    let db_path = setup_db().await;
    let h = harness(
        QueryPlan::Document {
            intent: None,
            keywords: vec![],
        },
        vec![],
    )
    .await;

    let result = h
        .service
        .paged(&askdata::models::PagedQueryRequest {
            connection_string: format!("sqlite:{}", db_path),
            sql: "DELETE FROM users".to_string(),
            limit: 10,
            offset: 0,
        })
        .await;
    assert!(matches!(result, Err(AppError::Permission { .. })));
}
