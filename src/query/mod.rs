//! Query orchestration.
//!
//! This module ties the pieces of the query endpoint together: cache lookup,
//! schema summarization, interpretation, SQL execution, and the document
//! operations. One request flows through `QueryService::run`.

pub mod sql_guard;

use crate::cache::{QueryCache, cache_key};
use crate::db::{EngineCache, QueryExecutor, SchemaInspector};
use crate::docs::DocumentStore;
use crate::docs::extract::snippet_around;
use crate::error::{AppError, AppResult};
use crate::llm::{ANSWER_WINDOW, QueryPlan, QueryPlanner, SUMMARY_WINDOW, clip};
use crate::models::{
    DatabaseQueryData, DatabaseType, DocumentIntent, DocumentMatch, DocumentQueryData,
    DocumentSearchResponse, PagedQueryRequest, PagedQueryResponse, QueryRequest, QueryResponse,
};
use std::sync::Arc;
use tracing::{info, warn};

pub struct QueryService {
    engines: Arc<EngineCache>,
    executor: QueryExecutor,
    cache: Arc<QueryCache>,
    documents: Arc<DocumentStore>,
    planner: Arc<dyn QueryPlanner>,
    allow_writes: bool,
}

impl QueryService {
    pub fn new(
        engines: Arc<EngineCache>,
        executor: QueryExecutor,
        cache: Arc<QueryCache>,
        documents: Arc<DocumentStore>,
        planner: Arc<dyn QueryPlanner>,
        allow_writes: bool,
    ) -> Self {
        Self {
            engines,
            executor,
            cache,
            documents,
            planner,
            allow_writes,
        }
    }

    /// Run one query request end to end.
    pub async fn run(&self, req: &QueryRequest) -> AppResult<QueryResponse> {
        let query = req.query.trim();
        if query.is_empty() {
            return Err(AppError::invalid_input("Query text is required"));
        }
        let connection = req
            .connection_string
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let key = cache_key(connection, query);
        if let Some(hit) = self.cache.get(&key).await {
            info!("Serving query from cache");
            return Ok(hit);
        }

        // Schema context only exists when a database is in play
        let schema = match connection {
            Some(conn) => {
                let pool = self.engines.acquire(conn).await?;
                let tables = SchemaInspector::snapshot(&pool).await?;
                SchemaInspector::summarize(&tables)
            }
            None => serde_json::json!({}),
        };

        let plan = self.planner.plan(query, &schema).await?;
        let response = match plan {
            QueryPlan::Sql { query: sql, explanation } => {
                self.run_sql(connection, sql, explanation).await?
            }
            QueryPlan::Document { intent, keywords } => {
                self.run_documents(query, intent, keywords).await?
            }
        };

        self.cache.put(key, response.clone()).await;
        Ok(response)
    }

    async fn run_sql(
        &self,
        connection: Option<&str>,
        sql: String,
        explanation: Option<String>,
    ) -> AppResult<QueryResponse> {
        let connection = connection.ok_or_else(|| {
            AppError::invalid_input(
                "The query was interpreted as SQL but no connection string was provided",
            )
        })?;

        if !self.allow_writes {
            let db_type = DatabaseType::from_connection_string(connection)
                .unwrap_or(DatabaseType::PostgreSQL);
            sql_guard::validate_readonly(&sql, db_type)?;
        }

        let pool = self.engines.acquire(connection).await?;
        let outcome = self.executor.fetch(&pool, &sql).await?;
        info!(
            rows = outcome.rows.len(),
            truncated = outcome.truncated,
            execution_time_ms = outcome.execution_time_ms,
            "Executed planned SQL"
        );

        Ok(QueryResponse::Database(DatabaseQueryData {
            sql,
            columns: outcome.columns,
            results: outcome.rows,
            explanation,
            cache_hit: false,
        }))
    }

    async fn run_documents(
        &self,
        query: &str,
        intent: Option<DocumentIntent>,
        keywords: Vec<String>,
    ) -> AppResult<QueryResponse> {
        let intent = intent.unwrap_or_else(|| DocumentIntent::infer(query));
        let mut results = Vec::new();

        for filename in self.documents.batch().await {
            let text = match self.documents.read_text(&filename).await {
                Ok(Some(text)) if !text.trim().is_empty() => text,
                Ok(_) => continue,
                Err(e) => {
                    warn!(filename = %filename, error = %e, "Skipping unreadable document");
                    results.push(DocumentMatch::failure(&filename, e.to_string()));
                    continue;
                }
            };

            match intent {
                DocumentIntent::Summarize => {
                    match self.planner.summarize(clip(&text, SUMMARY_WINDOW)).await {
                        Ok(summary) => results.push(DocumentMatch::summary(&filename, summary)),
                        Err(e) => results.push(DocumentMatch::failure(
                            &filename,
                            format!("Summarization failed: {}", e),
                        )),
                    }
                }
                DocumentIntent::Search => {
                    for keyword in &keywords {
                        if let Some(snippet) = snippet_around(&text, keyword) {
                            results.push(DocumentMatch::search_hit(&filename, keyword, snippet));
                        }
                    }
                }
                DocumentIntent::Qa => {
                    match self
                        .planner
                        .answer(query, clip(&text, ANSWER_WINDOW))
                        .await
                    {
                        Ok(answer) => results.push(DocumentMatch::answer(&filename, answer)),
                        Err(e) => results.push(DocumentMatch::failure(
                            &filename,
                            format!("Answer failed: {}", e),
                        )),
                    }
                }
            }
        }

        Ok(QueryResponse::Document(DocumentQueryData {
            query: query.to_string(),
            intent,
            results,
            cache_hit: false,
        }))
    }

    /// Interpreter-free keyword search over every stored document.
    pub async fn search_documents(&self, query: &str) -> AppResult<DocumentSearchResponse> {
        let matches = self.documents.search(query).await?;
        Ok(DocumentSearchResponse {
            query: query.to_string(),
            matches,
        })
    }

    /// Run caller-supplied read-only SQL with limit/offset paging.
    pub async fn paged(&self, req: &PagedQueryRequest) -> AppResult<PagedQueryResponse> {
        let sql = req.sql.trim();
        if sql.is_empty() {
            return Err(AppError::invalid_input("SQL text is required"));
        }

        if !self.allow_writes {
            let db_type = DatabaseType::from_connection_string(&req.connection_string)
                .unwrap_or(DatabaseType::PostgreSQL);
            sql_guard::validate_readonly(sql, db_type)?;
        }

        let paged_sql = format!("{} LIMIT {} OFFSET {}", sql, req.limit, req.offset);
        let pool = self.engines.acquire(&req.connection_string).await?;
        let outcome = self
            .executor
            .fetch_with_limit(&pool, &paged_sql, req.limit.max(1))
            .await?;

        Ok(PagedQueryResponse {
            sql: paged_sql,
            limit: req.limit,
            offset: req.offset,
            results: outcome.rows,
        })
    }
}
