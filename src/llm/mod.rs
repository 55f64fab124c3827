//! Query interpretation.
//!
//! The query endpoint does not parse natural language itself; it asks an
//! interpreter to turn the question plus a schema summary into a plan: either
//! a SQL statement or a document operation. The interpreter is a trait so the
//! orchestration layer can be exercised without a live model.

pub mod client;

pub use client::LlmClient;

use crate::error::AppResult;
use crate::models::DocumentIntent;
use async_trait::async_trait;

/// Characters of document text sent along with a summarize request.
pub const SUMMARY_WINDOW: usize = 3000;

/// Characters of document text sent along with an answer request.
pub const ANSWER_WINDOW: usize = 8000;

/// What the interpreter decided to do with a query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryPlan {
    /// Run a SQL statement against the connected database.
    Sql {
        query: String,
        explanation: Option<String>,
    },
    /// Operate on the uploaded documents. The intent may be absent when the
    /// model does not commit to one; callers fall back to inference.
    Document {
        intent: Option<DocumentIntent>,
        keywords: Vec<String>,
    },
}

/// Interpreter turning questions into plans and producing document-level
/// summaries and answers.
#[async_trait]
pub trait QueryPlanner: Send + Sync {
    /// Decide what a query is asking for, given a `{table: [columns]}`
    /// schema summary.
    async fn plan(&self, query: &str, schema: &serde_json::Value) -> AppResult<QueryPlan>;

    /// Summarize a document excerpt.
    async fn summarize(&self, text: &str) -> AppResult<String>;

    /// Answer a question from a document excerpt.
    async fn answer(&self, question: &str, text: &str) -> AppResult<String>;
}

/// Planner used when no interpreter API key is configured. Every call fails
/// with the same actionable message; the rest of the service (uploads,
/// schema ingestion, keyword search) keeps working.
pub struct UnconfiguredPlanner;

impl UnconfiguredPlanner {
    fn unavailable<T>() -> AppResult<T> {
        Err(crate::error::AppError::invalid_input(
            "No interpreter API key configured. Set ASKDATA_LLM_API_KEY to enable natural language queries.",
        ))
    }
}

#[async_trait]
impl QueryPlanner for UnconfiguredPlanner {
    async fn plan(&self, _query: &str, _schema: &serde_json::Value) -> AppResult<QueryPlan> {
        Self::unavailable()
    }

    async fn summarize(&self, _text: &str) -> AppResult<String> {
        Self::unavailable()
    }

    async fn answer(&self, _question: &str, _text: &str) -> AppResult<String> {
        Self::unavailable()
    }
}

/// Char-boundary-safe prefix of `text`, at most `limit` characters.
pub fn clip(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Unwrap a reply that arrived inside markdown code fences.
///
/// Models regularly ignore "JSON only" instructions and wrap the payload in
/// ```` ```json ```` blocks; the payload is the segment between the fences.
pub fn strip_code_fences(reply: &str) -> String {
    let trimmed = reply.trim();
    if !trimmed.contains("```") {
        return trimmed.to_string();
    }
    let mut segments = trimmed.split("```");
    // Text before the first fence, then the fenced payload
    let _ = segments.next();
    match segments.next() {
        Some(inner) => inner
            .trim_start()
            .strip_prefix("json")
            .unwrap_or(inner)
            .trim()
            .to_string(),
        None => trimmed.to_string(),
    }
}
