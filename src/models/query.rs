//! Query-related data models.
//!
//! This module defines the request and response types of the query endpoints.
//! The query response is a discriminated union on the `mode` field so clients
//! can branch on database versus document results without probing fields.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Maximum allowed row limit for a single query.
pub const MAX_ROW_LIMIT: u32 = 10000;

/// Default page size for the paged query endpoint.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Request body of the query endpoint. The connection string is optional:
/// without it only document plans can be executed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,
    pub query: String,
}

impl QueryRequest {
    /// Create a database-backed query request.
    pub fn database(connection_string: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            connection_string: Some(connection_string.into()),
            query: query.into(),
        }
    }

    /// Create a document-only query request.
    pub fn document(query: impl Into<String>) -> Self {
        Self {
            connection_string: None,
            query: query.into(),
        }
    }
}

/// Response of the query endpoint, discriminated on `mode`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum QueryResponse {
    Database(DatabaseQueryData),
    Document(DocumentQueryData),
}

impl QueryResponse {
    /// Whether this response was served from the cache.
    pub fn cache_hit(&self) -> bool {
        match self {
            Self::Database(data) => data.cache_hit,
            Self::Document(data) => data.cache_hit,
        }
    }

    /// Flag this response as a cache replay.
    pub fn mark_cache_hit(&mut self) {
        match self {
            Self::Database(data) => data.cache_hit = true,
            Self::Document(data) => data.cache_hit = true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseQueryData {
    /// The SQL statement that was executed.
    pub sql: String,
    /// Column names in result order.
    pub columns: Vec<String>,
    pub results: Vec<serde_json::Map<String, JsonValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default)]
    pub cache_hit: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentQueryData {
    pub query: String,
    pub intent: DocumentIntent,
    pub results: Vec<DocumentMatch>,
    #[serde(default)]
    pub cache_hit: bool,
}

/// What the interpreter decided a document query is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentIntent {
    Summarize,
    Search,
    Qa,
}

impl DocumentIntent {
    /// Parse an intent label from the interpreter. Keyword extraction is
    /// served by the search path.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "summarize" | "summary" => Some(Self::Summarize),
            "search" | "keyword" => Some(Self::Search),
            "qa" | "answer" => Some(Self::Qa),
            _ => None,
        }
    }

    /// Infer an intent from the query text when the interpreter omits one.
    pub fn infer(query: &str) -> Self {
        let q = query.to_lowercase();
        if ["summarize", "summary"].iter().any(|k| q.contains(k)) {
            Self::Summarize
        } else if ["find", "search", "where", "contains", "show", "look for"]
            .iter()
            .any(|k| q.contains(k))
        {
            Self::Search
        } else {
            Self::Qa
        }
    }
}

impl std::fmt::Display for DocumentIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Summarize => write!(f, "summarize"),
            Self::Search => write!(f, "search"),
            Self::Qa => write!(f, "qa"),
        }
    }
}

/// One document-mode result. Exactly which optional fields are set depends
/// on the intent that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMatch {
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DocumentMatch {
    fn bare(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            summary: None,
            keyword: None,
            snippet: None,
            answer: None,
            error: None,
        }
    }

    /// A summarization result.
    pub fn summary(filename: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            summary: Some(summary.into()),
            ..Self::bare(filename)
        }
    }

    /// A keyword search hit with its surrounding snippet.
    pub fn search_hit(
        filename: impl Into<String>,
        keyword: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            keyword: Some(keyword.into()),
            snippet: Some(snippet.into()),
            ..Self::bare(filename)
        }
    }

    /// A plain snippet match (keyword search without an interpreter).
    pub fn snippet(filename: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            snippet: Some(snippet.into()),
            ..Self::bare(filename)
        }
    }

    /// A question-answering result.
    pub fn answer(filename: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            answer: Some(answer.into()),
            ..Self::bare(filename)
        }
    }

    /// A per-document failure surfaced instead of failing the whole request.
    pub fn failure(filename: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::bare(filename)
        }
    }
}

/// Request body of the interpreter-free document search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSearchRequest {
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSearchResponse {
    pub query: String,
    pub matches: Vec<DocumentMatch>,
}

/// Request body of the paged raw-SQL endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedQueryRequest {
    pub connection_string: String,
    pub sql: String,
    #[serde(default = "default_page_size")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedQueryResponse {
    pub sql: String,
    pub limit: u32,
    pub offset: u32,
    pub results: Vec<serde_json::Map<String, JsonValue>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_response_mode_tag() {
        let resp = QueryResponse::Database(DatabaseQueryData {
            sql: "SELECT 1".to_string(),
            columns: vec!["one".to_string()],
            results: vec![],
            explanation: None,
            cache_hit: false,
        });
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["mode"], "database");

        let resp = QueryResponse::Document(DocumentQueryData {
            query: "q".to_string(),
            intent: DocumentIntent::Search,
            results: vec![],
            cache_hit: false,
        });
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["mode"], "document");
    }

    #[test]
    fn test_mark_cache_hit() {
        let mut resp = QueryResponse::Document(DocumentQueryData {
            query: "q".to_string(),
            intent: DocumentIntent::Qa,
            results: vec![],
            cache_hit: false,
        });
        assert!(!resp.cache_hit());
        resp.mark_cache_hit();
        assert!(resp.cache_hit());
    }

    #[test]
    fn test_intent_parse() {
        assert_eq!(
            DocumentIntent::parse("Summarize"),
            Some(DocumentIntent::Summarize)
        );
        assert_eq!(
            DocumentIntent::parse("keyword"),
            Some(DocumentIntent::Search)
        );
        assert_eq!(DocumentIntent::parse("qa"), Some(DocumentIntent::Qa));
        assert_eq!(DocumentIntent::parse("translate"), None);
    }

    #[test]
    fn test_intent_infer() {
        assert_eq!(
            DocumentIntent::infer("give me a summary of the report"),
            DocumentIntent::Summarize
        );
        assert_eq!(
            DocumentIntent::infer("find mentions of revenue"),
            DocumentIntent::Search
        );
        assert_eq!(
            DocumentIntent::infer("who signed the contract?"),
            DocumentIntent::Qa
        );
    }

    #[test]
    fn test_document_match_serializes_sparse() {
        let m = DocumentMatch::summary("a.txt", "short");
        let json = serde_json::to_string(&m).unwrap();
        assert!(json.contains("summary"));
        assert!(!json.contains("snippet"));
        assert!(!json.contains("error"));
    }

    #[test]
    fn test_paged_request_defaults() {
        let req: PagedQueryRequest = serde_json::from_str(
            r#"{"connection_string": "sqlite:x.db", "sql": "SELECT * FROM t"}"#,
        )
        .unwrap();
        assert_eq!(req.limit, DEFAULT_PAGE_SIZE);
        assert_eq!(req.offset, 0);
    }
}
