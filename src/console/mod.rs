//! Console adapter over the HTTP API.
//!
//! The console is the native counterpart of the service's browser panel: one
//! operation per user action, each issuing a single HTTP call and rendering
//! the typed response into an HTML fragment. Operations are stateless with
//! respect to prior calls, and every call reports success or failure
//! explicitly - nothing is left as a dangling rejection.

pub mod render;

use crate::docs::UploadedFile;
use crate::error::{AppError, AppResult};
use crate::models::{
    DocumentIngestResponse, QueryRequest, QueryResponse, SchemaResponse,
};
use render::RenderedResults;
use serde::de::DeserializeOwned;

/// Typed client for the askdata HTTP API.
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Create a client for a server base URL (e.g. `http://127.0.0.1:8080`).
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Upload a document batch as multipart `files` parts.
    pub async fn upload_documents(
        &self,
        files: Vec<UploadedFile>,
    ) -> AppResult<DocumentIngestResponse> {
        let mut form = reqwest::multipart::Form::new();
        for file in files {
            let part = reqwest::multipart::Part::bytes(file.bytes).file_name(file.filename);
            form = form.part("files", part);
        }

        let response = self
            .http
            .post(self.url("/api/ingest/documents"))
            .multipart(form)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Connect a database and fetch its schema snapshot.
    pub async fn ingest_database(&self, connection_string: &str) -> AppResult<SchemaResponse> {
        let response = self
            .http
            .post(self.url("/api/ingest/database"))
            .json(&serde_json::json!({ "connection_string": connection_string }))
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Run a query, with or without a database connection.
    pub async fn query(
        &self,
        connection_string: Option<&str>,
        query: &str,
    ) -> AppResult<QueryResponse> {
        let body = QueryRequest {
            connection_string: connection_string.map(String::from),
            query: query.to_string(),
        };
        let response = self
            .http
            .post(self.url("/api/query"))
            .json(&body)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Drop the server's cached query responses.
    pub async fn clear_cache(&self) -> AppResult<()> {
        let response = self.http.get(self.url("/clear-cache")).send().await?;
        let _: serde_json::Value = Self::decode(response).await?;
        Ok(())
    }

    /// Decode a response body, turning non-2xx replies into an error that
    /// prefers the server-supplied `error` field.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> AppResult<T> {
        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(|e| AppError::Transport {
                message: format!("Invalid response body: {}", e),
            });
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
            .unwrap_or_else(|| {
                if body.is_empty() {
                    status.to_string()
                } else {
                    body
                }
            });

        Err(AppError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// User-facing message for a failed call: the server's own error text when
/// it sent one, the transport error otherwise.
fn user_message(err: &AppError) -> String {
    match err {
        AppError::Api { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

/// Output of a console operation.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleOutput {
    /// An HTML fragment for the output panel.
    Panel(String),
    /// A short plain-text notice.
    Notice(String),
}

/// The console: one method per user-facing operation.
pub struct Console {
    client: ApiClient,
}

impl Console {
    /// Create a console against a server base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: ApiClient::new(base_url),
        }
    }

    /// Create a console over an existing client.
    pub fn with_client(client: ApiClient) -> Self {
        Self { client }
    }

    /// Upload a batch of documents and report the outcome.
    pub async fn upload(&self, files: Vec<UploadedFile>) -> ConsoleOutput {
        match self.client.upload_documents(files).await {
            Ok(resp) => ConsoleOutput::Notice(resp.message),
            Err(e) => ConsoleOutput::Notice(format!("Upload failed: {}", user_message(&e))),
        }
    }

    /// Test a database connection and render its schema.
    ///
    /// An empty connection string short-circuits without any network call.
    pub async fn test_connection(&self, connection_string: &str) -> ConsoleOutput {
        let conn = connection_string.trim();
        if conn.is_empty() {
            return ConsoleOutput::Notice("Please enter a connection string.".to_string());
        }

        match self.client.ingest_database(conn).await {
            Ok(resp) => ConsoleOutput::Panel(render::schema(&resp.tables)),
            Err(e) => ConsoleOutput::Panel(render::error_paragraph(&user_message(&e))),
        }
    }

    /// Run a query against the connected database.
    pub async fn run_database_query(
        &self,
        connection_string: &str,
        query: &str,
    ) -> RenderedResults {
        self.run_query(Some(connection_string), query).await
    }

    /// Run a query against the uploaded documents only.
    pub async fn run_document_query(&self, query: &str) -> RenderedResults {
        self.run_query(None, query).await
    }

    async fn run_query(&self, connection_string: Option<&str>, query: &str) -> RenderedResults {
        match self.client.query(connection_string, query).await {
            Ok(resp) => render::results(&resp),
            Err(e) => RenderedResults::error(&user_message(&e)),
        }
    }

    /// Clear the server-side response cache, reporting both outcomes.
    pub async fn clear_cache(&self) -> ConsoleOutput {
        match self.client.clear_cache().await {
            Ok(()) => ConsoleOutput::Notice("Cache cleared.".to_string()),
            Err(e) => ConsoleOutput::Notice(format!("Cache clear failed: {}", user_message(&e))),
        }
    }
}
