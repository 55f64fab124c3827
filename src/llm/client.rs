//! HTTP interpreter client.
//!
//! Talks to an OpenAI-compatible chat completions endpoint. The service was
//! written against Groq's hosted API but any compatible base URL works.

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::llm::{ANSWER_WINDOW, QueryPlan, QueryPlanner, SUMMARY_WINDOW, clip, strip_code_fences};
use crate::models::DocumentIntent;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

pub struct LlmClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl LlmClient {
    /// Create a client for the given endpoint.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    /// Build a client from the server configuration. Fails when no API key
    /// is configured; the interpreter cannot run without one.
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let api_key = config.llm_api_key.clone().ok_or_else(|| {
            AppError::invalid_input(
                "No interpreter API key configured. Set ASKDATA_LLM_API_KEY to enable natural language queries.",
            )
        })?;
        Ok(Self::new(
            config.llm_base_url.clone(),
            config.llm_model.clone(),
            api_key,
        ))
    }

    /// Send a single-turn prompt and return the reply text.
    async fn chat(&self, prompt: &str) -> AppResult<String> {
        let url = format!(
            "{}/chat/completions",
            self.base_url.trim_end_matches('/')
        );
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(status = %status, "Interpreter request failed");
            return Err(AppError::Api {
                status: status.as_u16(),
                message: format!("Interpreter request failed: {}", detail),
            });
        }

        let reply: ChatCompletionReply = response.json().await?;
        let content = reply
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();
        Ok(content.trim().to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionReply {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// The JSON shape the plan prompt asks the model to produce.
#[derive(Debug, Deserialize)]
struct PlannerReply {
    #[serde(rename = "type")]
    kind: String,
    query: Option<String>,
    explanation: Option<String>,
    intent: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
}

fn plan_prompt(query: &str, schema: &serde_json::Value) -> String {
    format!(
        r#"You are a query assistant that routes questions to either a SQL database or a set of uploaded documents.

For database questions:
- Generate a valid SQL query using only tables and columns present in the schema below.
- Keep the clause order SELECT, FROM, JOIN, WHERE, GROUP BY, ORDER BY, LIMIT.
- Reply with strict JSON: {{"type": "sql", "query": "SELECT ...", "explanation": "..."}}

For document questions:
- Decide the intent: "summarize", "search", or "qa".
- For searches, list the keywords to look for.
- Reply with strict JSON: {{"type": "document", "intent": "...", "keywords": ["..."]}}

Database schema:
{schema}

Question:
{query}

Reply with JSON only - no markdown fences and no text outside the JSON object."#
    )
}

#[async_trait]
impl QueryPlanner for LlmClient {
    async fn plan(&self, query: &str, schema: &serde_json::Value) -> AppResult<QueryPlan> {
        let reply = self.chat(&plan_prompt(query, schema)).await?;
        let cleaned = strip_code_fences(&reply);
        debug!(reply_len = cleaned.len(), "Interpreter reply received");

        let parsed: PlannerReply = serde_json::from_str(&cleaned).map_err(|e| {
            AppError::interpreter(format!("Interpreter returned unparseable JSON: {}", e))
        })?;

        match parsed.kind.as_str() {
            "sql" => {
                let sql = parsed
                    .query
                    .filter(|q| !q.trim().is_empty())
                    .ok_or_else(|| {
                        AppError::interpreter("Interpreter returned a sql plan without a query")
                    })?;
                Ok(QueryPlan::Sql {
                    query: sql,
                    explanation: parsed.explanation.filter(|e| !e.is_empty()),
                })
            }
            "document" => Ok(QueryPlan::Document {
                intent: parsed.intent.as_deref().and_then(DocumentIntent::parse),
                keywords: parsed.keywords,
            }),
            other => Err(AppError::interpreter(format!(
                "Interpreter could not determine the query type (got {:?})",
                other
            ))),
        }
    }

    async fn summarize(&self, text: &str) -> AppResult<String> {
        let prompt = format!(
            "Summarize this document briefly:\n{}",
            clip(text, SUMMARY_WINDOW)
        );
        self.chat(&prompt).await
    }

    async fn answer(&self, question: &str, text: &str) -> AppResult<String> {
        let prompt = format!(
            "Answer the question '{}' using the content below:\n{}",
            question,
            clip(text, ANSWER_WINDOW)
        );
        self.chat(&prompt).await
    }
}
