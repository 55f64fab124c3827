//! HTML rendering of typed API responses.
//!
//! Produces the fragments the console shows for schema snapshots and query
//! results. Every interpolated value is escaped; the structures here are the
//! contract the rendering tests pin down.

use crate::models::{DocumentMatch, QueryResponse, TableSchema};
use serde_json::Value as JsonValue;

/// A rendered query result: the result panel plus the cache indicator line.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedResults {
    /// HTML fragment for the results panel.
    pub body: String,
    /// Plain-text cache indicator, e.g. `Cache Hit: false`.
    pub metrics: String,
}

impl RenderedResults {
    /// Rendering of a failed query: an error paragraph and a cold cache
    /// indicator.
    pub fn error(message: &str) -> Self {
        Self {
            body: error_paragraph(message),
            metrics: cache_indicator(false),
        }
    }
}

/// Escape text for safe interpolation into HTML.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// The cache indicator line.
pub fn cache_indicator(cache_hit: bool) -> String {
    format!("Cache Hit: {}", cache_hit)
}

/// An inline error paragraph.
pub fn error_paragraph(message: &str) -> String {
    format!(r#"<p class="error">{}</p>"#, escape(message))
}

/// Render a schema snapshot as one card per table.
pub fn schema(tables: &[TableSchema]) -> String {
    if tables.is_empty() {
        return "<p>No tables found.</p>".to_string();
    }

    let mut html = String::new();
    for table in tables {
        html.push_str(&format!(
            r#"<div class="table-card"><h3>{}</h3><ul>"#,
            escape(&table.name)
        ));
        for col in &table.columns {
            html.push_str(&format!(
                "<li><b>{}</b> → <span>{}</span></li>",
                escape(&col.name),
                escape(&col.data_type)
            ));
        }
        html.push_str("</ul>");

        if !table.foreign_keys.is_empty() {
            html.push_str(r#"<div class="foreign"><h4>Foreign Keys</h4>"#);
            for fk in &table.foreign_keys {
                html.push_str(&format!(
                    "<p>{} → {}.{}</p>",
                    escape(&fk.column.join(", ")),
                    escape(&fk.ref_table),
                    escape(&fk.ref_column.join(", "))
                ));
            }
            html.push_str("</div>");
        }

        html.push_str("</div>");
    }
    html
}

/// Render a query response: a table for database mode, cards for document
/// mode, always paired with the cache indicator.
pub fn results(response: &QueryResponse) -> RenderedResults {
    let metrics = cache_indicator(response.cache_hit());
    let body = match response {
        QueryResponse::Database(data) => {
            if data.results.is_empty() {
                String::new()
            } else {
                let headers: Vec<String> = if data.columns.is_empty() {
                    data.results[0].keys().cloned().collect()
                } else {
                    data.columns.clone()
                };
                result_table(&headers, &data.results)
            }
        }
        QueryResponse::Document(data) => {
            let mut html = String::new();
            for result in &data.results {
                html.push_str(&doc_card(result));
            }
            html
        }
    };
    RenderedResults { body, metrics }
}

fn result_table(headers: &[String], rows: &[serde_json::Map<String, JsonValue>]) -> String {
    let mut html = String::from("<table><tr>");
    for header in headers {
        html.push_str(&format!("<th>{}</th>", escape(header)));
    }
    html.push_str("</tr>");

    for row in rows {
        html.push_str("<tr>");
        for header in headers {
            let cell = row.get(header).map(cell_text).unwrap_or_default();
            html.push_str(&format!("<td>{}</td>", escape(&cell)));
        }
        html.push_str("</tr>");
    }
    html.push_str("</table>");
    html
}

fn cell_text(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn doc_card(result: &DocumentMatch) -> String {
    let content = result
        .summary
        .as_deref()
        .or(result.snippet.as_deref())
        .or(result.answer.as_deref())
        .or(result.error.as_deref())
        .unwrap_or("No content found.");
    format!(
        r#"<div class="doc-card"><h4>{}</h4><p>{}</p></div>"#,
        escape(&result.filename),
        escape(content)
    )
}
