//! Rendering contract tests.
//!
//! These pin down the HTML the console produces for each response shape,
//! including the behavior for responses deserialized from raw server JSON
//! (absent optional fields and all).

use askdata::console::render;
use askdata::models::{ColumnInfo, ForeignKeyRef, QueryResponse, TableSchema};

/// A schema with N tables renders exactly N cards, each listing all of its
/// columns.
#[test]
fn test_schema_renders_one_card_per_table() {
    let tables = vec![
        TableSchema::new("users")
            .with_column(ColumnInfo::new("id", "INTEGER", false))
            .with_column(ColumnInfo::new("name", "TEXT", true)),
        TableSchema::new("orders").with_column(ColumnInfo::new("id", "INTEGER", false)),
        TableSchema::new("audit_log"),
    ];

    let html = render::schema(&tables);
    assert_eq!(html.matches("table-card").count(), 3);
    assert!(html.contains("<h3>users</h3>"));
    assert!(html.contains("<b>id</b> → <span>INTEGER</span>"));
    assert!(html.contains("<b>name</b> → <span>TEXT</span>"));
}

/// Foreign keys are formatted as `col → ref_table.ref_col`.
#[test]
fn test_schema_renders_foreign_keys() {
    let mut composite = ForeignKeyRef::single("order_id", "order_items", "order_id");
    composite.push_pair("line_no", "line_no");

    let tables = vec![
        TableSchema::new("orders")
            .with_column(ColumnInfo::new("user_id", "INTEGER", true))
            .with_foreign_key(ForeignKeyRef::single("user_id", "users", "id"))
            .with_foreign_key(composite),
    ];

    let html = render::schema(&tables);
    assert!(html.contains("<p>user_id → users.id</p>"));
    assert!(html.contains("<p>order_id, line_no → order_items.order_id, line_no</p>"));
}

/// A schema without foreign keys renders no foreign-key block.
#[test]
fn test_schema_without_fks_has_no_foreign_block() {
    let tables = vec![TableSchema::new("plain").with_column(ColumnInfo::new("id", "INTEGER", false))];
    let html = render::schema(&tables);
    assert!(!html.contains("foreign"));
}

/// Zero tables render exactly the no-tables message.
#[test]
fn test_empty_schema_message() {
    assert_eq!(render::schema(&[]), "<p>No tables found.</p>");
}

/// A database response renders a table whose header matches the column
/// order and whose cells carry the row values.
#[test]
fn test_database_results_table() {
    let response: QueryResponse = serde_json::from_str(
        r#"{
            "mode": "database",
            "sql": "SELECT a, b FROM t",
            "columns": ["a", "b"],
            "results": [{"a": 1, "b": 2}]
        }"#,
    )
    .unwrap();

    let rendered = render::results(&response);
    assert!(rendered.body.contains("<th>a</th><th>b</th>"));
    assert!(rendered.body.contains("<td>1</td><td>2</td>"));
    assert_eq!(rendered.body.matches("<tr>").count(), 2);
}

/// The cache indicator defaults to false when the field is absent.
#[test]
fn test_cache_indicator_defaults_to_false() {
    let response: QueryResponse = serde_json::from_str(
        r#"{
            "mode": "database",
            "sql": "SELECT 1",
            "columns": [],
            "results": []
        }"#,
    )
    .unwrap();

    let rendered = render::results(&response);
    assert_eq!(rendered.metrics, "Cache Hit: false");
}

/// The cache indicator reflects the flag when present.
#[test]
fn test_cache_indicator_reflects_flag() {
    let response: QueryResponse = serde_json::from_str(
        r#"{
            "mode": "document",
            "query": "q",
            "intent": "search",
            "results": [],
            "cache_hit": true
        }"#,
    )
    .unwrap();

    let rendered = render::results(&response);
    assert_eq!(rendered.metrics, "Cache Hit: true");
}

/// A database response with no rows renders an empty panel.
#[test]
fn test_database_results_empty_panel() {
    let response: QueryResponse = serde_json::from_str(
        r#"{
            "mode": "database",
            "sql": "SELECT 1 WHERE 1 = 0",
            "columns": ["x"],
            "results": []
        }"#,
    )
    .unwrap();

    let rendered = render::results(&response);
    assert!(rendered.body.is_empty());
}

/// A document result with no summary or snippet shows the no-content text.
#[test]
fn test_document_card_without_content() {
    let response: QueryResponse = serde_json::from_str(
        r#"{
            "mode": "document",
            "query": "q",
            "intent": "qa",
            "results": [{"filename": "empty.txt"}]
        }"#,
    )
    .unwrap();

    let rendered = render::results(&response);
    assert!(rendered.body.contains("<h4>empty.txt</h4>"));
    assert!(rendered.body.contains("No content found."));
}

/// Summary wins over snippet in the fallback chain.
#[test]
fn test_document_card_prefers_summary() {
    let response: QueryResponse = serde_json::from_str(
        r#"{
            "mode": "document",
            "query": "q",
            "intent": "summarize",
            "results": [{"filename": "a.txt", "summary": "the summary", "snippet": "the snippet"}]
        }"#,
    )
    .unwrap();

    let rendered = render::results(&response);
    assert!(rendered.body.contains("the summary"));
    assert!(!rendered.body.contains("the snippet"));
}

/// Rendered values are HTML-escaped.
#[test]
fn test_rendering_escapes_html() {
    let tables = vec![
        TableSchema::new("<script>alert(1)</script>")
            .with_column(ColumnInfo::new("a&b", "TEXT", true)),
    ];
    let html = render::schema(&tables);
    assert!(!html.contains("<script>"));
    assert!(html.contains("&lt;script&gt;"));
    assert!(html.contains("a&amp;b"));
}
