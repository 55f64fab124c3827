//! Text extraction from stored documents.
//!
//! Extraction is a per-extension dispatcher. The plain-text family is
//! handled natively; adding a format means adding an arm here.

/// Characters shown on each side of a search match.
pub const SNIPPET_RADIUS: usize = 50;

/// Characters of a preview before truncation.
pub const PREVIEW_LIMIT: usize = 300;

/// Extensions the extractor understands.
const TEXT_EXTENSIONS: &[&str] = &["txt", "csv", "md", "markdown", "log"];

/// Whether a file name has an extractable format.
pub fn is_supported(filename: &str) -> bool {
    extension(filename)
        .map(|ext| TEXT_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

fn extension(filename: &str) -> Option<String> {
    std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Extract text content from a stored file. Invalid UTF-8 sequences are
/// replaced rather than failing the whole document.
pub fn extract_text(_filename: &str, bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Short preview of extracted text, truncated with an ellipsis.
pub fn preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_LIMIT {
        let cut: String = text.chars().take(PREVIEW_LIMIT).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

/// Case-insensitive search for `needle`, returning the text around the
/// first match with newlines flattened. `None` when the needle is absent.
pub fn snippet_around(text: &str, needle: &str) -> Option<String> {
    if needle.is_empty() {
        return None;
    }
    let hay = text.to_lowercase();
    let pos = hay.find(&needle.to_lowercase())?;
    // Lowercasing can shift byte offsets for some scripts; clamp onto char
    // boundaries of the original text instead of assuming they line up.
    let pos = pos.min(text.len());
    let start = floor_char_boundary(text, pos.saturating_sub(SNIPPET_RADIUS));
    let end = floor_char_boundary(text, (pos + SNIPPET_RADIUS).min(text.len()));
    Some(text[start..end].replace(['\n', '\r'], " "))
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}
