//! Blog post file format and per-document metadata.
//!
//! ```text
//! Title: <string>
//! Author: <string>
//! Date: <string>
//! Category: <string>
//! URL: <string>
//! ==========
//! <body text>
//! ```
//!
//! Header lines are matched by prefix in any order. The first line starting
//! with `=` ends the header; everything after it is body. Without a delimiter
//! the whole file is body.

use serde::{Deserialize, Serialize};

/// Appended to a preview when the body was truncated.
pub const PREVIEW_ELLIPSIS: &str = "...";

const TITLE_PREFIX: &str = "Title: ";
const AUTHOR_PREFIX: &str = "Author: ";
const DATE_PREFIX: &str = "Date: ";
const CATEGORY_PREFIX: &str = "Category: ";
const URL_PREFIX: &str = "URL: ";
const DELIMITER_PREFIX: char = '=';

/// Metadata captured once at ingestion. Absent header fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: String,
    pub author: String,
    /// Informational only; never searched.
    pub date: String,
    pub category: String,
    pub source_url: String,
    pub content_preview: String,
}

/// Metadata with display defaults filled in, as shown to end users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayMetadata {
    pub title: String,
    pub author: String,
    pub category: String,
    pub url: String,
    pub content_preview: String,
}

impl DocumentMetadata {
    pub fn display(&self) -> DisplayMetadata {
        DisplayMetadata {
            title: or_default(&self.title, "Untitled"),
            author: or_default(&self.author, "Unknown"),
            category: or_default(&self.category, "General"),
            url: self.source_url.clone(),
            content_preview: or_default(&self.content_preview, "No preview available"),
        }
    }
}

fn or_default(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

/// A parsed document: metadata plus the full body used for embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    pub metadata: DocumentMetadata,
    pub body: String,
}

impl ParsedDocument {
    /// Text fed to the tokenizer: title followed by the full body.
    pub fn embedding_text(&self) -> String {
        format!("{} {}", self.metadata.title, self.body)
    }
}

/// Parse raw file contents into metadata and body.
pub fn parse_document(content: &str, preview_chars: usize) -> ParsedDocument {
    let lines: Vec<&str> = content.split('\n').collect();
    let mut metadata = DocumentMetadata::default();
    let mut body_start = 0;

    for (i, line) in lines.iter().enumerate() {
        if let Some(value) = line.strip_prefix(TITLE_PREFIX) {
            metadata.title = value.trim().to_string();
        } else if let Some(value) = line.strip_prefix(AUTHOR_PREFIX) {
            metadata.author = value.trim().to_string();
        } else if let Some(value) = line.strip_prefix(DATE_PREFIX) {
            metadata.date = value.trim().to_string();
        } else if let Some(value) = line.strip_prefix(CATEGORY_PREFIX) {
            metadata.category = value.trim().to_string();
        } else if let Some(value) = line.strip_prefix(URL_PREFIX) {
            metadata.source_url = value.trim().to_string();
        } else if line.starts_with(DELIMITER_PREFIX) {
            body_start = i + 1;
            break;
        }
    }

    let body = lines[body_start..].join("\n");
    metadata.content_preview = preview(&body, preview_chars);
    ParsedDocument { metadata, body }
}

/// First `max_chars` characters of `body`, with [`PREVIEW_ELLIPSIS`] when truncated.
pub fn preview(body: &str, max_chars: usize) -> String {
    match body.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{PREVIEW_ELLIPSIS}", &body[..cut]),
        None => body.to_string(),
    }
}
