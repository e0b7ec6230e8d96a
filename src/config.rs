//! Runtime configuration for the search engine.
//!
//! Defaults match the layout produced by the blog scraper (`blogs/*.txt`) and
//! a word2vec model exported to text format. Every field can be overridden
//! through `BLOG_SEARCH_*` environment variables (a `.env` file is honored),
//! and the CLI layers its flags on top of that.

use std::path::PathBuf;

use crate::search::tokenizer::TokenizerConfig;

/// Default number of results returned per query.
pub const DEFAULT_TOP_K: usize = 5;

/// Default number of body characters kept as a document preview.
pub const DEFAULT_PREVIEW_CHARS: usize = 300;

/// Configuration for building and querying a [`crate::search::engine::SearchEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Path to the word embedding table.
    pub model_path: PathBuf,
    /// Directory scanned (non-recursively) for documents.
    pub docs_dir: PathBuf,
    /// File extension identifying documents, without the leading dot.
    pub extension: String,
    /// Results returned when the caller does not ask for a specific count.
    pub top_k: usize,
    /// Token length bounds.
    pub tokenizer: TokenizerConfig,
    /// Characters of body text kept in `content_preview`.
    pub preview_chars: usize,
    /// Vocabulary entries returned by diagnostics.
    pub vocab_sample: usize,
    /// Document identifiers returned by diagnostics.
    pub doc_sample: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("model/word2vec.txt"),
            docs_dir: PathBuf::from("blogs"),
            extension: "txt".to_string(),
            top_k: DEFAULT_TOP_K,
            tokenizer: TokenizerConfig::default(),
            preview_chars: DEFAULT_PREVIEW_CHARS,
            vocab_sample: 20,
            doc_sample: 10,
        }
    }
}

impl SearchConfig {
    /// Load config from environment variables.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(path) = dotenvy::var("BLOG_SEARCH_MODEL") {
            cfg.model_path = PathBuf::from(path);
        }

        if let Ok(path) = dotenvy::var("BLOG_SEARCH_DOCS") {
            cfg.docs_dir = PathBuf::from(path);
        }

        if let Ok(ext) = dotenvy::var("BLOG_SEARCH_EXTENSION") {
            let ext = ext.trim().trim_start_matches('.');
            if !ext.is_empty() {
                cfg.extension = ext.to_string();
            }
        }

        if let Ok(val) = dotenvy::var("BLOG_SEARCH_TOP_K")
            && let Ok(k) = val.parse()
        {
            cfg.top_k = k;
        }

        if let Ok(val) = dotenvy::var("BLOG_SEARCH_MIN_TOKEN_LEN")
            && let Ok(n) = val.parse()
        {
            cfg.tokenizer.min_len = n;
        }

        if let Ok(val) = dotenvy::var("BLOG_SEARCH_MAX_TOKEN_LEN")
            && let Ok(n) = val.parse()
        {
            cfg.tokenizer.max_len = n;
        }

        if let Ok(val) = dotenvy::var("BLOG_SEARCH_PREVIEW_CHARS")
            && let Ok(n) = val.parse()
        {
            cfg.preview_chars = n;
        }

        cfg
    }
}
