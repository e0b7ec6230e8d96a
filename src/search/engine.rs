//! Search façade: tokenize → embed → rank, or fall back to literal matching.
//!
//! ```text
//! query ──trim/lower──┬── empty ───────────────────────────→ fallback (always empty)
//!                     └── tokenize → embed ──┬── zero vector → fallback
//!                                            └── nonzero ────→ cosine ranking
//! ```
//!
//! The engine is built once and never mutated, so one `Arc<SearchEngine>` can
//! serve concurrent queries without locking.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use super::corpus::{BuildReport, CorpusIndex, IngestOptions};
use super::embedder::{DocumentEmbedder, l2_norm};
use super::embedding_table::{EmbeddingProvider, EmbeddingTable};
use super::fallback::fallback_search;
use super::ranker::{SearchHit, rank};
use super::tokenizer::Tokenizer;
use crate::config::SearchConfig;

/// Startup failures that leave the engine unavailable.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("embedding table not found: {0}")]
    EmbeddingTableMissing(PathBuf),

    #[error("document directory not found: {0}")]
    DocumentDirMissing(PathBuf),

    #[error("invalid embedding table {path}: {source}")]
    EmbeddingTableInvalid {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

/// Which branch produced a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPath {
    Semantic,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub path: SearchPath,
    pub hits: Vec<SearchHit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub total_documents: usize,
    pub vocabulary_size: usize,
    pub embedding_dimension: usize,
}

pub struct SearchEngine {
    config: SearchConfig,
    tokenizer: Tokenizer,
    embedder: DocumentEmbedder,
    index: CorpusIndex,
    report: BuildReport,
}

impl std::fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEngine")
            .field("embedder", &self.embedder)
            .field("documents", &self.index.len())
            .field("report", &self.report)
            .finish()
    }
}

impl SearchEngine {
    /// Load the embedding table and index the document directory.
    pub fn open(config: SearchConfig) -> Result<Self, EngineError> {
        if !config.model_path.is_file() {
            return Err(EngineError::EmbeddingTableMissing(config.model_path.clone()));
        }
        if !config.docs_dir.is_dir() {
            return Err(EngineError::DocumentDirMissing(config.docs_dir.clone()));
        }

        info!(model = %config.model_path.display(), "loading word embeddings");
        let table = EmbeddingTable::load(&config.model_path).map_err(|source| {
            EngineError::EmbeddingTableInvalid {
                path: config.model_path.clone(),
                source,
            }
        })?;
        Ok(Self::with_provider(config, Arc::new(table)))
    }

    /// Index `config.docs_dir` with an already loaded provider.
    pub fn with_provider(config: SearchConfig, provider: Arc<dyn EmbeddingProvider>) -> Self {
        let embedder = DocumentEmbedder::new(provider);
        let options = ingest_options(&config);
        let (index, report) = CorpusIndex::build(&config.docs_dir, &embedder, &options);
        Self::from_parts(config, embedder, index, report)
    }

    /// Index in-memory `(identifier, raw contents)` documents.
    pub fn from_documents<I, K, V>(
        config: SearchConfig,
        provider: Arc<dyn EmbeddingProvider>,
        documents: I,
    ) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let embedder = DocumentEmbedder::new(provider);
        let options = ingest_options(&config);
        let (index, report) = CorpusIndex::from_documents(documents, &embedder, &options);
        Self::from_parts(config, embedder, index, report)
    }

    fn from_parts(
        config: SearchConfig,
        embedder: DocumentEmbedder,
        index: CorpusIndex,
        report: BuildReport,
    ) -> Self {
        info!(
            documents = index.len(),
            vocabulary = embedder.provider().vocabulary_size(),
            dimension = embedder.dimension(),
            "search engine ready"
        );
        Self {
            tokenizer: Tokenizer::new(config.tokenizer),
            config,
            embedder,
            index,
            report,
        }
    }

    /// Run a query, choosing between cosine ranking and literal fallback.
    pub fn search(&self, query: &str, top_k: usize) -> Result<SearchOutcome> {
        let query = normalize_query(query);
        if query.is_empty() {
            return Ok(self.fallback(&query, top_k));
        }

        debug!(query = %query, top_k, "search");
        let tokens = self.tokenizer.tokenize(&query);
        let embedding = self.embedder.embed(&tokens);

        if l2_norm(&embedding) == 0.0 {
            debug!(
                query = %query,
                tokens = tokens.len(),
                "no query token in vocabulary; using literal fallback"
            );
            return Ok(self.fallback(&query, top_k));
        }

        let hits = rank(&embedding, &self.index, top_k)?;
        debug!(
            query = %query,
            resolved_tokens = self.embedder.resolved_count(&tokens),
            hits = hits.len(),
            "semantic search complete"
        );
        Ok(SearchOutcome {
            path: SearchPath::Semantic,
            hits,
        })
    }

    /// Literal substring matching, bypassing the embeddings.
    pub fn fallback_search(&self, query: &str, top_k: usize) -> Vec<SearchHit> {
        self.fallback(&normalize_query(query), top_k).hits
    }

    fn fallback(&self, query: &str, top_k: usize) -> SearchOutcome {
        let hits = fallback_search(query, &self.index, &self.tokenizer, top_k);
        debug!(query = %query, hits = hits.len(), "fallback search complete");
        SearchOutcome {
            path: SearchPath::Fallback,
            hits,
        }
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            total_documents: self.index.len(),
            vocabulary_size: self.embedder.provider().vocabulary_size(),
            embedding_dimension: self.embedder.dimension(),
        }
    }

    /// First `n` vocabulary entries in model order.
    pub fn vocabulary_sample(&self, n: usize) -> Vec<String> {
        self.embedder
            .provider()
            .vocabulary()
            .take(n)
            .map(str::to_string)
            .collect()
    }

    /// First `n` document identifiers in index order.
    pub fn document_sample(&self, n: usize) -> Vec<String> {
        self.index.identifiers().take(n).map(str::to_string).collect()
    }

    /// Query suggestions: purely alphabetic vocabulary words longer than four characters.
    pub fn suggestions(&self, n: usize) -> Vec<String> {
        self.embedder
            .provider()
            .vocabulary()
            .filter(|w| w.chars().count() > 4 && w.chars().all(char::is_alphabetic))
            .take(n)
            .map(str::to_string)
            .collect()
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn index(&self) -> &CorpusIndex {
        &self.index
    }

    pub fn build_report(&self) -> BuildReport {
        self.report
    }
}

fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

fn ingest_options(config: &SearchConfig) -> IngestOptions {
    IngestOptions {
        extension: config.extension.clone(),
        preview_chars: config.preview_chars,
        tokenizer: Tokenizer::new(config.tokenizer),
    }
}
