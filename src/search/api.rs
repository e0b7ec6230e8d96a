//! Transport-neutral query boundary.
//!
//! Request validation, response shaping and failure reporting for whatever
//! front end sits on top of the engine (the CLI's `--json` output uses the
//! same types). Internal error detail is logged, never returned.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::document::DisplayMetadata;
use super::engine::{SearchEngine, SearchPath};
use crate::config::DEFAULT_TOP_K;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultItem {
    pub identifier: String,
    pub score: f32,
    pub metadata: DisplayMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResponse {
    /// The query as submitted, before trimming or lower-casing.
    pub query: String,
    pub results: Vec<ResultItem>,
    pub total_found: usize,
    pub search_path: SearchPath,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("search engine not initialized")]
    EngineUnavailable,

    #[error("missing query parameter")]
    MissingQuery,

    #[error("empty query")]
    EmptyQuery,

    #[error("search failed")]
    SearchFailed,
}

impl QueryError {
    /// HTTP-style status code for front ends that need one.
    pub fn status_code(&self) -> u16 {
        match self {
            QueryError::MissingQuery | QueryError::EmptyQuery => 400,
            QueryError::EngineUnavailable | QueryError::SearchFailed => 500,
        }
    }

    /// Stable machine-readable kind.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::EngineUnavailable => "engine-unavailable",
            QueryError::MissingQuery => "missing-query",
            QueryError::EmptyQuery => "empty-query",
            QueryError::SearchFailed => "search-failed",
        }
    }
}

/// Validate `request` and run it against `engine`.
///
/// `None` means the engine failed to start; every query then reports
/// [`QueryError::EngineUnavailable`].
pub fn handle_query(
    engine: Option<&SearchEngine>,
    request: QueryRequest,
) -> Result<QueryResponse, QueryError> {
    let engine = engine.ok_or(QueryError::EngineUnavailable)?;
    let query = request.query.ok_or(QueryError::MissingQuery)?;
    if query.trim().is_empty() {
        return Err(QueryError::EmptyQuery);
    }

    info!(query = %query, top_k = request.top_k, "query received");
    let outcome = engine.search(&query, request.top_k).map_err(|e| {
        error!(query = %query, error = %format!("{e:#}"), "search failed");
        QueryError::SearchFailed
    })?;

    let results: Vec<ResultItem> = outcome
        .hits
        .into_iter()
        .map(|hit| ResultItem {
            identifier: hit.identifier,
            score: hit.score,
            metadata: hit.metadata.display(),
        })
        .collect();

    Ok(QueryResponse {
        query,
        total_found: results.len(),
        results,
        search_path: outcome.path,
        timestamp: now_rfc3339(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub engine_loaded: bool,
    pub document_count: usize,
    pub vocabulary_size: usize,
    pub timestamp: String,
}

pub fn health(engine: Option<&SearchEngine>) -> HealthReport {
    let stats = engine.map(SearchEngine::stats);
    HealthReport {
        status: if engine.is_some() { "healthy" } else { "unhealthy" },
        engine_loaded: engine.is_some(),
        document_count: stats.map_or(0, |s| s.total_documents),
        vocabulary_size: stats.map_or(0, |s| s.vocabulary_size),
        timestamp: now_rfc3339(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsReport {
    pub document_count: usize,
    pub vocabulary_size: usize,
    pub embedding_dimension: usize,
    pub indexed_documents: usize,
    pub sample_vocabulary: Vec<String>,
    pub sample_documents: Vec<String>,
}

pub fn stats_report(engine: Option<&SearchEngine>) -> Result<StatsReport, QueryError> {
    let engine = engine.ok_or(QueryError::EngineUnavailable)?;
    let stats = engine.stats();
    let config = engine.config();
    Ok(StatsReport {
        document_count: stats.total_documents,
        vocabulary_size: stats.vocabulary_size,
        embedding_dimension: stats.embedding_dimension,
        indexed_documents: engine.index().iter().filter(|(_, d)| !d.is_zero()).count(),
        sample_vocabulary: engine.vocabulary_sample(config.vocab_sample),
        sample_documents: engine.document_sample(config.doc_sample),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestionsReport {
    pub suggestions: Vec<String>,
    pub total_vocabulary: usize,
}

/// Suggested query words; an unavailable engine suggests nothing.
pub fn suggestions(engine: Option<&SearchEngine>, limit: usize) -> SuggestionsReport {
    match engine {
        Some(engine) => SuggestionsReport {
            suggestions: engine.suggestions(limit),
            total_vocabulary: engine.stats().vocabulary_size,
        },
        None => SuggestionsReport {
            suggestions: Vec::new(),
            total_vocabulary: 0,
        },
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::search::embedding_table::EmbeddingTable;
    use std::sync::Arc;

    fn engine() -> SearchEngine {
        let table = EmbeddingTable::from_entries(
            "test",
            2,
            [("technology", vec![1.0, 0.0]), ("cooking", vec![0.0, 1.0])],
        )
        .unwrap();
        SearchEngine::from_documents(
            SearchConfig::default(),
            Arc::new(table),
            [
                ("tech.txt", "Title: Tech Notes\n===\ntechnology"),
                ("food.txt", "cooking"),
            ],
        )
    }

    #[test]
    fn validates_request() {
        let engine = engine();
        assert_eq!(
            handle_query(None, QueryRequest::new("technology")),
            Err(QueryError::EngineUnavailable)
        );
        let missing = QueryRequest {
            query: None,
            top_k: 5,
        };
        assert_eq!(
            handle_query(Some(&engine), missing),
            Err(QueryError::MissingQuery)
        );
        assert_eq!(
            handle_query(Some(&engine), QueryRequest::new("  \t ")),
            Err(QueryError::EmptyQuery)
        );
        assert_eq!(QueryError::EmptyQuery.status_code(), 400);
        assert_eq!(QueryError::SearchFailed.status_code(), 500);
    }

    #[test]
    fn response_applies_display_defaults() {
        let engine = engine();
        let response = handle_query(Some(&engine), QueryRequest::new("Cooking")).unwrap();
        assert_eq!(response.query, "Cooking");
        assert_eq!(response.search_path, SearchPath::Semantic);
        assert_eq!(response.total_found, response.results.len());
        assert_eq!(response.results[0].identifier, "food.txt");
        assert_eq!(response.results[0].metadata.title, "Untitled");
        assert_eq!(response.results[0].metadata.author, "Unknown");
        assert!(chrono::DateTime::parse_from_rfc3339(&response.timestamp).is_ok());
    }

    #[test]
    fn request_deserializes_with_default_top_k() {
        let request: QueryRequest = serde_json::from_str(r#"{"query":"data"}"#).unwrap();
        assert_eq!(request, QueryRequest::new("data"));
        let request: QueryRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.query, None);
    }

    #[test]
    fn health_and_stats_reflect_engine_state() {
        let down = health(None);
        assert_eq!(down.status, "unhealthy");
        assert!(!down.engine_loaded);
        assert_eq!(stats_report(None), Err(QueryError::EngineUnavailable));
        assert!(suggestions(None, 5).suggestions.is_empty());

        let engine = engine();
        let up = health(Some(&engine));
        assert_eq!(up.status, "healthy");
        assert_eq!(up.document_count, 2);
        assert_eq!(up.vocabulary_size, 2);

        let stats = stats_report(Some(&engine)).unwrap();
        assert_eq!(stats.sample_documents, vec!["food.txt", "tech.txt"]);
        assert_eq!(stats.sample_vocabulary, vec!["technology", "cooking"]);
        assert_eq!(stats.indexed_documents, 2);

        let report = suggestions(Some(&engine), 1);
        assert_eq!(report.suggestions, vec!["technology"]);
        assert_eq!(report.total_vocabulary, 2);
    }
}
