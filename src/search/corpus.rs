//! In-memory corpus index built once from a document directory.
//!
//! Each entry keeps a document's metadata together with its mean-pooled
//! embedding, so a document is either fully indexed or absent. Entries are
//! keyed by file name and iterate in ascending identifier order.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use super::document::{DocumentMetadata, parse_document};
use super::embedder::{DocumentEmbedder, normalize};
use super::tokenizer::Tokenizer;
use crate::config::DEFAULT_PREVIEW_CHARS;

/// Ingestion settings for [`CorpusIndex::build`].
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// File extension (without the dot) identifying documents.
    pub extension: String,
    pub preview_chars: usize,
    pub tokenizer: Tokenizer,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            extension: "txt".to_string(),
            preview_chars: DEFAULT_PREVIEW_CHARS,
            tokenizer: Tokenizer::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexedDocument {
    pub metadata: DocumentMetadata,
    pub embedding: Vec<f32>,
    /// Unit-length embedding; `None` when the embedding has zero magnitude.
    pub unit: Option<Vec<f32>>,
}

impl IndexedDocument {
    pub fn is_zero(&self) -> bool {
        self.unit.is_none()
    }
}

/// Summary of one ingestion pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub indexed: usize,
    pub skipped: usize,
    pub zero_embeddings: usize,
}

#[derive(Debug, Clone, Default)]
pub struct CorpusIndex {
    dimension: usize,
    documents: BTreeMap<String, IndexedDocument>,
}

impl CorpusIndex {
    /// An index with no documents.
    pub fn empty(dimension: usize) -> Self {
        Self {
            dimension,
            documents: BTreeMap::new(),
        }
    }

    /// Scan `dir` (non-recursively) and index every matching document.
    ///
    /// A missing directory yields an empty index. Documents that cannot be
    /// read are logged and skipped.
    pub fn build(
        dir: &Path,
        embedder: &DocumentEmbedder,
        options: &IngestOptions,
    ) -> (Self, BuildReport) {
        let mut index = Self::empty(embedder.dimension());
        if !dir.is_dir() {
            error!(dir = %dir.display(), "document directory not found");
            return (index, BuildReport::default());
        }

        let paths = document_paths(dir, &options.extension);
        info!(dir = %dir.display(), files = paths.len(), "indexing documents");

        let parsed: Vec<(PathBuf, Result<(String, IndexedDocument)>)> = paths
            .into_par_iter()
            .map(|path| {
                let result = index_file(&path, embedder, options);
                (path, result)
            })
            .collect();

        let mut report = BuildReport::default();
        for (path, result) in parsed {
            match result {
                Ok((id, doc)) => index.insert(id, doc, &mut report),
                Err(e) => {
                    warn!(path = %path.display(), error = %format!("{e:#}"), "skipping document");
                    report.skipped += 1;
                }
            }
        }

        info!(
            indexed = report.indexed,
            skipped = report.skipped,
            zero_embeddings = report.zero_embeddings,
            "corpus index built"
        );
        (index, report)
    }

    /// Index in-memory `(identifier, raw file contents)` pairs.
    ///
    /// Later duplicates of an identifier replace earlier ones.
    pub fn from_documents<I, K, V>(
        documents: I,
        embedder: &DocumentEmbedder,
        options: &IngestOptions,
    ) -> (Self, BuildReport)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut index = Self::empty(embedder.dimension());
        let mut report = BuildReport::default();
        for (id, content) in documents {
            let doc = index_content(content.as_ref(), embedder, options);
            index.insert(id.into(), doc, &mut report);
        }
        (index, report)
    }

    fn insert(&mut self, id: String, doc: IndexedDocument, report: &mut BuildReport) {
        let zero = doc.is_zero();
        match self.documents.insert(id.clone(), doc) {
            Some(previous) => {
                debug!(id = %id, "duplicate identifier replaced");
                if previous.is_zero() {
                    report.zero_embeddings -= 1;
                }
            }
            None => report.indexed += 1,
        }
        if zero {
            report.zero_embeddings += 1;
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&IndexedDocument> {
        self.documents.get(id)
    }

    pub fn metadata(&self, id: &str) -> Option<&DocumentMetadata> {
        self.documents.get(id).map(|d| &d.metadata)
    }

    /// Documents in ascending identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexedDocument)> {
        self.documents.iter().map(|(id, doc)| (id.as_str(), doc))
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }
}

fn document_paths(dir: &Path, extension: &str) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "unreadable directory entry");
                None
            }
        })
        .map(walkdir::DirEntry::into_path)
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.to_string_lossy() == extension)
        })
        .collect()
}

fn index_file(
    path: &Path,
    embedder: &DocumentEmbedder,
    options: &IngestOptions,
) -> Result<(String, IndexedDocument)> {
    let id = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("no file name in {path:?}"))?;
    let content =
        std::fs::read_to_string(path).with_context(|| format!("read document {path:?}"))?;
    Ok((id, index_content(&content, embedder, options)))
}

fn index_content(
    content: &str,
    embedder: &DocumentEmbedder,
    options: &IngestOptions,
) -> IndexedDocument {
    let parsed = parse_document(content, options.preview_chars);
    let tokens = options.tokenizer.tokenize(&parsed.embedding_text());
    let embedding = embedder.embed(&tokens);
    let unit = normalize(&embedding);
    IndexedDocument {
        metadata: parsed.metadata,
        embedding,
        unit,
    }
}
