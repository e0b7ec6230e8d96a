//! Search layer.
//!
//! - **[`tokenizer`]**: NFC-normalized, lower-cased alphabetic tokens with length bounds.
//! - **[`embedding_table`]**: Word → vector lookup (word2vec text/binary, GloVe-style text).
//! - **[`embedder`]**: Mean pooling of word vectors plus L2 / dot-product helpers.
//! - **[`document`]**: Blog post header parsing, previews, display defaults.
//! - **[`corpus`]**: Directory ingestion into an immutable, identifier-ordered index.
//! - **[`ranker`]**: Cosine-similarity top-k over the index.
//! - **[`fallback`]**: Literal substring matching when a query has no embedding.
//! - **[`engine`]**: The façade tying the above together.
//! - **[`api`]**: Request/response types and validation for front ends.

pub mod api;
pub mod corpus;
pub mod document;
pub mod embedder;
pub mod embedding_table;
pub mod engine;
pub mod fallback;
pub mod ranker;
pub mod tokenizer;
