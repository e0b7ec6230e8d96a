//! Read-only word embedding table.
//!
//! The table is loaded once at startup from a pre-trained model exported in
//! one of the common word2vec interchange formats:
//!
//! | Format | Detection | Layout |
//! |--------|-----------|--------|
//! | word2vec text | first line is `<count> <dim>` | `<word> <f32 × dim>` per line |
//! | headerless text (GloVe) | first line is a vector row | dimension inferred from the first row |
//! | word2vec binary | `.bin` extension | `<count> <dim>\n`, then `<word> <dim × f32 LE>` per entry |
//!
//! Vectors live in one contiguous row-major slab; the word index maps into it.
//! Duplicate words keep their first occurrence.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use tracing::{debug, info, warn};

/// Word → vector lookup consumed by the document embedder.
///
/// Implementations must be immutable after construction so that queries can
/// run concurrently without locking.
pub trait EmbeddingProvider: Send + Sync {
    /// Identifier of the loaded model (usually the source file name).
    fn id(&self) -> &str;

    /// Fixed vector dimension.
    fn dimension(&self) -> usize;

    /// Vector for `word`, if it is in the vocabulary.
    fn vector(&self, word: &str) -> Option<&[f32]>;

    /// Membership test.
    fn contains(&self, word: &str) -> bool {
        self.vector(word).is_some()
    }

    /// Number of words in the vocabulary.
    fn vocabulary_size(&self) -> usize;

    /// Vocabulary in model order.
    fn vocabulary(&self) -> Box<dyn Iterator<Item = &str> + '_>;
}

#[derive(Debug, Clone)]
pub struct EmbeddingTable {
    id: String,
    dimension: usize,
    words: Vec<String>,
    index: HashMap<String, usize>,
    vectors: Vec<f32>,
}

impl EmbeddingTable {
    /// Build a table from in-memory entries.
    pub fn from_entries<I, S>(id: impl Into<String>, dimension: usize, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<f32>)>,
        S: Into<String>,
    {
        let mut table = Self::with_dimension(id, dimension)?;
        for (word, vector) in entries {
            let word = word.into();
            if vector.len() != dimension {
                bail!(
                    "vector dimension mismatch for {word:?}: expected {dimension}, got {}",
                    vector.len()
                );
            }
            table.push(word, &vector);
        }
        Ok(table)
    }

    /// Load a table from disk, picking the format from the extension and header.
    pub fn load(path: &Path) -> Result<Self> {
        let id = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let file = File::open(path).with_context(|| format!("open embedding table {path:?}"))?;
        let reader = BufReader::new(file);

        let is_binary = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("bin"));
        let table = if is_binary {
            Self::read_binary(id, reader)
        } else {
            Self::read_text(id, reader)
        }
        .with_context(|| format!("parse embedding table {path:?}"))?;

        info!(
            model = table.id(),
            vocabulary = table.len(),
            dimension = table.dimension,
            "embedding_table_loaded"
        );
        Ok(table)
    }

    /// Parse word2vec text format, with or without the `<count> <dim>` header.
    pub fn read_text<R: BufRead>(id: impl Into<String>, reader: R) -> Result<Self> {
        let id = id.into();
        let mut table: Option<Self> = None;
        let mut declared_count: Option<usize> = None;

        for (line_no, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("read line {}", line_no + 1))?;
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }

            if table.is_none() {
                if let [count, dim] = fields.as_slice()
                    && let (Ok(count), Ok(dim)) = (count.parse::<usize>(), dim.parse::<usize>())
                {
                    declared_count = Some(count);
                    table = Some(Self::with_dimension(id.clone(), dim)?);
                    continue;
                }
                table = Some(Self::with_dimension(id.clone(), fields.len() - 1)?);
            }
            let Some(current) = table.as_mut() else {
                continue;
            };

            let (word, values) = fields
                .split_first()
                .ok_or_else(|| anyhow!("line {} is empty", line_no + 1))?;
            if values.len() != current.dimension {
                bail!(
                    "line {}: expected {} components for {word:?}, got {}",
                    line_no + 1,
                    current.dimension,
                    values.len()
                );
            }
            let vector = values
                .iter()
                .map(|v| v.parse::<f32>())
                .collect::<Result<Vec<f32>, _>>()
                .with_context(|| format!("line {}: invalid component for {word:?}", line_no + 1))?;
            current.push((*word).to_string(), &vector);
        }

        let table = table.ok_or_else(|| anyhow!("embedding table is empty"))?;
        if let Some(count) = declared_count
            && count != table.len()
        {
            warn!(
                declared = count,
                loaded = table.len(),
                "embedding table header count does not match rows"
            );
        }
        Ok(table)
    }

    /// Parse word2vec binary format.
    pub fn read_binary<R: BufRead>(id: impl Into<String>, mut reader: R) -> Result<Self> {
        let mut header = String::new();
        reader
            .read_line(&mut header)
            .context("read binary header")?;
        let mut parts = header.split_whitespace();
        let count: usize = parts
            .next()
            .ok_or_else(|| anyhow!("binary header is missing the word count"))?
            .parse()
            .context("parse binary word count")?;
        let dimension: usize = parts
            .next()
            .ok_or_else(|| anyhow!("binary header is missing the dimension"))?
            .parse()
            .context("parse binary dimension")?;

        let mut table = Self::with_dimension(id, dimension)?;
        let mut word_buf = Vec::new();
        let mut vec_buf = vec![0u8; dimension * 4];
        let mut vector = vec![0f32; dimension];

        for entry in 0..count {
            word_buf.clear();
            reader
                .read_until(b' ', &mut word_buf)
                .with_context(|| format!("read word {entry}"))?;
            if word_buf.last() != Some(&b' ') {
                bail!("unexpected end of file at entry {entry}");
            }
            word_buf.pop();
            // Entries may be separated by a newline after the vector bytes.
            let start = word_buf
                .iter()
                .position(|b| *b != b'\n')
                .unwrap_or(word_buf.len());
            let word = std::str::from_utf8(&word_buf[start..])
                .with_context(|| format!("word {entry} is not valid UTF-8"))?
                .to_string();

            reader
                .read_exact(&mut vec_buf)
                .with_context(|| format!("read vector for {word:?}"))?;
            for (slot, chunk) in vector.iter_mut().zip(vec_buf.chunks_exact(4)) {
                *slot = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            }
            table.push(word, &vector);
        }

        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    fn with_dimension(id: impl Into<String>, dimension: usize) -> Result<Self> {
        if dimension == 0 {
            bail!("dimension must be non-zero");
        }
        Ok(Self {
            id: id.into(),
            dimension,
            words: Vec::new(),
            index: HashMap::new(),
            vectors: Vec::new(),
        })
    }

    fn push(&mut self, word: String, vector: &[f32]) {
        if self.index.contains_key(&word) {
            debug!(word = %word, "duplicate embedding ignored");
            return;
        }
        self.index.insert(word.clone(), self.words.len());
        self.words.push(word);
        self.vectors.extend_from_slice(vector);
    }
}

impl EmbeddingProvider for EmbeddingTable {
    fn id(&self) -> &str {
        &self.id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn vector(&self, word: &str) -> Option<&[f32]> {
        let row = *self.index.get(word)?;
        let start = row * self.dimension;
        self.vectors.get(start..start + self.dimension)
    }

    fn vocabulary_size(&self) -> usize {
        self.words.len()
    }

    fn vocabulary(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.words.iter().map(String::as_str))
    }
}
