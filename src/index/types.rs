use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Dense, 0-based identifier of a document in discovery order
pub type DocId = u32;

/// File names of the on-disk artifacts inside an index directory
pub const CATALOG_FILE: &str = "docs.tsv";
pub const DICTIONARY_FILE: &str = "dict.tsv";
pub const POSTINGS_FILE: &str = "postings.bin";
pub const META_FILE: &str = "meta.json";

/// Catalog record: document `doc_id` came from `path` under source tag `source`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub doc_id: DocId,
    pub source: String,
    pub path: PathBuf,
}

/// Query-time dictionary value: where a term's postings start and how many there are
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TermInfo {
    pub offset: u64,
    pub doc_freq: u32,
}

/// One row of the dictionary artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictEntry {
    pub term: String,
    pub offset: u64,
    pub doc_freq: u32,
}

impl DictEntry {
    pub fn info(&self) -> TermInfo {
        TermInfo {
            offset: self.offset,
            doc_freq: self.doc_freq,
        }
    }
}

/// Index metadata stored in meta.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMeta {
    pub version: u32,
    pub doc_count: u32,
    pub term_count: u64,
    pub postings_bytes: u64,
    pub created_at: u64,
}

impl Default for IndexMeta {
    fn default() -> Self {
        Self {
            version: 1,
            doc_count: 0,
            term_count: 0,
            postings_bytes: 0,
            created_at: 0,
        }
    }
}

/// Configuration for corpus discovery and the indexer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Source-tag subdirectories of the input dir, scanned in this order
    pub sources: Vec<String>,
    /// File extension (without dot) of documents to index
    pub extension: String,
    /// Files larger than this keep their id but contribute no terms
    pub max_file_size: u64,
    /// Number of files read per batch
    pub chunk_size: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            sources: vec!["wikipedia_en".to_string(), "marinelink".to_string()],
            extension: "txt".to_string(),
            max_file_size: 100 * 1024 * 1024,
            chunk_size: 4096,
        }
    }
}

impl IndexConfig {
    /// Load a JSON config file; fields it omits keep their defaults
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: IndexConfig =
            serde_json::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}
