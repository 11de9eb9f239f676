use crate::index::catalog::Catalog;
use crate::index::dictionary::TermMap;
use crate::index::types::*;
use crate::utils::{encode_postings, terms};
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

/// Accumulates posting lists while documents are fed in id order
pub struct IndexWriter {
    catalog: Catalog,
    postings: TermMap<Vec<DocId>>,
}

impl Default for IndexWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexWriter {
    pub fn new() -> Self {
        Self {
            catalog: Catalog::new(),
            postings: TermMap::new(),
        }
    }

    /// Register the next document and index its text.
    /// `None` keeps the id and catalog record but adds no terms (unreadable file).
    pub fn add_document(
        &mut self,
        source: &str,
        path: impl Into<PathBuf>,
        text: Option<&str>,
    ) -> DocId {
        let doc_id = self.catalog.push(source, path);
        if let Some(text) = text {
            self.index_text(doc_id, text);
        }
        doc_id
    }

    fn index_text(&mut self, doc_id: DocId, text: &str) {
        for term in terms(text) {
            let list = self.postings.get_or_insert_with(&term, Vec::new);
            // Ids only grow, so a repeat within this document is always the last entry
            if list.last() != Some(&doc_id) {
                list.push(doc_id);
            }
        }
    }

    /// Number of documents registered so far
    pub fn doc_count(&self) -> usize {
        self.catalog.len()
    }

    /// Number of distinct terms so far
    pub fn term_count(&self) -> usize {
        self.postings.len()
    }

    /// Posting list accumulated for `term`, if any
    pub fn postings(&self, term: &str) -> Option<&[DocId]> {
        self.postings.find(term).map(Vec::as_slice)
    }

    /// Sort terms and encode every posting list into the postings store
    pub fn finish(self) -> IndexArtifacts {
        let entries = self.postings.into_sorted();
        let mut dictionary = Vec::with_capacity(entries.len());
        let mut postings = Vec::new();

        for (term, doc_ids) in entries {
            let offset = postings.len() as u64;
            encode_postings(&doc_ids, &mut postings);
            dictionary.push(DictEntry {
                term,
                offset,
                doc_freq: doc_ids.len() as u32,
            });
        }

        IndexArtifacts {
            catalog: self.catalog,
            dictionary,
            postings,
        }
    }
}

/// Index a list of in-memory texts; document k gets id k
pub fn build_in_memory<'a>(texts: impl IntoIterator<Item = &'a str>) -> IndexArtifacts {
    let mut writer = IndexWriter::new();
    for (i, text) in texts.into_iter().enumerate() {
        writer.add_document("memory", format!("doc{i}"), Some(text));
    }
    writer.finish()
}

/// A finished index: catalog, term-sorted dictionary and the postings store
#[derive(Debug, Clone)]
pub struct IndexArtifacts {
    pub catalog: Catalog,
    pub dictionary: Vec<DictEntry>,
    pub postings: Vec<u8>,
}

impl IndexArtifacts {
    /// Write docs.tsv, dict.tsv, postings.bin and meta.json into `index_dir`
    pub fn write(&self, index_dir: &Path) -> Result<IndexMeta> {
        fs::create_dir_all(index_dir)
            .with_context(|| format!("Failed to create {}", index_dir.display()))?;

        self.write_catalog(index_dir)?;
        self.write_dictionary(index_dir)?;
        self.write_postings(index_dir)?;
        let meta = self.write_meta(index_dir)?;

        info!(
            docs = meta.doc_count,
            terms = meta.term_count,
            postings_bytes = meta.postings_bytes,
            dir = %index_dir.display(),
            "index written"
        );
        Ok(meta)
    }

    fn write_catalog(&self, index_dir: &Path) -> Result<()> {
        let mut file = BufWriter::new(create(&index_dir.join(CATALOG_FILE))?);
        self.catalog.write_tsv(&mut file)?;
        file.flush()?;
        Ok(())
    }

    fn write_dictionary(&self, index_dir: &Path) -> Result<()> {
        let mut file = BufWriter::new(create(&index_dir.join(DICTIONARY_FILE))?);
        for entry in &self.dictionary {
            writeln!(file, "{}\t{}\t{}", entry.term, entry.offset, entry.doc_freq)?;
        }
        file.flush()?;
        Ok(())
    }

    fn write_postings(&self, index_dir: &Path) -> Result<()> {
        let mut file = BufWriter::new(create(&index_dir.join(POSTINGS_FILE))?);
        file.write_all(&self.postings)?;
        file.flush()?;
        Ok(())
    }

    fn write_meta(&self, index_dir: &Path) -> Result<IndexMeta> {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let meta = IndexMeta {
            version: 1,
            doc_count: self.catalog.doc_count(),
            term_count: self.dictionary.len() as u64,
            postings_bytes: self.postings.len() as u64,
            created_at,
        };

        let file = create(&index_dir.join(META_FILE))?;
        serde_json::to_writer_pretty(file, &meta)?;
        Ok(meta)
    }
}

fn create(path: &Path) -> Result<File> {
    File::create(path).with_context(|| format!("Cannot create {}", path.display()))
}
