use crate::index::catalog::{Catalog, split3};
use crate::index::dictionary::TermMap;
use crate::index::types::*;
use crate::index::writer::IndexArtifacts;
use crate::utils::{CodecError, decode_postings, decode_postings_with_len};
use anyhow::{Context, Result, bail};
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Backing bytes of the postings store
enum PostingsStore {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Deref for PostingsStore {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            PostingsStore::Mapped(map) => &map[..],
            PostingsStore::Owned(bytes) => &bytes[..],
        }
    }
}

/// Summary returned by a successful [`IndexReader::verify`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    pub terms: usize,
    pub postings: u64,
    pub postings_bytes: usize,
}

/// Read-only view of a built index
pub struct IndexReader {
    index_dir: Option<PathBuf>,
    catalog: Catalog,
    /// Dictionary rows in artifact order
    entries: Vec<DictEntry>,
    terms: TermMap<TermInfo>,
    postings: PostingsStore,
}

impl IndexReader {
    /// Open the artifacts in `index_dir`. Any missing artifact is fatal.
    pub fn open(index_dir: &Path) -> Result<Self> {
        let catalog = Catalog::load(&index_dir.join(CATALOG_FILE))?;
        let entries = read_dictionary(&index_dir.join(DICTIONARY_FILE))?;
        let postings = map_postings(&index_dir.join(POSTINGS_FILE))?;

        let reader = Self::assemble(Some(index_dir.to_path_buf()), catalog, entries, postings);
        info!(
            docs = reader.doc_count(),
            terms = reader.term_count(),
            postings_bytes = reader.postings.len(),
            dir = %index_dir.display(),
            "index opened"
        );
        Ok(reader)
    }

    /// Query an index that was built in memory and never written out
    pub fn from_artifacts(artifacts: IndexArtifacts) -> Self {
        Self::assemble(
            None,
            artifacts.catalog,
            artifacts.dictionary,
            PostingsStore::Owned(artifacts.postings),
        )
    }

    fn assemble(
        index_dir: Option<PathBuf>,
        catalog: Catalog,
        entries: Vec<DictEntry>,
        postings: PostingsStore,
    ) -> Self {
        let mut terms = TermMap::with_capacity(entries.len() * 2);
        for entry in &entries {
            if terms.insert(&entry.term, entry.info()).is_some() {
                warn!(term = %entry.term, "duplicate dictionary term, last entry wins");
            }
        }

        Self {
            index_dir,
            catalog,
            entries,
            terms,
            postings,
        }
    }

    pub fn index_dir(&self) -> Option<&Path> {
        self.index_dir.as_deref()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Size of the document universe
    pub fn doc_count(&self) -> u32 {
        self.catalog.doc_count()
    }

    pub fn term_count(&self) -> usize {
        self.entries.len()
    }

    pub fn postings_bytes(&self) -> usize {
        self.postings.len()
    }

    /// Dictionary rows in the order they appear in dict.tsv
    pub fn entries(&self) -> &[DictEntry] {
        &self.entries
    }

    pub fn term_info(&self, term: &str) -> Option<TermInfo> {
        self.terms.find(term).copied()
    }

    /// Decode the posting list of an already-normalized term; `None` if unknown
    pub fn postings(&self, term: &str) -> Result<Option<Vec<DocId>>, CodecError> {
        match self.terms.find(term) {
            Some(info) => decode_postings(&self.postings, info.offset, info.doc_freq).map(Some),
            None => Ok(None),
        }
    }

    /// Check the artifacts against the index invariants: terms strictly
    /// ascending, the first list starting at byte 0, each list decoding to
    /// strictly increasing ids inside the universe, and each list ending
    /// exactly where the next one starts.
    pub fn verify(&self) -> Result<VerifyReport> {
        let store: &[u8] = &self.postings;
        let doc_count = self.doc_count();
        let mut total_postings = 0u64;

        match self.entries.first() {
            Some(first) if first.offset != 0 => bail!(
                "term {:?}: first list starts at byte {}, leaving leading bytes unaccounted for",
                first.term,
                first.offset
            ),
            None if !store.is_empty() => bail!(
                "postings store has {} bytes but the dictionary is empty",
                store.len()
            ),
            _ => {}
        }

        for (i, entry) in self.entries.iter().enumerate() {
            if let Some(prev) = i.checked_sub(1).map(|p| &self.entries[p]) {
                if prev.term.as_bytes() >= entry.term.as_bytes() {
                    bail!(
                        "dictionary not strictly sorted: {:?} before {:?}",
                        prev.term,
                        entry.term
                    );
                }
            }

            let (ids, len) = decode_postings_with_len(store, entry.offset, entry.doc_freq)
                .with_context(|| format!("term {:?}", entry.term))?;

            if let Some(pair) = ids.windows(2).find(|w| w[0] >= w[1]) {
                bail!(
                    "term {:?}: ids not strictly increasing ({} then {})",
                    entry.term,
                    pair[0],
                    pair[1]
                );
            }
            if let Some(&last) = ids.last() {
                if last >= doc_count {
                    bail!(
                        "term {:?}: document {} outside universe of {}",
                        entry.term,
                        last,
                        doc_count
                    );
                }
            }

            let end = entry.offset + len as u64;
            let expected_end = self
                .entries
                .get(i + 1)
                .map(|next| next.offset)
                .unwrap_or(store.len() as u64);
            if end != expected_end {
                bail!(
                    "term {:?}: list ends at byte {} but next entry starts at {}",
                    entry.term,
                    end,
                    expected_end
                );
            }

            total_postings += ids.len() as u64;
        }

        Ok(VerifyReport {
            terms: self.entries.len(),
            postings: total_postings,
            postings_bytes: store.len(),
        })
    }
}

/// Parse dict.tsv. Malformed rows are logged and skipped.
fn read_dictionary(path: &Path) -> Result<Vec<DictEntry>> {
    let file = File::open(path).with_context(|| format!("Cannot open {}", path.display()))?;
    parse_dictionary(BufReader::new(file))
}

pub(crate) fn parse_dictionary<R: BufRead>(input: R) -> Result<Vec<DictEntry>> {
    let mut entries = Vec::new();

    for (line_no, line) in input.lines().enumerate() {
        let line = line.context("Failed to read dictionary line")?;
        if line.is_empty() {
            continue;
        }
        let parsed = split3(&line).and_then(|(term, offset, df)| {
            Some(DictEntry {
                term: term.to_string(),
                offset: offset.parse().ok()?,
                doc_freq: df.parse().ok()?,
            })
        });
        match parsed {
            Some(entry) => entries.push(entry),
            None => warn!(
                line = line_no + 1,
                content = %line,
                "skipping malformed dictionary line"
            ),
        }
    }

    Ok(entries)
}

fn map_postings(path: &Path) -> Result<PostingsStore> {
    let file = File::open(path).with_context(|| format!("Cannot open {}", path.display()))?;
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(PostingsStore::Owned(Vec::new()));
    }
    // SAFETY: the index is immutable once built; nothing writes postings.bin while it is mapped
    let map = unsafe { Mmap::map(&file) }
        .with_context(|| format!("Failed to map {}", path.display()))?;
    Ok(PostingsStore::Mapped(map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::writer::build_in_memory;
    use tempfile::TempDir;

    #[test]
    fn test_open_roundtrip() {
        let dir = TempDir::new().unwrap();
        let artifacts = build_in_memory(["cats run", "cat ran", "dog walks"]);
        artifacts.write(dir.path()).unwrap();

        let reader = IndexReader::open(dir.path()).unwrap();
        assert_eq!(reader.doc_count(), 3);
        assert_eq!(reader.term_count(), 5);
        assert_eq!(reader.postings("cat").unwrap(), Some(vec![0, 1]));
        assert_eq!(reader.postings("walk").unwrap(), Some(vec![2]));
        assert_eq!(reader.postings("zzz").unwrap(), None);
        assert_eq!(reader.entries(), artifacts.dictionary.as_slice());
        assert!(reader.verify().is_ok());
    }

    #[test]
    fn test_open_missing_artifact_names_it() {
        let dir = TempDir::new().unwrap();
        build_in_memory(["ocean"]).write(dir.path()).unwrap();
        std::fs::remove_file(dir.path().join(DICTIONARY_FILE)).unwrap();

        let err = IndexReader::open(dir.path()).err().unwrap();
        assert!(format!("{err:#}").contains("dict.tsv"));
    }

    #[test]
    fn test_empty_index_opens() {
        let dir = TempDir::new().unwrap();
        build_in_memory(Vec::<&str>::new()).write(dir.path()).unwrap();
        let reader = IndexReader::open(dir.path()).unwrap();
        assert_eq!(reader.doc_count(), 0);
        assert_eq!(reader.postings_bytes(), 0);
        assert_eq!(reader.verify().unwrap().terms, 0);
    }

    #[test]
    fn test_parse_dictionary_skips_malformed() {
        let input = "cat\t0\t2\nbroken line\ndog\tx\t1\nrun\t2\t1\n";
        let entries = parse_dictionary(input.as_bytes()).unwrap();
        let terms: Vec<_> = entries.iter().map(|e| e.term.as_str()).collect();
        assert_eq!(terms, vec!["cat", "run"]);
    }

    #[test]
    fn test_verify_detects_bad_framing() {
        let mut artifacts = build_in_memory(["alpha beta", "beta"]);
        // beta has df 2; claiming 1 leaves a byte unaccounted for
        let beta = artifacts.dictionary.iter_mut().find(|e| e.term == "beta").unwrap();
        beta.doc_freq = 1;
        let err = IndexReader::from_artifacts(artifacts).verify().unwrap_err();
        assert!(err.to_string().contains("beta"));
    }

    #[test]
    fn test_verify_detects_unsorted_dictionary() {
        let mut artifacts = build_in_memory(["alpha beta"]);
        artifacts.dictionary.swap(0, 1);
        assert!(IndexReader::from_artifacts(artifacts).verify().is_err());
    }

    #[test]
    fn test_verify_detects_leading_junk_bytes() {
        let mut artifacts = build_in_memory(["alpha beta", "beta"]);
        artifacts.postings.insert(0, 0x00);
        for entry in &mut artifacts.dictionary {
            entry.offset += 1;
        }

        // Every list still decodes and abuts the next one
        let reader = IndexReader::from_artifacts(artifacts);
        assert_eq!(reader.postings("beta").unwrap(), Some(vec![0, 1]));

        let err = reader.verify().unwrap_err();
        assert!(err.to_string().contains("leading bytes"), "got: {err}");
    }
}
