//! Document catalog: the `id\tsource\tpath` table that maps dense ids back to files.

use crate::index::types::{DocId, Document};
use anyhow::{Context, Result, bail};
use memchr::memchr;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

/// Ordered list of documents; position k holds document k
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    documents: Vec<Document>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a document and return the id it was assigned
    pub fn push(&mut self, source: impl Into<String>, path: impl Into<PathBuf>) -> DocId {
        let doc_id = self.documents.len() as DocId;
        self.documents.push(Document {
            doc_id,
            source: source.into(),
            path: path.into(),
        });
        doc_id
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Size of the id universe `[0, N)`
    pub fn doc_count(&self) -> u32 {
        self.documents.len() as u32
    }

    pub fn get(&self, doc_id: DocId) -> Option<&Document> {
        self.documents.get(doc_id as usize)
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn write_tsv<W: Write>(&self, out: &mut W) -> Result<()> {
        for doc in &self.documents {
            writeln!(out, "{}\t{}\t{}", doc.doc_id, doc.source, doc.path.display())?;
        }
        Ok(())
    }

    /// Parse a catalog. Record k must carry id k; anything else would silently
    /// renumber every later document, so it is rejected.
    pub fn read_tsv<R: BufRead>(input: R) -> Result<Self> {
        let mut catalog = Catalog::new();

        for (line_no, line) in input.lines().enumerate() {
            let line = line.context("Failed to read catalog line")?;
            if line.is_empty() {
                continue;
            }
            let Some((id, source, path)) = split3(&line) else {
                bail!("Malformed catalog line {}: {:?}", line_no + 1, line);
            };
            let id: DocId = id
                .parse()
                .with_context(|| format!("Bad document id on catalog line {}", line_no + 1))?;
            if id as usize != catalog.len() {
                bail!(
                    "Catalog line {} has id {} but should define document {}",
                    line_no + 1,
                    id,
                    catalog.len()
                );
            }
            catalog.push(source, path);
        }

        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Cannot open {}", path.display()))?;
        Self::read_tsv(std::io::BufReader::new(file))
    }
}

/// Split on the first two tabs; the last field keeps any further tabs
pub(crate) fn split3(line: &str) -> Option<(&str, &str, &str)> {
    let bytes = line.as_bytes();
    let first = memchr(b'\t', bytes)?;
    let second = first + 1 + memchr(b'\t', &bytes[first + 1..])?;
    Some((&line[..first], &line[first + 1..second], &line[second + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_assigns_dense_ids() {
        let mut catalog = Catalog::new();
        assert_eq!(catalog.push("wiki", "a.txt"), 0);
        assert_eq!(catalog.push("news", "b.txt"), 1);
        assert_eq!(catalog.doc_count(), 2);
        assert_eq!(catalog.get(1).unwrap().source, "news");
        assert!(catalog.get(2).is_none());
    }

    #[test]
    fn test_tsv_roundtrip() {
        let mut catalog = Catalog::new();
        catalog.push("wikipedia_en", "data/wikipedia_en/Ocean.txt");
        catalog.push("marinelink", "data/marinelink/ship 1.txt");

        let mut buf = Vec::new();
        catalog.write_tsv(&mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf.clone()).unwrap(),
            "0\twikipedia_en\tdata/wikipedia_en/Ocean.txt\n1\tmarinelink\tdata/marinelink/ship 1.txt\n"
        );

        let back = Catalog::read_tsv(buf.as_slice()).unwrap();
        assert_eq!(back, catalog);
    }

    #[test]
    fn test_read_rejects_out_of_order_ids() {
        let err = Catalog::read_tsv("0\ta\tx\n2\ta\ty\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("should define document 1"));
    }

    #[test]
    fn test_read_rejects_missing_fields() {
        assert!(Catalog::read_tsv("0\tonly-two\n".as_bytes()).is_err());
    }

    #[test]
    fn test_split3_keeps_tabs_in_last_field() {
        assert_eq!(split3("a\tb\tc\td"), Some(("a", "b", "c\td")));
        assert_eq!(split3("a\tb"), None);
    }
}
