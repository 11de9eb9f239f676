//! # boolsearch - Boolean retrieval over plain-text corpora
//!
//! boolsearch builds an inverted index over a directory of text documents and
//! answers boolean queries (`AND`, `OR`, `NOT`, parentheses) with the ascending
//! list of matching document ids.
//!
//! ## Architecture
//!
//! - [`utils`] - Text normalization (tokenizer + stemmer) and the postings codec
//! - [`index`] - Term dictionary, index building, artifact loading, statistics
//! - [`query`] - Query compilation to postfix and stack-based evaluation
//! - [`output`] - Hit formatting
//!
//! ## Quick Start
//!
//! ```no_run
//! use boolsearch::index::IndexReader;
//! use boolsearch::query::QueryExecutor;
//! use std::path::Path;
//!
//! let reader = IndexReader::open(Path::new("index")).unwrap();
//! let result = QueryExecutor::new(&reader)
//!     .search("ship AND NOT (river OR lake)", 10)
//!     .unwrap();
//!
//! println!("hits: {}", result.total);
//! for id in result.doc_ids {
//!     let doc = reader.catalog().get(id).unwrap();
//!     println!("{}\t{}\t{}", id, doc.source, doc.path.display());
//! }
//! ```
//!
//! ## On-disk index
//!
//! An index directory holds three artifacts plus build metadata:
//!
//! 1. **docs.tsv** - `id\tsource\tpath`, line k describes document k
//! 2. **dict.tsv** - `term\toffset\tdf`, sorted by term bytes
//! 3. **postings.bin** - concatenated gap-encoded varint posting lists
//!
//! `meta.json` records counts and the build time; readers do not need it.

pub mod index;
pub mod output;
pub mod query;
pub mod utils;
