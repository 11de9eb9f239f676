//! Utility functions shared by the index and query layers.
//!
//! ## Modules
//!
//! - [`encoding`] - Postings codec (delta gaps + varints)
//! - [`tokenizer`] - Tokenizer and suffix-stripping stemmer
//! - [`progress`] - Progress bars that compile away without the `progress` feature
//!
//! ## Key Functions
//!
//! ```
//! use boolsearch::utils::{encode_postings, decode_postings, terms};
//!
//! let mut store = Vec::new();
//! encode_postings(&[2, 7, 9], &mut store);
//! assert_eq!(decode_postings(&store, 0, 3).unwrap(), vec![2, 7, 9]);
//!
//! let t: Vec<String> = terms("Cats walking").collect();
//! assert_eq!(t, vec!["cat", "walk"]);
//! ```

pub mod encoding;
pub mod progress;
pub mod tokenizer;

pub use encoding::*;
pub use tokenizer::*;
