pub mod build;
pub mod catalog;
pub mod corpus;
pub mod dictionary;
pub mod reader;
pub mod stats;
pub mod types;
pub mod writer;

pub use catalog::Catalog;
pub use dictionary::TermMap;
pub use reader::IndexReader;
pub use types::*;
pub use writer::{IndexArtifacts, IndexWriter, build_in_memory};
