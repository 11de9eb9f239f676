pub mod error;
pub mod executor;
pub mod parser;
pub mod setops;

pub use error::QueryError;
pub use executor::{QueryExecutor, SearchResult};
pub use parser::{Instruction, Operator, Program, compile};
