use crate::query::parser::Operator;
use crate::utils::CodecError;
use thiserror::Error;

/// Reasons a query yields no answer at all.
///
/// An unknown term is not among them: it simply matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("{operator} needs {needed} operand(s) but only {available} available")]
    MissingOperand {
        operator: Operator,
        needed: usize,
        available: usize,
    },

    #[error("malformed query: {depth} results left after evaluation, expected exactly one")]
    Unbalanced { depth: usize },

    #[error("postings for term {term:?} are corrupt")]
    Postings {
        term: String,
        #[source]
        source: CodecError,
    },
}
