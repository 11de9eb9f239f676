use crate::index::reader::IndexReader;
use crate::index::types::DocId;
use crate::query::error::QueryError;
use crate::query::parser::{Instruction, Operator, Program, compile};
use crate::query::setops::{complement, intersect, union};
use tracing::debug;

/// Outcome of a search: the full hit count and the first `top_k` ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResult {
    pub total: usize,
    pub doc_ids: Vec<DocId>,
}

/// Stack evaluator for compiled programs
pub struct QueryExecutor<'a> {
    reader: &'a IndexReader,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(reader: &'a IndexReader) -> Self {
        Self { reader }
    }

    /// Compile and run `query`, keeping the first `top_k` matches in id order
    pub fn search(&self, query: &str, top_k: usize) -> Result<SearchResult, QueryError> {
        let program = compile(query);
        debug!(query, program = %program, "compiled query");

        let mut doc_ids = self.execute(&program)?;
        let total = doc_ids.len();
        doc_ids.truncate(top_k);

        Ok(SearchResult { total, doc_ids })
    }

    /// Evaluate a postfix program to an ascending id list
    pub fn execute(&self, program: &Program) -> Result<Vec<DocId>, QueryError> {
        let mut stack: Vec<Vec<DocId>> = Vec::new();

        for instruction in &program.instructions {
            match instruction {
                Instruction::Term(term) => stack.push(self.lookup(term)?),
                Instruction::Apply(op) => {
                    let op = *op;
                    if stack.len() < op.arity() {
                        return Err(QueryError::MissingOperand {
                            operator: op,
                            needed: op.arity(),
                            available: stack.len(),
                        });
                    }
                    let result = self.apply(op, &mut stack);
                    stack.push(result);
                }
            }
        }

        if stack.len() != 1 {
            return Err(QueryError::Unbalanced { depth: stack.len() });
        }
        Ok(stack.pop().unwrap_or_default())
    }

    /// Posting list of a term; unknown terms match nothing
    fn lookup(&self, term: &str) -> Result<Vec<DocId>, QueryError> {
        self.reader
            .postings(term)
            .map(Option::unwrap_or_default)
            .map_err(|source| QueryError::Postings {
                term: term.to_string(),
                source,
            })
    }

    /// Pop the operands of `op` (depth already checked) and combine them
    fn apply(&self, op: Operator, stack: &mut Vec<Vec<DocId>>) -> Vec<DocId> {
        let right = stack.pop().unwrap_or_default();
        match op {
            Operator::Not => complement(&right, self.reader.doc_count()),
            Operator::And => intersect(&stack.pop().unwrap_or_default(), &right),
            Operator::Or => union(&stack.pop().unwrap_or_default(), &right),
        }
    }
}
