//! Boolean query compiler: infix string -> postfix program.
//!
//! Grammar is the usual `AND` / `OR` / `NOT` with parentheses; keywords are
//! case-insensitive. Binding is `NOT` > `AND` > `OR`, binary operators
//! associate left, `NOT` nests to the right (`NOT NOT a` is `a`).
//!
//! `NOT` is the one exception to left-to-right popping among equal
//! precedence: a plain `>=` rule would pop the first `NOT` before its operand
//! exists and reject `NOT NOT a` as malformed. `AND` and `OR` keep the `>=`
//! rule.
//!
//! The compiler is deliberately lenient: operands that normalize to nothing
//! are dropped without adjusting the operators around them, a stray `)` is
//! ignored and an unclosed `(` is closed at the end. Whatever arity problems
//! that leaves are reported when the program runs.

use crate::utils::{normalize, tokenize};
use std::fmt;

/// Boolean operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    And,
    Or,
    Not,
}

impl Operator {
    pub fn precedence(self) -> u8 {
        match self {
            Operator::Not => 3,
            Operator::And => 2,
            Operator::Or => 1,
        }
    }

    /// Number of operands consumed
    pub fn arity(self) -> usize {
        match self {
            Operator::Not => 1,
            Operator::And | Operator::Or => 2,
        }
    }

    fn from_keyword(word: &str) -> Option<Self> {
        if word.eq_ignore_ascii_case("and") {
            Some(Operator::And)
        } else if word.eq_ignore_ascii_case("or") {
            Some(Operator::Or)
        } else if word.eq_ignore_ascii_case("not") {
            Some(Operator::Not)
        } else {
            None
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Not => "NOT",
        })
    }
}

/// Lexical token of an infix query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryToken {
    Term(String),
    Op(Operator),
    LParen,
    RParen,
}

/// One step of a compiled program
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Push the posting list of a normalized term
    Term(String),
    Apply(Operator),
}

/// Postfix form of a query, ready for stack evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub instructions: Vec<Instruction>,
}

impl Program {
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Normalized terms referenced by the program
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.instructions.iter().filter_map(|i| match i {
            Instruction::Term(t) => Some(t.as_str()),
            Instruction::Apply(_) => None,
        })
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, instruction) in self.instructions.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match instruction {
                Instruction::Term(t) => f.write_str(t)?,
                Instruction::Apply(op) => write!(f, "{op}")?,
            }
        }
        Ok(())
    }
}

#[inline]
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '\''
}

/// Split a query into tokens. Words run over alphanumerics, `-` and `'`;
/// anything else that is not a parenthesis separates words and is discarded.
pub fn tokenize_query(input: &str) -> Vec<QueryToken> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        match c {
            '(' => tokens.push(QueryToken::LParen),
            ')' => tokens.push(QueryToken::RParen),
            c if is_word_char(c) => {
                let mut end = start + c.len_utf8();
                while let Some(&(i, next)) = chars.peek() {
                    if !is_word_char(next) {
                        break;
                    }
                    end = i + next.len_utf8();
                    chars.next();
                }
                let word = &input[start..end];

                if let Some(op) = Operator::from_keyword(word) {
                    tokens.push(QueryToken::Op(op));
                } else if let Some(term) = normalize_word(word) {
                    tokens.push(QueryToken::Term(term));
                }
            }
            _ => {}
        }
    }

    tokens
}

/// Reduce a query word exactly as index-time text is reduced
fn normalize_word(word: &str) -> Option<String> {
    tokenize(word).next().and_then(|token| normalize(&token))
}

/// Shunting-yard conversion of infix tokens to postfix
pub fn to_postfix(tokens: Vec<QueryToken>) -> Program {
    let mut output = Vec::with_capacity(tokens.len());
    let mut stack: Vec<QueryToken> = Vec::new();

    for token in tokens {
        match token {
            QueryToken::Term(term) => output.push(Instruction::Term(term)),
            QueryToken::Op(op) => {
                while let Some(&QueryToken::Op(top)) = stack.last() {
                    let pops = if op == Operator::Not {
                        top.precedence() > op.precedence()
                    } else {
                        top.precedence() >= op.precedence()
                    };
                    if !pops {
                        break;
                    }
                    output.push(Instruction::Apply(top));
                    stack.pop();
                }
                stack.push(QueryToken::Op(op));
            }
            QueryToken::LParen => stack.push(QueryToken::LParen),
            QueryToken::RParen => {
                // Pops to the matching '(' or, if there is none, empties the stack
                while let Some(top) = stack.pop() {
                    match top {
                        QueryToken::Op(op) => output.push(Instruction::Apply(op)),
                        _ => break,
                    }
                }
            }
        }
    }

    while let Some(top) = stack.pop() {
        if let QueryToken::Op(op) = top {
            output.push(Instruction::Apply(op));
        }
    }

    Program {
        instructions: output,
    }
}

/// Compile a query string into a postfix program
pub fn compile(query: &str) -> Program {
    to_postfix(tokenize_query(query))
}
