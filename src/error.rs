use crate::{EvalError, LexError, ParseError};
use thiserror::Error;

/// Any failure of the lex, parse, evaluate pipeline for one line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Lexer Error: {0}")]
    Lex(#[from] LexError),
    #[error("Parse Error: {0}")]
    Parse(#[from] ParseError),
    #[error("Evaluation Error: {0}")]
    Eval(#[from] EvalError),
}
