// Declare modules publicly so they are part of the library interface
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod pipeline;
pub mod pretty_print;
pub mod source;
pub mod types;

pub use error::Error;
pub use evaluator::{EvalError, EvalResult, evaluate};
pub use lexer::{LexError, LexErrorKind, Token, TokenKind, tokenize};
pub use parser::{ParseError, Parser, parse, parse_str};
pub use pipeline::{Options, read_line_with, run_line, run_line_with};
pub use source::Span;
pub use types::{Expr, Node, Operator, Value, dump_tree};
