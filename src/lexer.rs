use logos::Logos;
use std::fmt;
use thiserror::Error;

use crate::Span;
use crate::types::Operator;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r" +")] // Only ASCII spaces separate tokens
#[logos(error = LexErrorKind)]
pub enum TokenKind {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("+", |_| Operator::Add)]
    #[token("-", |_| Operator::Sub)]
    #[token("*", |_| Operator::Mul)]
    #[token("/", |_| Operator::Div)]
    Operator(Operator),
    #[regex(r"[0-9]+", |lex| {
        let slice = lex.slice();
        slice
            .parse::<i64>()
            .map_err(|_| LexErrorKind::NumberOutOfRange(slice.to_string()))
    })]
    Number(i64),
    // Never produced by logos; `tokenize` appends it once the input is exhausted.
    EndOfInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Token { kind, span }
    }

    /// Integer payload of a `Number` token.
    pub fn value(&self) -> Option<i64> {
        match self.kind {
            TokenKind::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Literal text of an operator or parenthesis token.
    pub fn text(&self) -> Option<&'static str> {
        match self.kind {
            TokenKind::LParen => Some("("),
            TokenKind::RParen => Some(")"),
            TokenKind::Operator(op) => Some(op.symbol()),
            TokenKind::Number(_) | TokenKind::EndOfInput => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::Operator(op) => write!(f, "{}", op),
            TokenKind::Number(n) => write!(f, "{}", n),
            TokenKind::EndOfInput => write!(f, "end of input"),
        }
    }
}

#[derive(Error, Default, Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    #[error("invalid character '{0}'")]
    InvalidCharacter(char),
    #[error("number '{0}' does not fit in a 64-bit integer")]
    NumberOutOfRange(String),
    // What logos reports before `tokenize` pins down the offending character
    #[default]
    #[error("invalid token")]
    InvalidToken,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

pub type LexResult<T> = Result<T, LexError>;

/// Splits a line into tokens, always ending with a single `EndOfInput`.
pub fn tokenize(input: &str) -> LexResult<Vec<Token>> {
    let mut tokens = TokenKind::lexer(input)
        .spanned()
        .map(|(result, range)| match result {
            Ok(kind) => Ok(Token::new(kind, range.into())),
            Err(LexErrorKind::InvalidToken) => Err(invalid_character(input, range.start)),
            Err(kind) => Err(LexError {
                kind,
                span: range.into(),
            }),
        })
        .collect::<LexResult<Vec<Token>>>()?;

    let end = input.len();
    tokens.push(Token::new(TokenKind::EndOfInput, Span::new(end, end)));
    Ok(tokens)
}

fn invalid_character(input: &str, start: usize) -> LexError {
    match input[start..].chars().next() {
        Some(c) => LexError {
            kind: LexErrorKind::InvalidCharacter(c),
            span: Span::new(start, start + c.len_utf8()),
        },
        None => LexError {
            kind: LexErrorKind::InvalidToken,
            span: Span::new(start, start),
        },
    }
}
