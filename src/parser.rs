use crate::Span;
use crate::lexer::{LexError, Token, TokenKind};
use crate::types::{Expr, Node};
use log::trace;
use std::vec::IntoIter; // To iterate over Vec<Token>
use thiserror::Error;

/// Nesting limit used by `Parser::new`. Bounds the recursion of both parser and evaluator.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Largest nesting limit the command-line drivers accept.
pub const MAX_DEPTH_LIMIT: usize = 1024;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected '{}' at {}, expected {expected}", .found.kind, .found.span)]
    UnexpectedToken { found: Token, expected: String },
    #[error("unmatched '(' at {open}")]
    UnclosedParen { open: Span },
    #[error("token stream ended without an end-of-input marker")]
    UnexpectedEof,
    #[error("expression nested deeper than {limit} levels")]
    TooDeep { limit: usize, span: Span },
    #[error(transparent)]
    Lexer(#[from] LexError),
}

impl ParseError {
    /// Span of the source text the error points at, if it has one.
    pub fn span(&self) -> Option<Span> {
        match self {
            ParseError::UnexpectedToken { found, .. } => Some(found.span),
            ParseError::UnclosedParen { open } => Some(*open),
            ParseError::TooDeep { span, .. } => Some(*span),
            ParseError::Lexer(lex_err) => Some(lex_err.span),
            ParseError::UnexpectedEof => None,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

pub struct Parser {
    // Owned tokens, consumed front to back.
    tokens: IntoIter<Token>,
    max_depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens: tokens.into_iter(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn next_token(&mut self) -> ParseResult<Token> {
        self.tokens.next().ok_or(ParseError::UnexpectedEof)
    }

    /// Parses a whole line: the top-level atom sequence up to `EndOfInput`.
    pub fn parse(mut self) -> ParseResult<Node> {
        let (atoms, eof) = self.parse_atoms(0, None)?;

        if let Some(found) = self.tokens.next() {
            return Err(ParseError::UnexpectedToken {
                found,
                expected: "nothing after end of input".to_string(),
            });
        }

        Ok(build_level(atoms, Span::new(0, eof.end)))
    }

    /// Reads sibling atoms until the token that closes this level: the `)` matching `open`,
    /// or `EndOfInput` at the top level. Returns the atoms and the closing token's span.
    fn parse_atoms(&mut self, depth: usize, open: Option<Span>) -> ParseResult<(Vec<Node>, Span)> {
        let mut atoms = Vec::new();
        loop {
            let token = self.next_token()?;
            match (token.kind, open) {
                (TokenKind::RParen, Some(_)) | (TokenKind::EndOfInput, None) => {
                    return Ok((atoms, token.span));
                }
                (TokenKind::EndOfInput, Some(open)) => {
                    return Err(ParseError::UnclosedParen { open });
                }
                (TokenKind::RParen, None) => {
                    return Err(ParseError::UnexpectedToken {
                        found: token,
                        expected: "an atom or end of input".to_string(),
                    });
                }
                (TokenKind::Number(n), _) => atoms.push(Node::new_number(n, token.span)),
                (TokenKind::Operator(op), _) => atoms.push(Node::new_operator(op, token.span)),
                (TokenKind::LParen, _) => atoms.push(self.parse_nested(token.span, depth + 1)?),
            }
        }
    }

    /// Parses the contents of a parenthesised level whose `(` has already been consumed.
    fn parse_nested(&mut self, open: Span, depth: usize) -> ParseResult<Node> {
        if depth > self.max_depth {
            return Err(ParseError::TooDeep {
                limit: self.max_depth,
                span: open,
            });
        }

        let (atoms, close) = self.parse_atoms(depth, Some(open))?;
        let span = open.merge(close);
        trace!("parsed level {} with {} atoms at {}", depth, atoms.len(), span);

        if atoms.is_empty() {
            Ok(Node::new_empty(span))
        } else {
            Ok(build_level(atoms, span))
        }
    }
}

// A level headed by an operator is an application of it to the remaining atoms.
fn build_level(mut atoms: Vec<Node>, span: Span) -> Node {
    match atoms.first().map(|atom| &atom.kind) {
        Some(&Expr::Operator(op)) => {
            let operands = atoms.split_off(1);
            Node::new_apply(op, operands, span)
        }
        _ => Node::new_sequence(atoms, span),
    }
}

/// Turns a token sequence into an expression tree.
pub fn parse(tokens: Vec<Token>) -> ParseResult<Node> {
    Parser::new(tokens).parse()
}

// Helper function to lex and parse a string directly (useful for tests and REPL)
pub fn parse_str(input: &str) -> ParseResult<Node> {
    let tokens = crate::lexer::tokenize(input)?;
    parse(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::LexErrorKind;
    use crate::types::Operator;

    fn assert_parse(input: &str, expected: Node) {
        match parse_str(input) {
            Ok(result) => assert_eq!(result, expected, "Input: '{}'", input),
            Err(e) => panic!("Parsing failed for input '{}': {}", input, e),
        }
    }

    fn assert_parse_error(input: &str, expected: ParseError) {
        match parse_str(input) {
            Ok(result) => panic!(
                "Expected parsing to fail for input '{}', but got: {:?}",
                input, result
            ),
            Err(e) => assert_eq!(e, expected, "Input: '{}'", input),
        }
    }

    // Parses and renders back, for shape checks that don't care about spans.
    fn assert_parsed_string(input: &str, expected_output: &str) {
        let node = match parse_str(input) {
            Ok(result) => result,
            Err(e) => panic!("Parsing failed for input '{}': {}", input, e),
        };
        assert_eq!(node.to_string(), expected_output, "Input: '{}'", input);
    }

    fn node_number(n: i64, start: usize, end: usize) -> Node {
        Node::new_number(n, Span::new(start, end))
    }

    fn node_operator(op: Operator, start: usize) -> Node {
        Node::new_operator(op, Span::new(start, start + 1))
    }

    fn node_apply(op: Operator, operands: Vec<Node>, start: usize, end: usize) -> Node {
        Node::new_apply(op, operands, Span::new(start, end))
    }

    fn node_sequence(atoms: Vec<Node>, start: usize, end: usize) -> Node {
        Node::new_sequence(atoms, Span::new(start, end))
    }

    fn node_empty(start: usize, end: usize) -> Node {
        Node::new_empty(Span::new(start, end))
    }

    #[test]
    fn test_parse_empty_input() {
        assert_parse("", node_sequence(vec![], 0, 0));
        assert_parse("   ", node_sequence(vec![], 0, 3));
    }

    #[test]
    fn test_parse_single_number() {
        assert_parse("42", node_sequence(vec![node_number(42, 0, 2)], 0, 2));
    }

    #[test]
    fn test_parse_empty_parens() {
        assert_parse("()", node_sequence(vec![node_empty(0, 2)], 0, 2));
        assert_parse("( )", node_sequence(vec![node_empty(0, 3)], 0, 3));
    }

    #[test]
    fn test_parse_simple_application() {
        assert_parse(
            "(+ 10 20)",
            node_sequence(
                vec![node_apply(
                    Operator::Add,
                    vec![node_number(10, 3, 5), node_number(20, 6, 8)],
                    0,
                    9,
                )],
                0,
                9,
            ),
        );
    }

    #[test]
    fn test_parse_nested_application() {
        assert_parse(
            "(* (+ 1 2) 4)",
            node_sequence(
                vec![node_apply(
                    Operator::Mul,
                    vec![
                        node_apply(
                            Operator::Add,
                            vec![node_number(1, 6, 7), node_number(2, 8, 9)],
                            3,
                            10,
                        ),
                        node_number(4, 11, 12),
                    ],
                    0,
                    13,
                )],
                0,
                13,
            ),
        );
    }

    #[test]
    fn test_parse_is_lenient_about_arity() {
        assert_parse(
            "(-)",
            node_sequence(vec![node_apply(Operator::Sub, vec![], 0, 3)], 0, 3),
        );
        assert_parsed_string("(/ 1)", "((/ 1))");
    }

    #[test]
    fn test_parse_bare_operator_outside_head() {
        assert_parse(
            "(1 + 2)",
            node_sequence(
                vec![node_sequence(
                    vec![
                        node_number(1, 1, 2),
                        node_operator(Operator::Add, 3),
                        node_number(2, 5, 6),
                    ],
                    0,
                    7,
                )],
                0,
                7,
            ),
        );
    }

    #[test]
    fn test_parse_top_level_operator_head() {
        assert_parse(
            "+ 1 2",
            node_apply(
                Operator::Add,
                vec![node_number(1, 2, 3), node_number(2, 4, 5)],
                0,
                5,
            ),
        );
    }

    #[test]
    fn test_parse_shapes() {
        assert_parsed_string("(+ 1 2 3)", "((+ 1 2 3))");
        assert_parsed_string("(+ 1 (/ 8 2 ) 5)", "((+ 1 (/ 8 2) 5))");
        assert_parsed_string("(+ () 1)", "((+ () 1))");
        assert_parsed_string("(()())", "((() ()))");
        assert_parsed_string("1 2 3", "(1 2 3)");
        assert_parsed_string("((((7))))", "(((((7)))))");
    }

    #[test]
    fn test_parse_is_repeatable() {
        let input = "(* (+ 1 2 3) 4 5)";
        assert_eq!(parse_str(input), parse_str(input));
    }

    #[test]
    fn test_error_unclosed_paren() {
        assert_parse_error(
            "(+ 1",
            ParseError::UnclosedParen {
                open: Span::new(0, 1),
            },
        );
        // The innermost open paren is the one reported
        assert_parse_error(
            "(+ 1 (- 2",
            ParseError::UnclosedParen {
                open: Span::new(5, 6),
            },
        );
        assert_parse_error(
            "(",
            ParseError::UnclosedParen {
                open: Span::new(0, 1),
            },
        );
    }

    #[test]
    fn test_error_stray_close_paren() {
        assert_parse_error(
            "(+ 1 2))",
            ParseError::UnexpectedToken {
                found: Token::new(TokenKind::RParen, Span::new(7, 8)),
                expected: "an atom or end of input".to_string(),
            },
        );
        assert!(matches!(
            parse_str(")"),
            Err(ParseError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_error_lexer_error_is_wrapped() {
        match parse_str("(+ 1 x)") {
            Err(ParseError::Lexer(err)) => {
                assert_eq!(err.kind, LexErrorKind::InvalidCharacter('x'));
                assert_eq!(err.span, Span::new(5, 6));
            }
            other => panic!("Expected a lexer error, got: {:?}", other),
        }
    }

    #[test]
    fn test_error_missing_end_of_input() {
        let tokens = vec![Token::new(TokenKind::Number(1), Span::new(0, 1))];
        assert_eq!(parse(tokens), Err(ParseError::UnexpectedEof));
    }

    #[test]
    fn test_error_tokens_after_end_of_input() {
        let tokens = vec![
            Token::new(TokenKind::EndOfInput, Span::new(0, 0)),
            Token::new(TokenKind::Number(1), Span::new(0, 1)),
        ];
        assert!(matches!(
            parse(tokens),
            Err(ParseError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_depth_limit() {
        let tokens = crate::lexer::tokenize("(((1)))").expect("Should tokenize successfully");
        assert!(Parser::new(tokens.clone()).with_max_depth(3).parse().is_ok());
        assert_eq!(
            Parser::new(tokens).with_max_depth(2).parse(),
            Err(ParseError::TooDeep {
                limit: 2,
                span: Span::new(2, 3),
            })
        );

        let levels = DEFAULT_MAX_DEPTH + 1;
        let deep = format!("{}1{}", "(".repeat(levels), ")".repeat(levels));
        assert!(matches!(parse_str(&deep), Err(ParseError::TooDeep { .. })));
    }

    #[test]
    fn test_error_spans() {
        let err = parse_str("(+ 1").expect_err("Should fail");
        assert_eq!(err.span(), Some(Span::new(0, 1)));
        assert_eq!(ParseError::UnexpectedEof.span(), None);
    }
}
