use crate::{Error, EvalError, LexError, ParseError, Span};
use ariadne::{Label, Report, ReportKind, Source};
use std::io;
use std::ops::Range;

const SOURCE_ID: &str = "input";

type SourceSpan = (&'static str, Range<usize>);
pub type ErrorReport = Report<'static, SourceSpan>;

fn at(span: Span) -> SourceSpan {
    (SOURCE_ID, span.to_range())
}

fn print(report: ErrorReport, input: &str) -> io::Result<()> {
    report.eprint((SOURCE_ID, Source::from(input)))
}

impl LexError {
    pub fn report(&self) -> ErrorReport {
        Report::build(ReportKind::Error, at(self.span))
            .with_message("Lexer Error")
            .with_label(Label::new(at(self.span)).with_message(self.kind.to_string()))
            .with_note("expressions may only contain digits, spaces, parentheses and + - * /")
            .finish()
    }

    pub fn pretty_print(&self, input: &str) -> io::Result<()> {
        print(self.report(), input)
    }
}

impl ParseError {
    pub fn report(&self, input: &str) -> ErrorReport {
        // Errors without a span of their own point at the end of the line
        let span = self
            .span()
            .unwrap_or(Span::new(input.len(), input.len()));
        let builder = Report::build(ReportKind::Error, at(span));
        match self {
            ParseError::UnexpectedToken { found, expected } => builder
                .with_message(format!("Unexpected token: {}", found.kind))
                .with_label(Label::new(at(span)).with_message(format!("Expected {expected}"))),
            ParseError::UnclosedParen { .. } => builder
                .with_message("Unmatched '('")
                .with_label(
                    Label::new(at(span)).with_message("This parenthesis is never closed"),
                ),
            ParseError::UnexpectedEof => builder
                .with_message("Unexpected EOF")
                .with_label(Label::new(at(span)).with_message(self.to_string())),
            ParseError::TooDeep { limit, .. } => builder
                .with_message("Expression nested too deeply")
                .with_label(
                    Label::new(at(span))
                        .with_message(format!("This level is deeper than the limit of {limit}")),
                ),
            ParseError::Lexer(lex_err) => return lex_err.report(),
        }
        .finish()
    }

    pub fn pretty_print(&self, input: &str) -> io::Result<()> {
        print(self.report(input), input)
    }
}

impl EvalError {
    pub fn report(&self) -> ErrorReport {
        let span = self.span();
        let builder = Report::build(ReportKind::Error, at(span));
        match self {
            EvalError::DivideByZero { .. } => builder
                .with_message("Division by zero")
                .with_label(Label::new(at(span)).with_message("This divisor evaluates to 0")),
            EvalError::ArityMismatch {
                operator, found, ..
            } => builder
                .with_message(format!("Wrong number of operands for '{operator}'"))
                .with_label(Label::new(at(span)).with_message(format!(
                    "Expected at least 2 operands, found {found}"
                ))),
            EvalError::TypeMismatch {
                expected, found, ..
            } => builder
                .with_message("Type mismatch")
                .with_label(
                    Label::new(at(span)).with_message(format!("Expected {expected}, found {found}")),
                ),
            EvalError::Overflow { operator, .. } => builder
                .with_message(format!("Integer overflow in '{operator}'"))
                .with_label(
                    Label::new(at(span)).with_message("The result does not fit in 64 bits"),
                ),
        }
        .finish()
    }

    pub fn pretty_print(&self, input: &str) -> io::Result<()> {
        print(self.report(), input)
    }
}

impl Error {
    pub fn report(&self, input: &str) -> ErrorReport {
        match self {
            Error::Lex(err) => err.report(),
            Error::Parse(err) => err.report(input),
            Error::Eval(err) => err.report(),
        }
    }

    pub fn pretty_print(&self, input: &str) -> io::Result<()> {
        print(self.report(input), input)
    }
}
