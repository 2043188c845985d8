use crate::parser::{DEFAULT_MAX_DEPTH, Parser};
use crate::types::{Node, Value, dump_tree};
use crate::{Error, evaluate, tokenize};
use log::{debug, trace};

/// Knobs for a single run of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Deepest parenthesis nesting the parser accepts.
    pub max_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Lexes and parses one line with the given options.
pub fn read_line_with(input: &str, options: Options) -> Result<Node, Error> {
    let tokens = tokenize(input)?;
    debug!("lexed {} tokens", tokens.len());

    let tree = Parser::new(tokens)
        .with_max_depth(options.max_depth)
        .parse()?;
    debug!("parsed {}", tree);
    trace!("tree:\n{}", dump_tree(&tree));
    Ok(tree)
}

/// Runs tokenize, parse and evaluate over one line. A failure leaves nothing behind that
/// could affect the next line.
pub fn run_line_with(input: &str, options: Options) -> Result<Value, Error> {
    let tree = read_line_with(input, options)?;
    let value = evaluate(&tree)?;
    debug!("{:?} => {}", input, value);
    Ok(value)
}

pub fn run_line(input: &str) -> Result<Value, Error> {
    run_line_with(input, Options::default())
}
