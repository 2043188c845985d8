use std::borrow::Cow;
use std::path::PathBuf;

use clap::Parser;
use clap::builder::RangedU64ValueParser;
use log::{debug, warn};
use prefix_calc::parser::{DEFAULT_MAX_DEPTH, MAX_DEPTH_LIMIT};
use prefix_calc::{Error, Options, Value, dump_tree, evaluate, read_line_with};
use rustyline::error::ReadlineError;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Cmd, Completer, Editor, EventHandler, KeyCode, KeyEvent, Modifiers};
use rustyline::{Helper, Highlighter, Hinter, Validator};

/// Interactive prefix arithmetic calculator.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Use vi key bindings instead of emacs.
    #[arg(long)]
    vi: bool,

    /// Where line history is loaded from and saved to.
    #[arg(long, default_value = "prefix_calc_history.txt")]
    history: PathBuf,

    /// Print the parsed tree before each result. Toggle at the prompt with `:tree`.
    #[arg(short, long)]
    dump_tree: bool,

    /// Deepest parenthesis nesting accepted.
    #[arg(
        long,
        default_value_t = DEFAULT_MAX_DEPTH,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..=MAX_DEPTH_LIMIT as u64)
    )]
    max_depth: usize,
}

#[derive(Completer, Helper, Highlighter, Hinter, Validator)]
struct ReplHelper {
    #[rustyline(Validator)]
    validator: ParenValidator,
    #[rustyline(Highlighter)]
    highlighter: ParenHighlighter,
}

#[derive(Debug, PartialEq, Eq)]
enum ParenBalance {
    Balanced,
    Open,
    /// Byte offset of a `)` with nothing to close.
    Unmatched(usize),
}

fn paren_balance(input: &str) -> ParenBalance {
    let mut depth = 0usize;
    for (i, c) in input.char_indices() {
        match c {
            '(' => depth += 1,
            ')' if depth == 0 => return ParenBalance::Unmatched(i),
            ')' => depth -= 1,
            _ => {}
        }
    }

    if depth > 0 {
        ParenBalance::Open
    } else {
        ParenBalance::Balanced
    }
}

/// Keeps reading lines while parentheses are open; rejects a `)` with nothing to close.
struct ParenValidator;

impl Validator for ParenValidator {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        Ok(match paren_balance(ctx.input()) {
            ParenBalance::Balanced => ValidationResult::Valid(None),
            ParenBalance::Open => ValidationResult::Incomplete,
            ParenBalance::Unmatched(i) => ValidationResult::Invalid(Some(format!(
                "  - Unmatched ')' at position {}",
                i
            ))),
        })
    }
}

/// Highlights the pair of parentheses under the cursor and any unmatched `)`.
struct ParenHighlighter;

impl Highlighter for ParenHighlighter {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        let cursor = pos.checked_sub(1);
        // (byte offset in `line`, byte offset in `highlighted`) of each open paren
        let mut stack: Vec<(usize, usize)> = Vec::new();
        let mut highlighted = String::with_capacity(line.len());

        for (i, c) in line.char_indices() {
            match c {
                '(' => {
                    stack.push((i, highlighted.len()));
                    highlighted.push(c);
                }
                ')' => match stack.pop() {
                    Some((open, at)) if cursor == Some(open) || cursor == Some(i) => {
                        // Blue for the matching pair
                        highlighted.replace_range(at..at + 1, "\x1b[1;34m(\x1b[0m");
                        highlighted.push_str("\x1b[1;34m)\x1b[0m");
                    }
                    Some(_) => highlighted.push(c),
                    None => highlighted.push_str("\x1b[31m)\x1b[0m"), // Red for unmatched
                },
                _ => highlighted.push(c),
            }
        }

        Cow::Owned(highlighted)
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

// Continuation lines are joined with spaces, the only separator the lexer accepts.
fn join_lines(input: &str) -> String {
    input.replace(['\n', '\r'], " ").trim_matches(' ').to_string()
}

fn eval_input(input: &str, options: Options, show_tree: bool) -> Result<Value, Error> {
    let tree = read_line_with(input, options)?;
    if show_tree {
        print!("{}", dump_tree(&tree));
    }
    evaluate(&tree).map_err(Into::into)
}

fn main() -> rustyline::Result<()> {
    env_logger::init();
    let args = Args::parse();

    println!("prefix-calc REPL v{}", env!("CARGO_PKG_VERSION"));
    println!("Type 'exit' or press Ctrl-D to quit, ':tree' to toggle tree output.");

    let options = Options {
        max_depth: args.max_depth,
    };
    let mut show_tree = args.dump_tree;

    let helper = ReplHelper {
        validator: ParenValidator,
        highlighter: ParenHighlighter,
    };
    let config = rustyline::config::Config::builder()
        .edit_mode(if args.vi {
            rustyline::EditMode::Vi
        } else {
            rustyline::EditMode::Emacs
        })
        .build();
    let mut rl = Editor::with_config(config)?;
    rl.set_helper(Some(helper));
    rl.bind_sequence(
        KeyEvent(KeyCode::Char('s'), Modifiers::CTRL),
        EventHandler::Simple(Cmd::Newline),
    );
    if rl.load_history(&args.history).is_err() {
        debug!("no previous history at {}", args.history.display());
    }

    loop {
        match rl.readline("prefix> ") {
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;
                let input = join_lines(&line);
                if input.is_empty() {
                    continue;
                }
                if input.eq_ignore_ascii_case("exit") {
                    break;
                }
                if input == ":tree" {
                    show_tree = !show_tree;
                    println!("tree output {}", if show_tree { "on" } else { "off" });
                    continue;
                }

                match eval_input(&input, options, show_tree) {
                    Ok(value) => println!("{}", value),
                    Err(err) => {
                        if err.pretty_print(&input).is_err() {
                            eprintln!("{}", err);
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C
                println!("Interrupted. Type 'exit' or Ctrl-D to quit.");
            }
            Err(ReadlineError::Eof) => {
                // Ctrl-D
                println!("\nExiting.");
                break;
            }
            Err(err) => {
                eprintln!("Readline Error: {:?}", err);
                break;
            }
        }
    }

    if let Err(err) = rl.save_history(&args.history) {
        warn!("could not save history to {}: {}", args.history.display(), err);
    }
    Ok(())
}
