use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap::builder::RangedU64ValueParser;
use log::{error, info};
use prefix_calc::parser::{DEFAULT_MAX_DEPTH, MAX_DEPTH_LIMIT};
use prefix_calc::{Options, dump_tree, evaluate, read_line_with};

/// Evaluates fully-parenthesized prefix arithmetic such as `(* (+ 1 2) 4)`, one expression
/// per line.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Read expressions from this file instead of the command line.
    #[arg(short, long, conflicts_with = "expressions")]
    file: Option<PathBuf>,

    /// Print the parsed tree of each expression to stderr before evaluating it.
    #[arg(short, long)]
    dump_tree: bool,

    /// Deepest parenthesis nesting accepted.
    #[arg(
        long,
        default_value_t = DEFAULT_MAX_DEPTH,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..=MAX_DEPTH_LIMIT as u64)
    )]
    max_depth: usize,

    /// Expressions to evaluate. Without these or --file, lines are read from stdin.
    expressions: Vec<String>,
}

struct Batch {
    options: Options,
    dump_tree: bool,
    failures: usize,
}

impl Batch {
    fn run(&mut self, line: &str) {
        // Only the separators the lexer itself skips; a tab is still a lexer error
        let line = line.trim_end_matches('\r').trim_matches(' ');
        if line.is_empty() {
            return;
        }

        let result = read_line_with(line, self.options).and_then(|tree| {
            if self.dump_tree {
                eprint!("{}", dump_tree(&tree));
            }
            evaluate(&tree).map_err(Into::into)
        });

        match result {
            Ok(value) => println!("{}", value),
            Err(err) => {
                self.failures += 1;
                if let Err(io_err) = err.pretty_print(line) {
                    error!("failed to print diagnostic: {}", io_err);
                    eprintln!("{}", err);
                }
            }
        }
    }

    fn run_lines(&mut self, reader: impl BufRead) -> io::Result<()> {
        for line in reader.lines() {
            self.run(&line?);
        }
        Ok(())
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();
    let mut batch = Batch {
        options: Options {
            max_depth: args.max_depth,
        },
        dump_tree: args.dump_tree,
        failures: 0,
    };

    let read = if let Some(path) = &args.file {
        info!("evaluating lines of {}", path.display());
        File::open(path).and_then(|file| batch.run_lines(BufReader::new(file)))
    } else if args.expressions.is_empty() {
        batch.run_lines(io::stdin().lock())
    } else {
        for expression in &args.expressions {
            batch.run(expression);
        }
        Ok(())
    };

    if let Err(err) = read {
        eprintln!("Failed to read input: {}", err);
        return ExitCode::FAILURE;
    }

    if batch.failures > 0 {
        info!("{} expression(s) failed", batch.failures);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
