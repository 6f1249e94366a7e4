//! tiger-drv - The interpreter driver.
//!
//! Entry point and orchestrator for one interpreter invocation:
//!
//! ```text
//! Source file (.tig)
//!        |
//!        v
//!   [Lexer]    -> token stream     (tiger-lex)
//!        |
//!        v
//!   [Parser]   -> AST              (tiger-par)
//!        |
//!        v
//!   [Resolver] -> annotated AST    (tiger-sem)
//!        |
//!        v
//!   [Evaluator] -> value + output  (tiger-eval)
//! ```
//!
//! Usage: `tiger <source-file>`. The program's output goes to stdout; the
//! final value, when it is not nil, is printed on stdout afterwards.
//! Diagnostics go to stderr.
//!
//! Exit codes:
//! - 0  - normal completion
//! - 40 - missing or extra command-line argument
//! - 42 - parse failure
//! - 1  - any other error (lexical, scoping, evaluation, i/o)
//!
//! The `DEBUG` environment variable (an integer; non-zero enables) turns on
//! the `ticks=<N>` trace `timeStop()` writes to stderr.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tiger_eval::natives::{root_decls, standard_bindings, NativeCtx};
use tiger_eval::{Interpreter, Value};
use tiger_par::{ParseError, Parser};
use tracing::debug;

/// Normal completion.
pub const EXIT_SUCCESS: i32 = 0;
/// Any error without a more specific code.
pub const EXIT_ERROR: i32 = 1;
/// The source-file argument was missing (or extra arguments were given).
pub const EXIT_USAGE: i32 = 40;
/// The source file failed to parse.
pub const EXIT_PARSE: i32 = 42;

/// One invocation's configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// The Tiger source file to interpret.
    pub input_file: PathBuf,

    /// Whether the DEBUG tick trace is enabled.
    pub debug: bool,
}

impl Config {
    /// Builds a configuration from the command-line arguments (without the
    /// program name). Returns `None` unless exactly one argument was given.
    pub fn from_args(args: &[String]) -> Option<Config> {
        let [input_file] = args else {
            return None;
        };
        Some(Config {
            input_file: PathBuf::from(input_file),
            debug: debug_from_env(),
        })
    }
}

/// Reads the `DEBUG` environment variable as an integer; non-zero enables.
fn debug_from_env() -> bool {
    std::env::var("DEBUG")
        .ok()
        .and_then(|value| value.trim().parse::<i64>().ok())
        .map(|value| value != 0)
        .unwrap_or(false)
}

/// One interpreter invocation.
pub struct Session {
    config: Config,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Runs the pipeline, printing diagnostics to stderr, and returns the
    /// process exit code.
    pub fn run(&self) -> i32 {
        let source = match read_source(&self.config.input_file) {
            Ok(source) => source,
            Err(err) => {
                eprintln!("error: {err:#}");
                return EXIT_ERROR;
            }
        };
        let file_name = self.config.input_file.display().to_string();
        debug!(file = %file_name, bytes = source.len(), "read source");

        let program = match Parser::new(&source, Some(&file_name)).parse() {
            Ok(program) => program,
            Err(ParseError::Lex(err)) => {
                eprintln!("{err}");
                return EXIT_ERROR;
            }
            Err(err) => {
                eprintln!("Parse failure: {err}");
                return EXIT_PARSE;
            }
        };
        debug!("parsed program");

        let bindings = standard_bindings();
        let resolved = match tiger_sem::resolve(&program, &root_decls(&bindings)) {
            Ok(resolved) => resolved,
            Err(err) => {
                eprintln!("error: {err}");
                return EXIT_ERROR;
            }
        };
        debug!(scopes = resolved.scopes, "resolved names");

        let ctx = NativeCtx::new(self.config.debug);
        let mut interp = Interpreter::new(resolved.scopes, ctx);
        match interp.run(&program, &bindings) {
            Ok(value) => {
                debug!("evaluation finished");
                if value != Value::Nil {
                    println!("{value}");
                }
                EXIT_SUCCESS
            }
            Err(err) => {
                eprintln!("error: {err}");
                EXIT_ERROR
            }
        }
    }
}

fn read_source(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("unable to read {}", path.display()))
}

/// The binary's entry point; returns the process exit code.
pub fn main() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(config) = Config::from_args(&args) else {
        eprintln!("Expected one file name argument to be passed, e.g. tiger program.tig");
        return EXIT_USAGE;
    };
    Session::new(config).run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_requires_exactly_one_argument() {
        assert!(Config::from_args(&[]).is_none());
        assert!(Config::from_args(&["a.tig".into(), "b.tig".into()]).is_none());

        let config = Config::from_args(&["queens.tig".into()]).unwrap();
        assert_eq!(config.input_file, PathBuf::from("queens.tig"));
    }
}
