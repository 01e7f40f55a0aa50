use std::{
    fs,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::style::Stylize;
use numscript::config::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_NESTED, DEFAULT_MAX_VARIABLES};
use numscript::{Error, Limits, Session};

/// Evaluate numscript expressions from a file, the command line or a prompt.
#[derive(Parser, Debug)]
#[command(name = "numscript", version)]
struct Args {
    /// Script file; every non-blank line is evaluated in turn
    script: Option<PathBuf>,

    /// Evaluate the whole script file as one expression
    #[arg(long, requires = "script")]
    whole: bool,

    /// Evaluate a single inline script
    #[arg(short = 'e', long = "eval", conflicts_with = "script")]
    eval: Option<String>,

    /// User variables allowed besides TRUE and FALSE
    #[arg(long, default_value_t = DEFAULT_MAX_VARIABLES)]
    max_variables: usize,

    /// IF or WHILE occurrences per script that are rejected
    #[arg(long, default_value_t = DEFAULT_MAX_NESTED)]
    max_nested: usize,

    /// Deepest nesting the parser and evaluator accept
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let session = Session::with_limits(Limits {
        max_variables: args.max_variables,
        max_nested: args.max_nested,
        max_depth: args.max_depth,
        ..Limits::default()
    });

    let outcome = match (&args.eval, &args.script) {
        (Some(code), _) => Ok(run_line(&session, code)),
        (None, Some(path)) => run_script(&session, path, args.whole),
        (None, None) => run_repl(&session),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{}", format!("{e:#}").red());
            ExitCode::FAILURE
        }
    }
}

// Returns false when the line produced a diagnostic.
fn run_line(session: &Session, line: &str) -> bool {
    match session.evaluate(line) {
        Ok(Some(value)) => {
            println!("{}", value.number);
            true
        }
        Ok(None) => true,
        Err(err) => {
            report(&err);
            false
        }
    }
}

fn run_script(session: &Session, path: &Path, whole: bool) -> Result<bool> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("could not read script {}", path.display()))?;

    let mut clean = true;
    for unit in script_units(&source, whole) {
        clean &= run_line(session, unit);
    }
    Ok(clean)
}

// The pieces of a script file that are evaluated one after another.
fn script_units(source: &str, whole: bool) -> Vec<&str> {
    if whole {
        return vec![source];
    }
    source
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect()
}

fn run_repl(session: &Session) -> Result<bool> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{}", "numscript> ".bold());
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line.context("could not read from stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        run_line(session, &line);
    }
    Ok(true)
}

fn report(err: &Error) {
    eprintln!("{}", err.render().red());
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = "VAR x = 1\n  + 2\n\nx * 2\n";

    #[test]
    fn lines_are_separate_units() {
        assert_eq!(script_units(SCRIPT, false), ["VAR x = 1", "  + 2", "x * 2"]);
    }

    #[test]
    fn whole_file_is_one_unit() {
        let units = script_units("VAR x = 3\n  * 2\n", true);
        assert_eq!(units, ["VAR x = 3\n  * 2\n"]);

        let session = Session::new();
        let value = session.evaluate(units[0]).unwrap().unwrap();
        assert_eq!(value.number, numscript::Number::Int(6));
    }

    #[test]
    fn split_expression_fails_line_by_line() {
        let session = Session::new();
        let units = script_units("VAR x = 3\n  * 2\n", false);
        assert!(session.evaluate(units[0]).is_ok());
        assert!(session.evaluate(units[1]).is_err());
    }
}
