//! # numscript
//!
//! A tree-walking interpreter for a tiny imperative expression language:
//! integer and float arithmetic, comparisons, `AND`/`OR`/`NOT`, `VAR`
//! assignment, `IF/ELIF/ELSE` and `WHILE`.
//!
//! Every call runs source text through the lexer, the parser and the
//! interpreter, and returns either a value (possibly none) or a located
//! [`Error`].

pub mod ast;
pub mod config;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod number;
pub mod position;

pub use config::Limits;
pub use error::{Error, ErrorKind, Result};
pub use interpreter::{Environment, Interpreter, Scope, Value};
pub use number::Number;

use log::trace;

/// Lexes, parses and evaluates `source` against `env`.
pub fn evaluate(source: &str, env: &Environment, limits: &Limits) -> Result<Option<Value>> {
    trace!("Lexing {source:?}");
    let tokens = lexer::Lexer::new(source)
        .max_nested(limits.max_nested)
        .get_tokens()?;
    trace!("Parsing {} tokens", tokens.len());
    let ast = ast::Parser::new(tokens)
        .max_depth(limits.max_depth)
        .parse()?;
    trace!("Interpreting {ast:?}");
    Interpreter::with_limits(*limits).evaluate(&ast, env)
}

/// A root environment plus the limits it runs under. Variables bound by one
/// call are visible to every later call on the same session.
pub struct Session {
    env: Environment,
    limits: Limits,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    pub fn with_limits(limits: Limits) -> Self {
        Self {
            env: Scope::global(),
            limits,
        }
    }

    pub fn evaluate(&self, source: &str) -> Result<Option<Value>> {
        evaluate(source, &self.env, &self.limits)
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }
}
