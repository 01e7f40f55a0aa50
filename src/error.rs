use std::fmt::{self, Write};

use thiserror::Error;

use super::position::Span;

#[macro_export]
macro_rules! syntax_error {
    ($span:expr, $($arg:tt)*) => {
        Err($crate::error::Error::new(
            $crate::error::ErrorKind::Syntax,
            $span,
            format!($($arg)*),
        ))
    };
}

#[macro_export]
macro_rules! runtime_error {
    ($kind:ident, $span:expr, $scope:expr, $($arg:tt)*) => {{
        let span: $crate::position::Span = $span;
        let frames = $crate::interpreter::Scope::traceback($scope, &span);
        Err($crate::error::Error::new(
            $crate::error::ErrorKind::$kind,
            span,
            format!($($arg)*),
        )
        .with_traceback(frames))
    }};
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    IllegalCharacter,
    ExpectedCharacter,
    TooManyNested,
    Syntax,
    Runtime,
    TooManyVariables,
    StackOverFlow,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::IllegalCharacter => "IllegalCharacter",
            Self::ExpectedCharacter => "ExpectedCharacter",
            Self::TooManyNested => "TooManyNestedError",
            Self::Syntax => "SyntaxError",
            Self::Runtime => "RuntimeError",
            Self::TooManyVariables => "TooManyVariablesError",
            Self::StackOverFlow => "StackOverFlowError",
        };
        f.write_str(name)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// One scope on the way from the failing context out to the root.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub name: String,
    pub line: usize,
}

/// A located diagnostic from any stage of the pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}: {details}")]
pub struct Error {
    pub kind: ErrorKind,
    pub span: Span,
    pub details: String,
    /// Root first. Only errors raised while evaluating carry one.
    pub traceback: Option<Vec<Frame>>,
}

impl Error {
    pub fn new(kind: ErrorKind, span: Span, details: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            details: details.into(),
            traceback: None,
        }
    }

    pub fn with_traceback(mut self, frames: Vec<Frame>) -> Self {
        self.traceback = Some(frames);
        self
    }

    /// Full diagnostic: traceback (if any), headline, line number and the
    /// offending source underlined with carets.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(frames) = &self.traceback {
            out.push_str("Traceback (most recent call last):\n");
            for frame in frames {
                let _ = writeln!(out, "  Line {}, in {}", frame.line + 1, frame.name);
            }
        }
        let _ = writeln!(out, "{}: {}", self.kind, self.details);
        let _ = writeln!(out, "Line {}\n", self.span.start.line + 1);
        out.push_str(&point_to(&self.span));
        out
    }
}

fn point_to(span: &Span) -> String {
    let lines: Vec<&str> = span.start.source().split('\n').collect();
    let first = span.start.line;
    let last = span.end.line.max(first);

    let mut rows = Vec::with_capacity(last - first + 1);
    for line_no in first..=last {
        let line = lines
            .get(line_no)
            .copied()
            .unwrap_or("")
            .trim_end_matches('\r');
        let start_col = if line_no == first { span.start.column } else { 0 };
        let end_col = if line_no == last {
            span.end.column
        } else {
            line.chars().count()
        };
        let width = end_col.saturating_sub(start_col).max(1);
        rows.push(format!(
            "{}\n{}{}",
            line.replace('\t', ""),
            " ".repeat(start_col),
            "^".repeat(width)
        ));
    }
    rows.join("\n")
}
