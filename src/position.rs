use std::fmt;
use std::rc::Rc;

// A cursor into the source text. Every token and node keeps its own copy,
// so a captured position never moves once it has been handed out.
#[derive(Clone, PartialEq)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
    source: Rc<str>,
}

impl Position {
    pub fn start_of(source: Rc<str>) -> Self {
        Self {
            offset: 0,
            line: 0,
            column: 0,
            source,
        }
    }

    /// Moves past `consumed`; a newline starts the next line at column 0.
    pub fn advance(&mut self, consumed: Option<char>) {
        self.offset += 1;
        self.column += 1;
        if consumed == Some('\n') {
            self.line += 1;
            self.column = 0;
        }
    }

    /// A copy of this position moved one character forward.
    pub fn next(&self) -> Self {
        let mut next = self.clone();
        next.advance(None);
        next
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line + 1, self.column)
    }
}

/// Half-open range `[start, end)` over the originating source.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// A one character wide span starting at `start`.
    pub fn single(start: Position) -> Self {
        let end = start.next();
        Self { start, end }
    }

    /// From the start of `self` to the end of `other`.
    pub fn till(&self, other: &Span) -> Self {
        Self {
            start: self.start.clone(),
            end: other.end.clone(),
        }
    }
}
