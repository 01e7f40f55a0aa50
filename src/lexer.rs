use std::fmt;
use std::rc::Rc;

use super::config::DEFAULT_MAX_NESTED;
use super::error::{Error, ErrorKind};
use super::position::{Position, Span};

// Variable convention for the lexer:
// `current` is the character under `pos`, not yet consumed.
// `advance` consumes it and loads the next one.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Var,
    And,
    Or,
    Not,
    If,
    Elif,
    Else,
    While,
    Then,
}

impl Keyword {
    fn from_word(word: &str) -> Option<Self> {
        let keyword = match word {
            "VAR" => Self::Var,
            "AND" => Self::And,
            "OR" => Self::Or,
            "NOT" => Self::Not,
            "IF" => Self::If,
            "ELIF" => Self::Elif,
            "ELSE" => Self::Else,
            "WHILE" => Self::While,
            "THEN" => Self::Then,
            _ => return None,
        };
        Some(keyword)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Var => "VAR",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
            Self::If => "IF",
            Self::Elif => "ELIF",
            Self::Else => "ELSE",
            Self::While => "WHILE",
            Self::Then => "THEN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Plus,
    Minus,
    Asterisk,
    Slash,
    Equal,
    EqualEqual,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    LeftParen,
    RightParen,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Asterisk => "*",
            Self::Slash => "/",
            Self::Equal => "=",
            Self::EqualEqual => "==",
            Self::NotEqual => "!=",
            Self::Less => "<",
            Self::Greater => ">",
            Self::LessEqual => "<=",
            Self::GreaterEqual => ">=",
            Self::LeftParen => "(",
            Self::RightParen => ")",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Int(i128),
    Float(f64),
    Identifier(String),
    Keyword(Keyword),
    Operator(Operator),
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "INT:{n}"),
            Self::Float(n) => write!(f, "FLOAT:{n:?}"),
            Self::Identifier(name) => write!(f, "IDENTIFIER:{name}"),
            Self::Keyword(keyword) => write!(f, "KEYWORD:{}", keyword.as_str()),
            Self::Operator(op) => write!(f, "'{}'", op.as_str()),
            Self::Eof => f.write_str("EOF"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }

    pub fn is_operator(&self, op: Operator) -> bool {
        self.kind == TokenKind::Operator(op)
    }
}

/// Lexes `source` with the default `IF`/`WHILE` occurrence limit.
pub fn tokenize(source: &str) -> Result<Vec<Token>, Error> {
    Lexer::new(source).get_tokens()
}

pub struct Lexer {
    chars: Vec<char>,
    pos: Position,
    current: Option<char>,
    max_nested: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        let chars = source.chars().collect::<Vec<_>>();
        let current = chars.first().copied();
        Self {
            chars,
            pos: Position::start_of(Rc::from(source)),
            current,
            max_nested: DEFAULT_MAX_NESTED,
        }
    }

    pub fn max_nested(mut self, max_nested: usize) -> Self {
        self.max_nested = max_nested;
        self
    }

    pub fn get_tokens(mut self) -> Result<Vec<Token>, Error> {
        let aprox_capacity = self
            .chars
            .iter()
            .filter(|c| !c.is_ascii_whitespace())
            .count();
        let mut tokens = Vec::with_capacity(aprox_capacity + 1);

        while let Some(ch) = self.current {
            match ch {
                // Newlines only move the line counter; they never end a statement.
                ' ' | '\t' | '\n' | '\r' => self.advance(),

                '+' => tokens.push(self.single(Operator::Plus)),
                '-' => tokens.push(self.single(Operator::Minus)),
                '*' => tokens.push(self.single(Operator::Asterisk)),
                '/' => tokens.push(self.single(Operator::Slash)),
                '(' => tokens.push(self.single(Operator::LeftParen)),
                ')' => tokens.push(self.single(Operator::RightParen)),

                '!' => tokens.push(self.not_equal()?),
                '=' => tokens.push(self.maybe_equal(Operator::Equal, Operator::EqualEqual)),
                '<' => tokens.push(self.maybe_equal(Operator::Less, Operator::LessEqual)),
                '>' => tokens.push(self.maybe_equal(Operator::Greater, Operator::GreaterEqual)),

                ch if ch.is_ascii_digit() => tokens.push(self.number()),
                ch if ch.is_ascii_alphabetic() => tokens.push(self.word()),

                illegal => {
                    let start = self.pos.clone();
                    self.advance();
                    return Err(Error::new(
                        ErrorKind::IllegalCharacter,
                        Span::new(start, self.pos.clone()),
                        format!("'{illegal}'"),
                    ));
                }
            }
        }

        tokens.push(Token {
            kind: TokenKind::Eof,
            span: Span::single(self.pos.clone()),
        });
        self.check_nesting(&tokens)?;
        Ok(tokens)
    }

    // Counts every IF and WHILE in the whole script, nested or not.
    fn check_nesting(&self, tokens: &[Token]) -> Result<(), Error> {
        let mut ifs = 0;
        let mut whiles = 0;
        for token in tokens {
            let (keyword, count) = match token.kind {
                TokenKind::Keyword(Keyword::If) => {
                    ifs += 1;
                    (Keyword::If, ifs)
                }
                TokenKind::Keyword(Keyword::While) => {
                    whiles += 1;
                    (Keyword::While, whiles)
                }
                _ => continue,
            };
            if count >= self.max_nested {
                return Err(Error::new(
                    ErrorKind::TooManyNested,
                    token.span.clone(),
                    format!("'{}'", keyword.as_str()),
                ));
            }
        }
        Ok(())
    }

    fn single(&mut self, op: Operator) -> Token {
        let start = self.pos.clone();
        self.advance();
        Token {
            kind: TokenKind::Operator(op),
            span: Span::new(start, self.pos.clone()),
        }
    }

    fn maybe_equal(&mut self, alone: Operator, with_equal: Operator) -> Token {
        let start = self.pos.clone();
        self.advance();
        let op = if self.current == Some('=') {
            self.advance();
            with_equal
        } else {
            alone
        };
        Token {
            kind: TokenKind::Operator(op),
            span: Span::new(start, self.pos.clone()),
        }
    }

    fn not_equal(&mut self) -> Result<Token, Error> {
        let start = self.pos.clone();
        self.advance();
        if self.current == Some('=') {
            self.advance();
            return Ok(Token {
                kind: TokenKind::Operator(Operator::NotEqual),
                span: Span::new(start, self.pos.clone()),
            });
        }
        Err(Error::new(
            ErrorKind::ExpectedCharacter,
            Span::single(self.pos.clone()),
            "'=' (after '!')",
        ))
    }

    fn number(&mut self) -> Token {
        let start = self.pos.clone();
        let mut dots = 0;
        // A second '.' ends the literal; whatever follows is lexed afresh.
        let literal = self.consume_while(|ch| {
            if ch == '.' {
                dots += 1;
                dots == 1
            } else {
                ch.is_ascii_digit()
            }
        });
        let span = Span::new(start, self.pos.clone());

        // Digits with at most one '.' always parse as f64, overflowing to
        // infinity at worst; integers too wide for i128 take that route.
        let kind = match literal.parse::<i128>() {
            Ok(n) => TokenKind::Int(n),
            _ => TokenKind::Float(literal.parse::<f64>().unwrap_or(f64::INFINITY)),
        };
        Token { kind, span }
    }

    fn word(&mut self) -> Token {
        let start = self.pos.clone();
        let word = self.consume_while(|ch| ch.is_ascii_alphanumeric() || ch == '_');
        let kind = match Keyword::from_word(&word) {
            Some(keyword) => TokenKind::Keyword(keyword),
            None => TokenKind::Identifier(word),
        };
        Token {
            kind,
            span: Span::new(start, self.pos.clone()),
        }
    }

    fn consume_while(&mut self, mut predicate: impl FnMut(char) -> bool) -> String {
        let mut literal = String::new();
        while let Some(ch) = self.current {
            if !predicate(ch) {
                break;
            }
            literal.push(ch);
            self.advance();
        }
        literal
    }

    fn advance(&mut self) {
        self.pos.advance(self.current);
        self.current = self.chars.get(self.pos.offset).copied();
    }
}
