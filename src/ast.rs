use super::config::DEFAULT_MAX_DEPTH;
use super::error::{Error, ErrorKind, Result};
use super::lexer::{Keyword, Operator, Token, TokenKind};
use super::number::Number;
use super::position::{Position, Span};
use super::syntax_error;

use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // 3, 4.5
    Number {
        value: Number,
        span: Span,
    },
    // x
    Identifier {
        name: String,
        span: Span,
    },
    // VAR x = expr
    Assignment {
        name: String,
        name_span: Span,
        value: Box<Expr>,
    },
    BinaryOperation {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    UnaryOperation {
        op: UnaryOp,
        op_span: Span,
        operand: Box<Expr>,
    },
    // IF c THEN e (ELIF c THEN e)* (ELSE e)?
    If {
        cases: Vec<(Expr, Expr)>,
        else_case: Option<Box<Expr>>,
    },
    // WHILE c THEN e
    While {
        condition: Box<Expr>,
        body: Box<Expr>,
    },
}

impl Expr {
    /// The node's span, derived from its outermost children.
    pub fn span(&self) -> Span {
        match self {
            Self::Number { span, .. } | Self::Identifier { span, .. } => span.clone(),
            Self::Assignment {
                name_span, value, ..
            } => name_span.till(&value.span()),
            Self::BinaryOperation { lhs, rhs, .. } => lhs.span().till(&rhs.span()),
            Self::UnaryOperation {
                op_span, operand, ..
            } => op_span.till(&operand.span()),
            Self::If { cases, else_case } => {
                // The parser never builds an IF without its first case.
                let first = &cases[0].0;
                let last_body = &cases[cases.len() - 1].1;
                let end = else_case.as_deref().unwrap_or(last_body);
                first.span().till(&end.span())
            }
            Self::While { condition, body } => condition.span().till(&body.span()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    And,
    Or,
}

impl BinaryOp {
    fn from_token(kind: &TokenKind) -> Option<Self> {
        let op = match kind {
            TokenKind::Operator(Operator::Plus) => Self::Add,
            TokenKind::Operator(Operator::Minus) => Self::Sub,
            TokenKind::Operator(Operator::Asterisk) => Self::Mul,
            TokenKind::Operator(Operator::Slash) => Self::Div,
            TokenKind::Operator(Operator::EqualEqual) => Self::Equal,
            TokenKind::Operator(Operator::NotEqual) => Self::NotEqual,
            TokenKind::Operator(Operator::Less) => Self::Less,
            TokenKind::Operator(Operator::Greater) => Self::Greater,
            TokenKind::Operator(Operator::LessEqual) => Self::LessEqual,
            TokenKind::Operator(Operator::GreaterEqual) => Self::GreaterEqual,
            TokenKind::Keyword(Keyword::And) => Self::And,
            TokenKind::Keyword(Keyword::Or) => Self::Or,
            _ => return None,
        };
        Some(op)
    }

    /// `+ - * /`; only these results are range checked.
    pub fn is_arithmetic(self) -> bool {
        matches!(self, Self::Add | Self::Sub | Self::Mul | Self::Div)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
}

const TERM_OPS: &[BinaryOp] = &[BinaryOp::Mul, BinaryOp::Div];
const ARITH_OPS: &[BinaryOp] = &[BinaryOp::Add, BinaryOp::Sub];
const COMPARE_OPS: &[BinaryOp] = &[
    BinaryOp::Equal,
    BinaryOp::NotEqual,
    BinaryOp::Less,
    BinaryOp::Greater,
    BinaryOp::LessEqual,
    BinaryOp::GreaterEqual,
];
const LOGIC_OPS: &[BinaryOp] = &[BinaryOp::And, BinaryOp::Or];

type Rule = fn(&mut Parser) -> Result<Expr>;

/// Parses a complete token sequence into one expression.
pub fn parse(tokens: Vec<Token>) -> Result<Expr> {
    Parser::new(tokens).parse()
}

pub struct Parser {
    tokens: Vec<Token>,
    index: usize,
    depth: usize,
    max_depth: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        // Lexer output always ends in EOF; hand-built sequences may not.
        if !matches!(tokens.last(), Some(Token { kind: TokenKind::Eof, .. })) {
            let at = match tokens.last() {
                Some(last) => last.span.end.clone(),
                None => Position::start_of(Rc::from("")),
            };
            tokens.push(Token {
                kind: TokenKind::Eof,
                span: Span::single(at),
            });
        }
        Self {
            tokens,
            index: 0,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn parse(mut self) -> Result<Expr> {
        let expr = self.expr()?;
        if self.current().kind != TokenKind::Eof {
            return syntax_error!(
                self.current().span.clone(),
                "Expected '+', '-', '*', '/', '==', '!=', '<', '>', '<=', '>=', 'AND' or 'OR'"
            );
        }
        Ok(expr)
    }

    fn expr(&mut self) -> Result<Expr> {
        if self.current().is_keyword(Keyword::Var) {
            self.advance();

            let (name, name_span) = match &self.current().kind {
                TokenKind::Identifier(name) => (name.clone(), self.current().span.clone()),
                _ => return syntax_error!(self.current().span.clone(), "Expected identifier"),
            };
            self.advance();

            if !self.current().is_operator(Operator::Equal) {
                return syntax_error!(self.current().span.clone(), "Expected '='");
            }
            self.advance();

            let value = self.nested(Self::expr)?;
            return Ok(Expr::Assignment {
                name,
                name_span,
                value: Box::new(value),
            });
        }

        let start = self.index;
        self.binary_operation(Self::compare_expr, LOGIC_OPS, Self::compare_expr)
            .map_err(|err| {
                self.generalize(
                    start,
                    err,
                    "Expected 'VAR', int, float, identifier, '+', '-', '(' or 'NOT'",
                )
            })
    }

    fn compare_expr(&mut self) -> Result<Expr> {
        if self.current().is_keyword(Keyword::Not) {
            let op_span = self.current().span.clone();
            self.advance();
            let operand = self.nested(Self::compare_expr)?;
            return Ok(Expr::UnaryOperation {
                op: UnaryOp::Not,
                op_span,
                operand: Box::new(operand),
            });
        }

        let start = self.index;
        self.binary_operation(Self::arith_expr, COMPARE_OPS, Self::arith_expr)
            .map_err(|err| {
                self.generalize(
                    start,
                    err,
                    "Expected int, float, identifier, '+', '-', '(' or 'NOT'",
                )
            })
    }

    fn arith_expr(&mut self) -> Result<Expr> {
        self.binary_operation(Self::term, ARITH_OPS, Self::term)
    }

    fn term(&mut self) -> Result<Expr> {
        self.binary_operation(Self::factor, TERM_OPS, Self::factor)
    }

    fn factor(&mut self) -> Result<Expr> {
        let op = match self.current().kind {
            TokenKind::Operator(Operator::Plus) => UnaryOp::Plus,
            TokenKind::Operator(Operator::Minus) => UnaryOp::Minus,
            _ => return self.atom(),
        };
        let op_span = self.current().span.clone();
        self.advance();
        let operand = self.nested(Self::factor)?;
        Ok(Expr::UnaryOperation {
            op,
            op_span,
            operand: Box::new(operand),
        })
    }

    fn atom(&mut self) -> Result<Expr> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Int(n) => {
                self.advance();
                Ok(Expr::Number {
                    value: Number::Int(n),
                    span: token.span,
                })
            }
            TokenKind::Float(n) => {
                self.advance();
                Ok(Expr::Number {
                    value: Number::Float(n),
                    span: token.span,
                })
            }
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(Expr::Identifier {
                    name,
                    span: token.span,
                })
            }
            TokenKind::Operator(Operator::LeftParen) => {
                self.advance();
                let expr = self.nested(Self::expr)?;
                if !self.current().is_operator(Operator::RightParen) {
                    return syntax_error!(self.current().span.clone(), "Expected ')'");
                }
                self.advance();
                Ok(expr)
            }
            TokenKind::Keyword(Keyword::If) => self.if_expr(),
            TokenKind::Keyword(Keyword::While) => self.while_expr(),
            _ => syntax_error!(
                token.span,
                "Expected int, float, identifier, '+', '-', '('"
            ),
        }
    }

    fn if_expr(&mut self) -> Result<Expr> {
        let mut cases = vec![self.branch(Keyword::If)?];
        while self.current().is_keyword(Keyword::Elif) {
            cases.push(self.branch(Keyword::Elif)?);
        }

        let mut else_case = None;
        if self.current().is_keyword(Keyword::Else) {
            self.advance();
            else_case = Some(Box::new(self.nested(Self::expr)?));
        }

        Ok(Expr::If { cases, else_case })
    }

    // `<keyword> condition THEN body`, shared by IF and ELIF.
    fn branch(&mut self, keyword: Keyword) -> Result<(Expr, Expr)> {
        self.expect_keyword(keyword)?;
        let condition = self.nested(Self::expr)?;
        self.expect_keyword(Keyword::Then)?;
        let body = self.nested(Self::expr)?;
        Ok((condition, body))
    }

    fn while_expr(&mut self) -> Result<Expr> {
        let (condition, body) = self.branch(Keyword::While)?;
        Ok(Expr::While {
            condition: Box::new(condition),
            body: Box::new(body),
        })
    }

    // Left-associative fold of `lhs (op rhs)*` for any op in `ops`.
    fn binary_operation(&mut self, lhs: Rule, ops: &[BinaryOp], rhs: Rule) -> Result<Expr> {
        let mut left = lhs(self)?;
        while let Some(op) = BinaryOp::from_token(&self.current().kind) {
            if !ops.contains(&op) {
                break;
            }
            self.advance();
            let right = rhs(self)?;
            left = Expr::BinaryOperation {
                op,
                lhs: Box::new(left),
                rhs: Box::new(right),
            };
        }
        Ok(left)
    }

    // Runs a rule one level further down; every self-recursive step of the
    // grammar goes through here.
    fn nested(&mut self, rule: Rule) -> Result<Expr> {
        if self.depth >= self.max_depth {
            return syntax_error!(
                self.current().span.clone(),
                "Expression nested too deeply (limit {})",
                self.max_depth
            );
        }
        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;
        result
    }

    // A failure that consumed nothing since `start` is replaced by the
    // broader message of the enclosing rule; a deeper failure is kept.
    fn generalize(&self, start: usize, err: Error, message: &str) -> Error {
        if self.index == start {
            Error::new(ErrorKind::Syntax, self.current().span.clone(), message)
        } else {
            err
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<()> {
        if !self.current().is_keyword(keyword) {
            return syntax_error!(
                self.current().span.clone(),
                "Expected '{}'",
                keyword.as_str()
            );
        }
        self.advance();
        Ok(())
    }

    fn current(&self) -> &Token {
        // `new` guarantees a trailing EOF, so the slice is never empty.
        &self.tokens[self.index.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) {
        if self.index + 1 < self.tokens.len() {
            self.index += 1;
        }
    }
}
