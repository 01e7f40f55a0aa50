use super::ast::{BinaryOp, Expr, UnaryOp};
use super::config::Limits;
use super::error::{Frame, Result};
use super::number::Number;
use super::position::Span;
use super::runtime_error;

use log::{debug, trace};
use std::cmp::Ordering;
use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    rc::{Rc, Weak},
};

/// `FALSE` and `TRUE`, present in every root scope.
pub const PREDEFINED: usize = 2;

pub type Environment = Rc<RefCell<Scope>>;

/// A number together with where it was produced.
#[derive(Debug, Clone)]
pub struct Value {
    pub number: Number,
    // None only for the predefined constants, which have no source.
    pub span: Option<Span>,
    scope: Weak<RefCell<Scope>>,
}

impl Value {
    pub fn new(number: Number) -> Self {
        Self {
            number,
            span: None,
            scope: Weak::new(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_scope(mut self, env: &Environment) -> Self {
        self.scope = Rc::downgrade(env);
        self
    }

    /// The scope that evaluated this value, if it is still alive.
    pub fn scope(&self) -> Option<Environment> {
        self.scope.upgrade()
    }
}

#[derive(Debug)]
pub struct Scope {
    name: String,
    bindings: HashMap<String, Value>,
    parent: Option<Environment>,
    // Line in the parent where this scope was entered.
    entry_line: usize,
}

impl Scope {
    /// The one construction point for a root environment. Reuse it across
    /// calls for REPL continuity; build another for an isolated session.
    pub fn global() -> Environment {
        let mut scope = Scope {
            name: "<program>".to_string(),
            bindings: HashMap::new(),
            parent: None,
            entry_line: 0,
        };
        scope.set("FALSE".to_string(), Value::new(Number::FALSE));
        scope.set("TRUE".to_string(), Value::new(Number::TRUE));
        Rc::new(RefCell::new(scope))
    }

    /// A child scope whose lookups fall through to `parent`. Scripts only ever
    /// run in the root; embedders that add call frames stack them with this,
    /// and tracebacks then list one line per scope.
    pub fn inner(parent: &Environment, name: impl Into<String>, entry_line: usize) -> Environment {
        Rc::new(RefCell::new(Scope {
            name: name.into(),
            bindings: HashMap::new(),
            parent: Some(Rc::clone(parent)),
            entry_line,
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entries held directly by this scope, constants included.
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    pub fn set(&mut self, name: String, value: Value) {
        self.bindings.insert(name, value);
    }

    /// Looks `name` up through the parent chain and returns a copy.
    pub fn get(&self, name: &str) -> Option<Value> {
        match self.bindings.get(name) {
            Some(val) => Some(val.clone()),
            None => match &self.parent {
                Some(parent) => parent.borrow().get(name),
                None => None,
            },
        }
    }

    /// Frames from the root down to `env`, the failing scope.
    pub fn traceback(env: &Environment, span: &Span) -> Vec<Frame> {
        let mut frames = Vec::new();
        let mut line = span.start.line;
        let mut current = Some(Rc::clone(env));
        while let Some(scope) = current {
            let scope = scope.borrow();
            frames.push(Frame {
                name: scope.name.clone(),
                line,
            });
            line = scope.entry_line;
            current = scope.parent.clone();
        }
        frames.reverse();
        frames
    }
}

pub struct Interpreter {
    limits: Limits,
    depth: Cell<usize>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    pub fn with_limits(limits: Limits) -> Self {
        Interpreter {
            limits,
            depth: Cell::new(0),
        }
    }

    /// Walks `expr` against `env`. `Ok(None)` is a valid outcome: loops and
    /// conditionals without a taken branch produce nothing.
    pub fn evaluate(&self, expr: &Expr, env: &Environment) -> Result<Option<Value>> {
        let depth = self.depth.get();
        if depth >= self.limits.max_depth {
            return runtime_error!(
                StackOverFlow,
                expr.span(),
                env,
                "Maximum recursion depth exceeded"
            );
        }
        self.depth.set(depth + 1);
        let result = self.evaluate_node(expr, env);
        self.depth.set(depth);
        result
    }

    fn evaluate_node(&self, expr: &Expr, env: &Environment) -> Result<Option<Value>> {
        match expr {
            Expr::Number { value, span } => Ok(Some(
                Value::new(*value).with_span(span.clone()).with_scope(env),
            )),

            Expr::Identifier { name, span } => {
                let found = env.borrow().get(name);
                match found {
                    Some(val) => Ok(Some(val.with_span(span.clone()).with_scope(env))),
                    None => runtime_error!(Runtime, span.clone(), env, "'{}' is not defined", name),
                }
            }

            Expr::Assignment { name, value, .. } => {
                let value = self.value_of(value, env)?;
                self.evaluate_assignment(expr, name, value, env)
            }

            Expr::BinaryOperation { op, lhs, rhs } => {
                self.evaluate_binary(*op, lhs, rhs, env).map(Some)
            }

            Expr::UnaryOperation { op, operand, .. } => {
                self.evaluate_unary(expr, *op, operand, env).map(Some)
            }

            Expr::If { cases, else_case } => {
                for (condition, body) in cases {
                    if self.value_of(condition, env)?.number.is_true() {
                        return self.evaluate(body, env);
                    }
                }
                match else_case {
                    Some(else_case) => self.evaluate(else_case, env),
                    None => Ok(None),
                }
            }

            Expr::While { condition, body } => {
                let mut iterations = 0usize;
                while self.value_of(condition, env)?.number.is_true() {
                    self.evaluate(body, env)?;
                    iterations += 1;
                }
                trace!("loop finished after {iterations} iterations");
                Ok(None)
            }
        }
    }

    // Operands, conditions and assigned values must produce a number.
    fn value_of(&self, expr: &Expr, env: &Environment) -> Result<Value> {
        match self.evaluate(expr, env)? {
            Some(value) => Ok(value),
            None => runtime_error!(Runtime, expr.span(), env, "Expression produced no value"),
        }
    }

    fn evaluate_assignment(
        &self,
        expr: &Expr,
        name: &str,
        value: Value,
        env: &Environment,
    ) -> Result<Option<Value>> {
        // Checked against the current count, so a full table rejects
        // rebinding too.
        let full = env.borrow().binding_count() >= PREDEFINED + self.limits.max_variables;
        if full {
            return runtime_error!(
                TooManyVariables,
                expr.span(),
                env,
                "Too Many Variables Assigned"
            );
        }

        debug!("binding {name} = {}", value.number);
        env.borrow_mut().set(name.to_string(), value.clone());
        Ok(Some(value))
    }

    fn evaluate_binary(
        &self,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
        env: &Environment,
    ) -> Result<Value> {
        let left = self.value_of(lhs, env)?;
        let right = self.value_of(rhs, env)?;
        let (l, r) = (left.number, right.number);

        let result = match op {
            BinaryOp::Add => l.add(r),
            BinaryOp::Sub => l.sub(r),
            BinaryOp::Mul => l.mul(r),
            BinaryOp::Div => {
                if r.is_zero() {
                    let scope = left.scope().unwrap_or_else(|| Rc::clone(env));
                    return runtime_error!(Runtime, rhs.span(), &scope, "Division by zero");
                }
                l.div(r)
            }
            BinaryOp::Equal => Number::from_bool(l.compare(r) == Some(Ordering::Equal)),
            BinaryOp::NotEqual => Number::from_bool(l.compare(r) != Some(Ordering::Equal)),
            BinaryOp::Less => Number::from_bool(l.compare(r) == Some(Ordering::Less)),
            BinaryOp::Greater => Number::from_bool(l.compare(r) == Some(Ordering::Greater)),
            BinaryOp::LessEqual => Number::from_bool(matches!(
                l.compare(r),
                Some(Ordering::Less | Ordering::Equal)
            )),
            BinaryOp::GreaterEqual => Number::from_bool(matches!(
                l.compare(r),
                Some(Ordering::Greater | Ordering::Equal)
            )),
            // Both sides are already evaluated; no short-circuit.
            BinaryOp::And => Number::from_bool(l.is_true() && r.is_true()),
            BinaryOp::Or => Number::from_bool(l.is_true() || r.is_true()),
        };

        let span = lhs.span().till(&rhs.span());
        if op.is_arithmetic() {
            self.limit_result(result, &span, env)?;
        }
        Ok(Value::new(result).with_span(span).with_scope(env))
    }

    fn evaluate_unary(
        &self,
        expr: &Expr,
        op: UnaryOp,
        operand: &Expr,
        env: &Environment,
    ) -> Result<Value> {
        let value = self.value_of(operand, env)?;
        let span = expr.span();
        let result = match op {
            UnaryOp::Plus => value.number,
            UnaryOp::Minus => {
                let negated = value.number.mul(Number::Int(-1));
                self.limit_result(negated, &span, env)?;
                negated
            }
            UnaryOp::Not => Number::from_bool(!value.number.is_true()),
        };
        Ok(Value::new(result).with_span(span).with_scope(env))
    }

    fn limit_result(&self, result: Number, span: &Span, env: &Environment) -> Result<()> {
        let magnitude = result.as_f64();
        if magnitude.is_nan() {
            return runtime_error!(StackOverFlow, span.clone(), env, "Result is not a number");
        }
        if magnitude > self.limits.max_result {
            return runtime_error!(StackOverFlow, span.clone(), env, "Result is too big");
        }
        if magnitude < self.limits.min_result {
            return runtime_error!(StackOverFlow, span.clone(), env, "Result is too small");
        }
        Ok(())
    }
}
