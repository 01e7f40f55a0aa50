use std::cmp::Ordering;
use std::fmt;

/// The only kind of value a script can produce.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    Int(i128),
    Float(f64),
}

impl Number {
    pub const FALSE: Number = Number::Int(0);
    pub const TRUE: Number = Number::Int(1);

    pub fn from_bool(b: bool) -> Self {
        if b { Self::TRUE } else { Self::FALSE }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(n) => n as f64,
            Self::Float(n) => n,
        }
    }

    pub fn is_true(self) -> bool {
        match self {
            Self::Int(n) => n != 0,
            Self::Float(n) => n != 0.0,
        }
    }

    pub fn is_zero(self) -> bool {
        !self.is_true()
    }

    pub fn add(self, other: Self) -> Self {
        self.integer_op(other, i128::checked_add, |l, r| l + r)
    }

    pub fn sub(self, other: Self) -> Self {
        self.integer_op(other, i128::checked_sub, |l, r| l - r)
    }

    pub fn mul(self, other: Self) -> Self {
        self.integer_op(other, i128::checked_mul, |l, r| l * r)
    }

    /// True division; the caller rules out a zero divisor.
    pub fn div(self, other: Self) -> Self {
        Self::Float(self.as_f64() / other.as_f64())
    }

    pub fn compare(self, other: Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(l), Self::Int(r)) => Some(l.cmp(&r)),
            (l, r) => l.as_f64().partial_cmp(&r.as_f64()),
        }
    }

    // Integer results that overflow i128 degrade to floats.
    fn integer_op(
        self,
        other: Self,
        int_op: fn(i128, i128) -> Option<i128>,
        float_op: fn(f64, f64) -> f64,
    ) -> Self {
        match (self, other) {
            (Self::Int(l), Self::Int(r)) => match int_op(l, r) {
                Some(n) => Self::Int(n),
                None => Self::Float(float_op(l as f64, r as f64)),
            },
            (l, r) => Self::Float(float_op(l.as_f64(), r.as_f64())),
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.compare(*other) == Some(Ordering::Equal)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n:?}"),
        }
    }
}
