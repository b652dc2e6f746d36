use crate::callable::Function;
use crate::context::Context;
use crate::error::ErrorKind;
use crate::position::Span;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(x) => x as f64,
            Number::Float(x) => x,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Number::Int(x) => x == 0,
            Number::Float(x) => x == 0.0,
        }
    }

    /// The value as an i64 if it has no fractional part.
    pub fn as_integral(self) -> Option<i64> {
        match self {
            Number::Int(x) => Some(x),
            Number::Float(x) if x.fract() == 0.0 && x.abs() < i64::MAX as f64 => Some(x as i64),
            Number::Float(_) => None,
        }
    }

    fn arith(
        self,
        other: Number,
        int_op: fn(i64, i64) -> Option<i64>,
        float_op: fn(f64, f64) -> f64,
    ) -> Number {
        if let (Number::Int(l), Number::Int(r)) = (self, other) {
            if let Some(x) = int_op(l, r) {
                return Number::Int(x);
            }
        }
        Number::Float(float_op(self.as_f64(), other.as_f64()))
    }

    fn pow(self, other: Number) -> Number {
        if let (Number::Int(l), Number::Int(r)) = (self, other) {
            if r >= 0 && r <= u32::MAX as i64 {
                if let Some(x) = l.checked_pow(r as u32) {
                    return Number::Int(x);
                }
            }
        }
        Number::Float(self.as_f64().powf(other.as_f64()))
    }

    fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::Int(l), Number::Int(r)) => Some(l.cmp(&r)),
            _ => self.as_f64().partial_cmp(&other.as_f64()),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(x) => write!(f, "{}", x),
            Number::Float(x) => write!(f, "{:?}", x),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ValueKind {
    Number(Number),
    String(String),
    Function(Rc<Function>),
}

/// A runtime value plus where it came from. `span` and `context` are metadata only.
#[derive(Debug, Clone)]
pub struct Value {
    pub kind: ValueKind,
    pub span: Option<Span>,
    pub context: Option<Rc<Context>>,
}

/// Upper bound on a string built by repetition.
pub const MAX_STRING_LEN: usize = 1 << 28;

pub type OpResult = Result<Value, ErrorKind>;

impl Value {
    pub fn new(kind: ValueKind) -> Value {
        Value {
            kind,
            span: None,
            context: None,
        }
    }

    pub fn int(x: i64) -> Value {
        Value::new(ValueKind::Number(Number::Int(x)))
    }

    pub fn float(x: f64) -> Value {
        Value::new(ValueKind::Number(Number::Float(x)))
    }

    pub fn string(s: &str) -> Value {
        Value::new(ValueKind::String(s.to_string()))
    }

    pub fn function(f: Function) -> Value {
        Value::new(ValueKind::Function(Rc::new(f)))
    }

    /// `null` is the integer zero.
    pub fn null() -> Value {
        Value::int(0)
    }

    fn boolean(b: bool) -> Value {
        Value::int(if b { 1 } else { 0 })
    }

    pub fn with_span(self, span: Span) -> Value {
        Value {
            span: Some(span),
            ..self
        }
    }

    pub fn with_context(self, context: &Rc<Context>) -> Value {
        Value {
            context: Some(Rc::clone(context)),
            ..self
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self.kind {
            ValueKind::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn is_true(&self) -> bool {
        match &self.kind {
            ValueKind::Number(n) => !n.is_zero(),
            ValueKind::String(s) => !s.is_empty(),
            ValueKind::Function(_) => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self.kind {
            ValueKind::Number(_) => "number",
            ValueKind::String(_) => "string",
            ValueKind::Function(_) => "function",
        }
    }

    /// Echo form: like `Display`, but strings are quoted.
    pub fn repr(&self) -> String {
        match &self.kind {
            ValueKind::String(s) => format!("{:?}", s),
            _ => self.to_string(),
        }
    }

    fn illegal(&self, op: &str, other: &Value) -> ErrorKind {
        ErrorKind::IllegalOperation(format!(
            "{} {} {}",
            self.type_name(),
            op,
            other.type_name()
        ))
    }

    fn numbers(&self, other: &Value) -> Option<(Number, Number)> {
        Some((self.as_number()?, other.as_number()?))
    }

    pub fn added_to(&self, other: &Value) -> OpResult {
        match (&self.kind, &other.kind) {
            (ValueKind::String(l), ValueKind::String(r)) => {
                let mut joined = l.clone();
                joined.push_str(r);
                Ok(Value::new(ValueKind::String(joined)))
            }
            _ => match self.numbers(other) {
                Some((l, r)) => Ok(num(l.arith(r, i64::checked_add, |a, b| a + b))),
                None => Err(self.illegal("+", other)),
            },
        }
    }

    pub fn subtracted_by(&self, other: &Value) -> OpResult {
        match self.numbers(other) {
            Some((l, r)) => Ok(num(l.arith(r, i64::checked_sub, |a, b| a - b))),
            None => Err(self.illegal("-", other)),
        }
    }

    pub fn multiplied_by(&self, other: &Value) -> OpResult {
        match (&self.kind, &other.kind) {
            (ValueKind::String(s), ValueKind::Number(Number::Int(n))) => {
                let count = if *n > 0 { *n as usize } else { 0 };
                match s.len().checked_mul(count) {
                    Some(len) if len <= MAX_STRING_LEN => {
                        Ok(Value::new(ValueKind::String(s.repeat(count))))
                    }
                    _ => Err(ErrorKind::IllegalOperation(format!(
                        "repeated string would exceed {} bytes",
                        MAX_STRING_LEN
                    ))),
                }
            }
            _ => match self.numbers(other) {
                Some((l, r)) => Ok(num(l.arith(r, i64::checked_mul, |a, b| a * b))),
                None => Err(self.illegal("*", other)),
            },
        }
    }

    pub fn divided_by(&self, other: &Value) -> OpResult {
        match self.numbers(other) {
            Some((_, r)) if r.is_zero() => Err(ErrorKind::DivisionByZero),
            Some((l, r)) => Ok(Value::float(l.as_f64() / r.as_f64())),
            None => Err(self.illegal("/", other)),
        }
    }

    pub fn powed_by(&self, other: &Value) -> OpResult {
        match self.numbers(other) {
            Some((l, r)) => Ok(num(l.pow(r))),
            None => Err(self.illegal("^", other)),
        }
    }

    pub fn compared_eq(&self, other: &Value) -> OpResult {
        match (&self.kind, &other.kind) {
            (ValueKind::String(l), ValueKind::String(r)) => Ok(Value::boolean(l == r)),
            _ => self.compared("==", other, |o| o == Ordering::Equal),
        }
    }

    pub fn compared_ne(&self, other: &Value) -> OpResult {
        match (&self.kind, &other.kind) {
            (ValueKind::String(l), ValueKind::String(r)) => Ok(Value::boolean(l != r)),
            // NaN compares unequal to everything.
            _ => match self.numbers(other) {
                Some((l, r)) => Ok(Value::boolean(l.compare(r) != Some(Ordering::Equal))),
                None => Err(self.illegal("!=", other)),
            },
        }
    }

    pub fn compared_lt(&self, other: &Value) -> OpResult {
        self.compared("<", other, |o| o == Ordering::Less)
    }

    pub fn compared_lte(&self, other: &Value) -> OpResult {
        self.compared("<=", other, |o| o != Ordering::Greater)
    }

    pub fn compared_gt(&self, other: &Value) -> OpResult {
        self.compared(">", other, |o| o == Ordering::Greater)
    }

    pub fn compared_gte(&self, other: &Value) -> OpResult {
        self.compared(">=", other, |o| o != Ordering::Less)
    }

    fn compared(&self, op: &str, other: &Value, test: fn(Ordering) -> bool) -> OpResult {
        match self.numbers(other) {
            Some((l, r)) => Ok(Value::boolean(l.compare(r).map_or(false, test))),
            None => Err(self.illegal(op, other)),
        }
    }

    pub fn anded_by(&self, other: &Value) -> OpResult {
        self.logical("AND", other)
            .map(|_| Value::boolean(self.is_true() && other.is_true()))
    }

    pub fn ored_by(&self, other: &Value) -> OpResult {
        self.logical("OR", other)
            .map(|_| Value::boolean(self.is_true() || other.is_true()))
    }

    fn logical(&self, op: &str, other: &Value) -> Result<(), ErrorKind> {
        match (&self.kind, &other.kind) {
            (ValueKind::Function(_), _) | (_, ValueKind::Function(_)) => {
                Err(self.illegal(op, other))
            }
            _ => Ok(()),
        }
    }

    pub fn notted(&self) -> OpResult {
        match self.kind {
            ValueKind::Function(_) => Err(ErrorKind::IllegalOperation(
                "NOT function".to_string(),
            )),
            _ => Ok(Value::boolean(!self.is_true())),
        }
    }
}

fn num(n: Number) -> Value {
    Value::new(ValueKind::Number(n))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ValueKind::Number(x) => write!(f, "{}", x),
            ValueKind::String(x) => write!(f, "{}", x),
            ValueKind::Function(x) => write!(f, "{}", x),
        }
    }
}
