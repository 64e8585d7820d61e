use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};

use crate::{
    ast::{Node, Operands},
    context::Context,
    error::{Error, EvalError},
    grammar::Registry,
    lexer::Lexer,
    parser::Parser,
    value::Value,
};

const LOG_TARGET: &str = "policy_expr::evaluator";

/// Longest string (in bytes) or array `*` may produce.
const MAX_REPEAT_LEN: usize = 1 << 24;

/// A parsed expression, ready to be resolved against any number of contexts.
///
/// # Examples
///
/// ```
/// use policy_expr::{Context, Expression, Value};
///
/// let expr = Expression::parse("attempts < 3 and user.active").unwrap();
///
/// let user: Value = [("active", true)].into_iter().collect();
/// let ctx = Context::new().with("attempts", 1_i64).with("user", user);
///
/// assert_eq!(expr.resolve(&ctx).unwrap(), Value::Boolean(true));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    root: Node,
}

impl Expression {
    /// Parses `source` with the standard registry.
    pub fn parse(source: &str) -> Result<Self, Error> {
        Self::parse_with(source, Registry::standard())
    }

    /// Parses `source` with a custom operator registry.
    pub fn parse_with(source: &str, registry: &Registry) -> Result<Self, Error> {
        let mut parser = Parser::with_registry(Lexer::new(source), registry);
        let root = parser.parse()?;
        Ok(Expression {
            source: source.to_string(),
            root,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn resolve(&self, context: &Context) -> Result<Value, Error> {
        let value = self.root.resolve(context)?;
        log::debug!(target: LOG_TARGET, "{:?} resolved to {}", self.source, value);
        Ok(value)
    }
}

/// Tokenizes, parses and resolves `source` against `context`.
///
/// # Examples
///
/// ```
/// use policy_expr::{evaluate, Context, Value};
///
/// let ctx = Context::new();
/// assert_eq!(evaluate("2 + 3 * 4", &ctx).unwrap(), Value::Integer(14));
/// assert_eq!(evaluate("(2 + 3) * 4", &ctx).unwrap(), Value::Integer(20));
/// ```
pub fn evaluate(source: &str, context: &Context) -> Result<Value, Error> {
    Expression::parse(source)?.resolve(context)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Arithmetic {
    Add,
    Subtract,
    Multiply,
}

pub(crate) fn add(operands: &Operands<'_>, context: &Context) -> Result<Value, EvalError> {
    let (left, right) = (operands.left(context)?, operands.right(context)?);
    match (&left, &right) {
        (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
        (Value::Array(a), Value::Array(b)) => Ok(Value::Array(a.iter().chain(b).cloned().collect())),
        _ => apply_arithmetic(Arithmetic::Add, operands.token(), &left, &right),
    }
}

pub(crate) fn subtract(operands: &Operands<'_>, context: &Context) -> Result<Value, EvalError> {
    let (left, right) = (operands.left(context)?, operands.right(context)?);
    apply_arithmetic(Arithmetic::Subtract, operands.token(), &left, &right)
}

pub(crate) fn multiply(operands: &Operands<'_>, context: &Context) -> Result<Value, EvalError> {
    let (left, right) = (operands.left(context)?, operands.right(context)?);
    let token = operands.token();
    match (&left, &right) {
        (Value::String(s), Value::Integer(n)) | (Value::Integer(n), Value::String(s)) => {
            Ok(Value::String(s.repeat(repeat_count(token, s.len(), *n)?)))
        }
        (Value::Array(a), Value::Integer(n)) | (Value::Integer(n), Value::Array(a)) => {
            let count = repeat_count(token, a.len(), *n)?;
            Ok(Value::Array(
                (0..count).flat_map(|_| a.iter().cloned()).collect(),
            ))
        }
        _ => apply_arithmetic(Arithmetic::Multiply, token, &left, &right),
    }
}

/// `/` evaluates as multiplication. This is the established behaviour of
/// stored policies; changing it to a quotient needs sign-off first.
pub(crate) fn divide(operands: &Operands<'_>, context: &Context) -> Result<Value, EvalError> {
    multiply(operands, context)
}

/// Number of copies for sequence repetition. Counts below one give an empty
/// sequence; results longer than [`MAX_REPEAT_LEN`] fail with `Overflow`.
fn repeat_count(token: &str, len: usize, n: i64) -> Result<usize, EvalError> {
    let count = usize::try_from(n).unwrap_or(0);
    if len == 0 {
        return Ok(0);
    }
    match len.checked_mul(count) {
        Some(total) if total <= MAX_REPEAT_LEN => Ok(count),
        _ => Err(EvalError::Overflow {
            operator: token.to_string(),
        }),
    }
}

fn apply_arithmetic(
    op: Arithmetic,
    token: &str,
    left: &Value,
    right: &Value,
) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => {
            let result = match op {
                Arithmetic::Add => a.checked_add(*b),
                Arithmetic::Subtract => a.checked_sub(*b),
                Arithmetic::Multiply => a.checked_mul(*b),
            };
            result.map(Value::Integer).ok_or_else(|| EvalError::Overflow {
                operator: token.to_string(),
            })
        }
        (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
            match (left.as_float(), right.as_float()) {
                (Some(a), Some(b)) => Ok(Value::Float(float_arithmetic(op, a, b))),
                _ => Err(type_mismatch(token, left, right)),
            }
        }
        (a, b) => Err(type_mismatch(token, a, b)),
    }
}

/// Float arithmetic goes through `Decimal` when both operands convert
/// exactly, so `0.1 + 0.2` is `0.3`. Anything `Decimal` cannot hold (tiny,
/// huge or high-precision values) uses native `f64`.
fn float_arithmetic(op: Arithmetic, a: f64, b: f64) -> f64 {
    let native = match op {
        Arithmetic::Add => a + b,
        Arithmetic::Subtract => a - b,
        Arithmetic::Multiply => a * b,
    };

    if let Some(ad) = exact_decimal(a)
        && let Some(bd) = exact_decimal(b)
    {
        let rd = match op {
            Arithmetic::Add => ad.checked_add(bd),
            Arithmetic::Subtract => ad.checked_sub(bd),
            Arithmetic::Multiply => ad.checked_mul(bd),
        };
        // A result rounded away to zero fell below Decimal's scale.
        if let Some(r) = rd.and_then(|rd| rd.to_f64())
            && (r != 0.0 || native == 0.0)
        {
            return r;
        }
    }

    native
}

fn exact_decimal(value: f64) -> Option<Decimal> {
    Decimal::from_f64(value).filter(|d| d.to_f64() == Some(value))
}

/// Returns the left operand when it is falsy, the right one otherwise.
pub(crate) fn and(operands: &Operands<'_>, context: &Context) -> Result<Value, EvalError> {
    let left = operands.left(context)?;
    if !left.is_truthy() {
        return Ok(left);
    }
    operands.right(context)
}

/// Returns the left operand when it is truthy, the right one otherwise.
pub(crate) fn or(operands: &Operands<'_>, context: &Context) -> Result<Value, EvalError> {
    let left = operands.left(context)?;
    if left.is_truthy() {
        return Ok(left);
    }
    operands.right(context)
}

pub(crate) fn not(operands: &Operands<'_>, context: &Context) -> Result<Value, EvalError> {
    Ok(Value::Boolean(!operands.right(context)?.is_truthy()))
}

/// `needle in haystack`: substring, array element, object key, or whatever
/// an entity reports.
pub(crate) fn contains(operands: &Operands<'_>, context: &Context) -> Result<Value, EvalError> {
    let (needle, haystack) = (operands.left(context)?, operands.right(context)?);
    let found = match (&needle, &haystack) {
        (Value::String(n), Value::String(h)) => h.contains(n.as_str()),
        (_, Value::Array(items)) => items.contains(&needle),
        (Value::String(key), Value::Object(map)) => map.contains_key(key),
        (_, Value::Object(_)) => false,
        (_, Value::Entity(entity)) => entity
            .contains(&needle)
            .ok_or_else(|| type_mismatch(operands.token(), &needle, &haystack))?,
        _ => return Err(type_mismatch(operands.token(), &needle, &haystack)),
    };
    Ok(Value::Boolean(found))
}

pub(crate) fn compare(operands: &Operands<'_>, context: &Context) -> Result<Value, EvalError> {
    let token = operands.token();
    let (left, right) = (operands.left(context)?, operands.right(context)?);

    let result = match token {
        "==" | "is" => left == right,
        "!=" => left != right,
        "<" | "<=" | ">" | ">=" => {
            let ordering = left
                .try_cmp(&right)
                .map_err(|()| type_mismatch(token, &left, &right))?;
            match (token, ordering) {
                (_, None) => false,
                ("<", Some(o)) => o.is_lt(),
                ("<=", Some(o)) => o.is_le(),
                (">", Some(o)) => o.is_gt(),
                (_, Some(o)) => o.is_ge(),
            }
        }
        _ => {
            return Err(EvalError::AbstractTokenResolved {
                token: token.to_string(),
            });
        }
    };
    Ok(Value::Boolean(result))
}

fn type_mismatch(token: &str, left: &Value, right: &Value) -> EvalError {
    EvalError::TypeMismatch {
        operator: token.to_string(),
        left: left.type_name(),
        right: right.type_name(),
    }
}
