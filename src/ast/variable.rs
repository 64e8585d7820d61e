use std::borrow::Cow;

use crate::{
    context::Context,
    error::EvalError,
    value::{Attribute, Value},
};

const LOG_TARGET: &str = "policy_expr::resolver";

/// A leaf of the expression tree.
///
/// The token is classified once, when the node is built:
///
/// 1. a number (`42` is an integer, `4.2` and `1e3` are floats, `2.` is not a number)
/// 2. a quoted string (`'P'`, `"it\"s"`)
/// 3. otherwise a dotted name (`review_request.submitter.username`), split
///    into segments and looked up when the tree is resolved
///
/// # Examples
///
/// ```
/// use policy_expr::ast::Variable;
/// use policy_expr::{Context, Value};
///
/// assert_eq!(Variable::new("42").literal(), Some(&Value::Integer(42)));
/// assert_eq!(Variable::new("'P'").literal(), Some(&Value::from("P")));
///
/// let var = Variable::new("user.name");
/// assert_eq!(var.lookups(), Some(&["user".to_string(), "name".to_string()][..]));
///
/// let ctx = Context::new().with("user", [("name", "admin")].into_iter().collect::<Value>());
/// assert_eq!(var.resolve(&ctx).unwrap(), Value::from("admin"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    name: String,
    kind: Kind,
}

#[derive(Debug, Clone, PartialEq)]
enum Kind {
    Literal(Value),
    Lookup(Vec<String>),
}

impl Variable {
    pub fn new(token: &str) -> Self {
        let kind = if let Some(number) = parse_number(token) {
            Kind::Literal(number)
        } else if let Some(s) = unescape_string_literal(token) {
            Kind::Literal(Value::String(s))
        } else {
            Kind::Lookup(token.split('.').map(str::to_string).collect())
        };

        Variable {
            name: token.to_string(),
            kind,
        }
    }

    /// The source token.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn literal(&self) -> Option<&Value> {
        match &self.kind {
            Kind::Literal(value) => Some(value),
            Kind::Lookup(_) => None,
        }
    }

    pub fn lookups(&self) -> Option<&[String]> {
        match &self.kind {
            Kind::Literal(_) => None,
            Kind::Lookup(segments) => Some(segments),
        }
    }

    pub fn resolve(&self, context: &Context) -> Result<Value, EvalError> {
        match &self.kind {
            Kind::Literal(value) => Ok(value.clone()),
            Kind::Lookup(segments) => resolve_lookup(segments, context),
        }
    }
}

fn parse_number(token: &str) -> Option<Value> {
    // Restrict to numeric characters so names like `inf` or `nan` stay names.
    let numeric = token
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if !numeric || token.ends_with('.') {
        return None;
    }

    let float: f64 = token.parse().ok()?;
    if token.contains(['.', 'e', 'E']) {
        return Some(Value::Float(float));
    }

    Some(
        token
            .parse::<i64>()
            .map(Value::Integer)
            .unwrap_or(Value::Float(float)),
    )
}

/// Strips matching quotes and unescapes `\<quote>` and `\\`.
fn unescape_string_literal(token: &str) -> Option<String> {
    let quote = token.chars().next().filter(|c| matches!(c, '"' | '\''))?;
    if token.len() < 2 || !token.ends_with(quote) {
        return None;
    }

    let inner = &token[1..token.len() - 1];
    Some(
        inner
            .replace(&format!("\\{}", quote), &quote.to_string())
            .replace("\\\\", "\\"),
    )
}

fn resolve_lookup(segments: &[String], context: &Context) -> Result<Value, EvalError> {
    let Some((first, rest)) = segments.split_first() else {
        return Err(EvalError::VariableNotFound {
            segment: String::new(),
            value: context.to_string(),
        });
    };

    let mut current = match context.get(first) {
        Some(value) => Cow::Borrowed(value),
        None => {
            return Err(EvalError::VariableNotFound {
                segment: first.clone(),
                value: context.to_string(),
            });
        }
    };

    for segment in rest {
        current = match current {
            Cow::Borrowed(value) => lookup_segment(value, segment)?,
            Cow::Owned(value) => Cow::Owned(lookup_segment(&value, segment)?.into_owned()),
        };
    }

    Ok(current.into_owned())
}

/// One resolution step: key, then attribute, then integer index.
fn lookup_segment<'v>(current: &'v Value, segment: &str) -> Result<Cow<'v, Value>, EvalError> {
    if let Some(value) = lookup_item(current, segment) {
        return Ok(value);
    }

    if let Some(value) = lookup_attribute(current, segment) {
        return Ok(Cow::Owned(value));
    }

    if let Some(value) = lookup_index(current, segment) {
        return Ok(value);
    }

    Err(EvalError::VariableNotFound {
        segment: segment.to_string(),
        value: current.to_string(),
    })
}

fn lookup_item<'v>(current: &'v Value, key: &str) -> Option<Cow<'v, Value>> {
    match current {
        Value::Object(map) => map.get(key).map(Cow::Borrowed),
        Value::Entity(entity) => entity.item(key).map(Cow::Owned),
        _ => None,
    }
}

fn lookup_attribute(current: &Value, name: &str) -> Option<Value> {
    let attribute = match current {
        Value::Entity(entity) => entity.attribute(name),
        other => other.builtin_attribute(name),
    }?;

    Some(match attribute {
        Attribute::Value(value) => value,
        Attribute::Method(method) => match method() {
            Ok(value) => value,
            Err(err) => {
                // Methods that need arguments or fail degrade to an empty string.
                log::debug!(
                    target: LOG_TARGET,
                    "Method {} of {} failed: {}",
                    name,
                    current.type_name(),
                    err
                );
                Value::String(String::new())
            }
        },
    })
}

fn lookup_index<'v>(current: &'v Value, segment: &str) -> Option<Cow<'v, Value>> {
    let index: i64 = segment.parse().ok()?;

    match current {
        Value::Array(arr) => {
            let position = normalize_index(index, arr.len())?;
            arr.get(position).map(Cow::Borrowed)
        }
        Value::String(s) => {
            let position = normalize_index(index, s.chars().count())?;
            s.chars()
                .nth(position)
                .map(|c| Cow::Owned(Value::String(c.to_string())))
        }
        Value::Entity(entity) => entity.index(index).map(Cow::Owned),
        _ => None,
    }
}

/// Negative indices count from the end (-1 = last).
fn normalize_index(index: i64, len: usize) -> Option<usize> {
    if index < 0 {
        let back = usize::try_from(index.unsigned_abs()).ok()?;
        len.checked_sub(back)
    } else {
        usize::try_from(index).ok()
    }
}
