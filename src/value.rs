use std::{cmp::Ordering, collections::HashMap, fmt, sync::Arc};

/// Error type returned by a failing zero-argument method on an [`Entity`].
pub type MethodError = Box<dyn std::error::Error + Send + Sync>;

/// A runtime value flowing through expression evaluation.
///
/// Scalars and containers mirror JSON, with integers kept apart from floats.
/// `Entity` is an opaque handle to a caller-owned object exposing attributes
/// (a user, a review request, ...), looked up by name during variable
/// resolution.
///
/// # Examples
///
/// ```
/// use policy_expr::Value;
/// use std::collections::HashMap;
///
/// let integer = Value::Integer(42);
/// let string = Value::from("hello");
/// let array = Value::Array(vec![Value::Integer(1), Value::Integer(2)]);
///
/// let mut obj = HashMap::new();
/// obj.insert("key".to_string(), Value::from("value"));
/// let object = Value::Object(obj);
///
/// assert!(integer.is_truthy());
/// assert!(!Value::from("").is_truthy());
/// ```
#[derive(Debug, Clone)]
pub enum Value {
    /// Absent value (JSON null)
    Null,

    /// Boolean (true/false)
    Boolean(bool),

    /// Floating-point number
    Float(f64),

    /// Integer number (preserved separately from floats)
    Integer(i64),

    /// UTF-8 string
    String(String),

    /// Indexable sequence of values
    Array(Vec<Value>),

    /// Mapping with string keys
    Object(HashMap<String, Value>),

    /// Attribute-bearing object supplied by the caller
    Entity(Arc<dyn Entity>),
}

/// The result of looking up an attribute on an [`Entity`].
pub enum Attribute<'a> {
    /// A plain attribute value.
    Value(Value),

    /// A zero-argument method. Resolution invokes it; a failure turns the
    /// looked-up value into an empty string.
    Method(Box<dyn FnOnce() -> Result<Value, MethodError> + 'a>),
}

impl fmt::Debug for Attribute<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Attribute::Method(_) => f.write_str("Method(..)"),
        }
    }
}

/// A caller-owned object that expressions can reach through dotted names.
///
/// Only [`Entity::attribute`] is required. The other lookups default to
/// "not supported", which makes resolution fall through to the next strategy.
pub trait Entity: fmt::Debug + Send + Sync {
    /// Name used in error messages.
    fn type_name(&self) -> &'static str {
        "entity"
    }

    /// Key lookup, tried first (`entity.key`).
    fn item(&self, _key: &str) -> Option<Value> {
        None
    }

    /// Attribute lookup, tried when key lookup fails.
    fn attribute(&self, name: &str) -> Option<Attribute<'_>>;

    /// Integer-index lookup, tried last (`entity.0`).
    fn index(&self, _index: i64) -> Option<Value> {
        None
    }

    /// Membership test for `needle in entity`. `None` means unsupported.
    fn contains(&self, _needle: &Value) -> Option<bool> {
        None
    }
}

impl Value {
    /// Wraps a caller object as a value.
    pub fn entity(entity: impl Entity + 'static) -> Self {
        Value::Entity(Arc::new(entity))
    }

    /// Check if the value is truthy (for conditions)
    pub fn is_truthy(&self) -> bool {
        use Value::*;
        match self {
            Null => false,
            Boolean(b) => *b,
            Float(n) => *n != 0.0,
            Integer(n) => *n != 0,
            String(s) => !s.is_empty(),
            Array(arr) => !arr.is_empty(),
            Object(obj) => !obj.is_empty(),
            Entity(_) => true,
        }
    }

    /// Returns a human-readable type name
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Entity(e) => e.type_name(),
        }
    }

    /// Get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Orders two values of comparable types.
    ///
    /// Numbers compare across integer/float, strings and booleans compare
    /// among themselves and arrays compare lexicographically. `Ok(None)` is
    /// returned for unordered floats (NaN); `Err(())` for incomparable types.
    pub(crate) fn try_cmp(&self, other: &Value) -> Result<Option<Ordering>, ()> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Ok(Some(a.cmp(b))),
            (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
                match (self.as_float(), other.as_float()) {
                    (Some(a), Some(b)) => Ok(a.partial_cmp(&b)),
                    _ => Err(()),
                }
            }
            (Value::String(a), Value::String(b)) => Ok(Some(a.cmp(b))),
            (Value::Boolean(a), Value::Boolean(b)) => Ok(Some(a.cmp(b))),
            (Value::Array(a), Value::Array(b)) => {
                for (x, y) in a.iter().zip(b) {
                    match x.try_cmp(y)? {
                        Some(Ordering::Equal) => continue,
                        other => return Ok(other),
                    }
                }
                Ok(Some(a.len().cmp(&b.len())))
            }
            _ => Err(()),
        }
    }

    /// Zero-argument methods built into the core value types.
    pub(crate) fn builtin_attribute(&self, name: &str) -> Option<Attribute<'_>> {
        let value = match (self, name) {
            (Value::String(s), "lower") => Value::String(s.to_lowercase()),
            (Value::String(s), "upper") => Value::String(s.to_uppercase()),
            (Value::String(s), "strip") => Value::String(s.trim().to_string()),
            (Value::Object(map), "keys") => {
                Value::Array(sorted_entries(map).map(|(k, _)| Value::from(k.as_str())).collect())
            }
            (Value::Object(map), "values") => {
                Value::Array(sorted_entries(map).map(|(_, v)| v.clone()).collect())
            }
            (Value::Object(map), "items") => Value::Array(
                sorted_entries(map)
                    .map(|(k, v)| Value::Array(vec![Value::from(k.as_str()), v.clone()]))
                    .collect(),
            ),
            _ => return None,
        };
        Some(Attribute::Method(Box::new(move || Ok::<_, MethodError>(value))))
    }
}

fn sorted_entries(map: &HashMap<String, Value>) -> impl Iterator<Item = (&String, &Value)> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries.into_iter()
}

/// Numbers compare across integer/float, and booleans equal `0` and `1`.
/// Ordering and arithmetic still reject booleans mixed with numbers.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Boolean(b), Value::Integer(n)) | (Value::Integer(n), Value::Boolean(b)) => {
                *n == i64::from(*b)
            }
            (Value::Boolean(b), Value::Float(f)) | (Value::Float(f), Value::Boolean(b)) => {
                *f == f64::from(u8::from(*b))
            }
            (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
                self.as_float() == other.as_float()
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Entity(a), Value::Entity(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{:?}", n),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Array(arr) => {
                write!(f, "[")?;
                for (i, item) in arr.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Object(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in sorted_entries(map).enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Entity(e) => write!(f, "<{} {:?}>", e.type_name(), e),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Object(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Integer(0).is_truthy());
        assert!(Value::Integer(-3).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
        assert!(!Value::Array(vec![]).is_truthy());
        assert!(Value::from(vec![1_i64]).is_truthy());
    }

    #[test]
    fn test_numeric_equality_crosses_types() {
        assert_eq!(Value::Integer(2), Value::Float(2.0));
        assert_eq!(Value::Integer(1), Value::Boolean(true));
        assert_eq!(Value::Boolean(false), Value::Float(0.0));
        assert_ne!(Value::Integer(2), Value::Boolean(true));
        assert_ne!(Value::Boolean(true), Value::from("1"));
        assert_ne!(Value::from("1"), Value::Integer(1));
    }

    #[test]
    fn test_try_cmp() {
        assert_eq!(
            Value::Integer(1).try_cmp(&Value::Float(1.5)),
            Ok(Some(Ordering::Less))
        );
        assert_eq!(
            Value::from(vec![1_i64, 2]).try_cmp(&Value::from(vec![1_i64])),
            Ok(Some(Ordering::Greater))
        );
        assert_eq!(Value::Float(f64::NAN).try_cmp(&Value::Integer(1)), Ok(None));
        assert!(Value::from("a").try_cmp(&Value::Integer(1)).is_err());
    }

    #[test]
    fn test_display() {
        let obj: Value = [("b", Value::Integer(2)), ("a", Value::from("x"))]
            .into_iter()
            .collect();
        assert_eq!(obj.to_string(), r#"{"a": "x", "b": 2}"#);
        assert_eq!(Value::Float(4.0).to_string(), "4.0");
    }
}
