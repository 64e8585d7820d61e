use policy_expr::{
    Attribute, Context, Entity, Error, EvalError, Expression, MethodError, Value, evaluate,
};
use proptest::prelude::*;
use std::collections::HashMap;

fn eval(source: &str, ctx: &Context) -> Result<Value, String> {
    evaluate(source, ctx).map_err(|e| format!("{:?}", e))
}

fn json_object(pairs: Vec<(&str, Value)>) -> Value {
    let mut map = HashMap::new();
    for (k, v) in pairs {
        map.insert(k.to_string(), v);
    }
    Value::Object(map)
}

fn json_array(values: Vec<Value>) -> Value {
    Value::Array(values)
}

#[derive(Debug)]
struct User {
    username: String,
    groups: Vec<String>,
}

impl Entity for User {
    fn type_name(&self) -> &'static str {
        "user"
    }

    fn attribute(&self, name: &str) -> Option<Attribute<'_>> {
        match name {
            "username" => Some(Attribute::Value(Value::from(self.username.as_str()))),
            "groups" => Some(Attribute::Value(Value::from(
                self.groups.iter().map(String::as_str).collect::<Vec<_>>(),
            ))),
            "is_staff" => Some(Attribute::Method(Box::new(move || {
                Ok::<_, MethodError>(Value::Boolean(self.groups.iter().any(|g| g == "staff")))
            }))),
            "get_profile" => Some(Attribute::Method(Box::new(|| {
                Err::<Value, MethodError>("profile requires a site".into())
            }))),
            _ => None,
        }
    }

    fn contains(&self, needle: &Value) -> Option<bool> {
        needle.as_str().map(|g| self.groups.iter().any(|x| x == g))
    }
}

#[derive(Debug)]
struct Settings;

impl Entity for Settings {
    fn item(&self, key: &str) -> Option<Value> {
        (key == "mode").then(|| Value::from("item"))
    }

    fn attribute(&self, name: &str) -> Option<Attribute<'_>> {
        matches!(name, "mode" | "limit").then(|| Attribute::Value(Value::from("attribute")))
    }

    fn index(&self, index: i64) -> Option<Value> {
        (index == 7).then(|| Value::Integer(index * 6))
    }
}

fn user_context() -> Context {
    Context::new().with(
        "user",
        Value::entity(User {
            username: "admin".to_string(),
            groups: vec!["staff".to_string(), "reviewers".to_string()],
        }),
    )
}

// ============================================================================
// Literals and arithmetic
// ============================================================================

#[test]
fn test_arithmetic_precedence() {
    let ctx = Context::new();
    assert_eq!(eval("2 + 3 * 4", &ctx).unwrap(), Value::Integer(14));
    assert_eq!(eval("(2 + 3) * 4", &ctx).unwrap(), Value::Integer(20));
    assert_eq!(eval("10 - 2 - 3", &ctx).unwrap(), Value::Integer(5));
}

#[test]
fn test_number_literals() {
    let ctx = Context::new();
    assert!(matches!(eval("42", &ctx).unwrap(), Value::Integer(42)));
    assert!(matches!(eval("4.2", &ctx).unwrap(), Value::Float(f) if f == 4.2));
    assert!(matches!(eval("2e2", &ctx).unwrap(), Value::Float(f) if f == 200.0));
}

#[test]
fn test_trailing_dot_is_rejected() {
    assert!(eval("2.", &Context::new()).is_err());
}

#[test]
fn test_string_literal_unescaping() {
    let ctx = Context::new();
    assert_eq!(eval(r#""ab\"c""#, &ctx).unwrap(), Value::from("ab\"c"));
    assert_eq!(eval("'single'", &ctx).unwrap(), Value::from("single"));
}

#[test]
fn test_string_concatenation() {
    let ctx = Context::new()
        .with("first", "John")
        .with("last", "Doe");
    assert_eq!(
        eval(r#"first + " " + last"#, &ctx).unwrap(),
        Value::from("John Doe")
    );
}

fn float_result(source: &str, ctx: &Context) -> f64 {
    match evaluate(source, ctx) {
        Ok(Value::Float(f)) => f,
        other => panic!("Expected a float from {}, got {:?}", source, other),
    }
}

#[test]
fn test_decimal_float_arithmetic() {
    let ctx = Context::new();
    assert_eq!(float_result("0.1 + 0.2", &ctx), 0.3);
    assert_eq!(float_result("1.1 * 3", &ctx), 3.3);
}

#[test]
fn test_float_arithmetic_outside_decimal_range() {
    let ctx = Context::new();
    assert_eq!(float_result("1e-30 + 0.0", &ctx), 1e-30);
    assert_eq!(float_result("1e-20 * 1e-20", &ctx), 1e-20 * 1e-20);
    assert_eq!(
        float_result("1.0000000000000002 - 1", &ctx),
        1.0000000000000002_f64 - 1.0
    );
    assert_eq!(float_result("1e300 * 10", &ctx), 1e301);
    assert_eq!(eval("1e-30 + 0.0 > 0", &ctx).unwrap(), Value::Boolean(true));
}

#[test]
fn test_sequence_repetition_counts() {
    let ctx = Context::new().with("items", json_array(vec![Value::Integer(1), Value::Integer(2)]));
    assert_eq!(eval("'ab' * 0", &ctx).unwrap(), Value::from(""));
    assert_eq!(eval("'ab' * (0 - 3)", &ctx).unwrap(), Value::from(""));
    assert_eq!(eval("items * 0", &ctx).unwrap(), json_array(vec![]));
    assert_eq!(eval("(0 - 1) * items", &ctx).unwrap(), json_array(vec![]));
    assert_eq!(
        eval("items * 2", &ctx).unwrap(),
        json_array(vec![Value::Integer(1), Value::Integer(2), Value::Integer(1), Value::Integer(2)])
    );
    assert_eq!(eval("'' * 9223372036854775807", &ctx).unwrap(), Value::from(""));
}

#[test]
fn test_oversized_repetition_fails() {
    let ctx = Context::new().with("items", json_array(vec![Value::Integer(1)]));
    for source in [
        "'ab' * 9223372036854775807",
        "9223372036854775807 * 'ab'",
        "items * 9223372036854775807",
        "'ab' * 100000000",
    ] {
        assert_eq!(
            evaluate(source, &ctx),
            Err(Error::Eval(EvalError::Overflow {
                operator: "*".to_string()
            })),
            "Failed for input: {}",
            source
        );
    }
    assert!(matches!(
        evaluate("'ab' / 9223372036854775807", &ctx),
        Err(Error::Eval(EvalError::Overflow { .. }))
    ));
}

// ============================================================================
// Variable resolution
// ============================================================================

#[test]
fn test_mapping_path() {
    let ctx = Context::new().with("a", json_object(vec![("b", Value::Integer(5))]));
    assert_eq!(eval("a.b", &ctx).unwrap(), Value::Integer(5));
}

#[test]
fn test_attribute_path() {
    let ctx = user_context();
    assert_eq!(eval("user.username", &ctx).unwrap(), Value::from("admin"));
}

#[test]
fn test_method_attribute_is_called() {
    let ctx = user_context();
    assert_eq!(eval("user.is_staff", &ctx).unwrap(), Value::Boolean(true));
}

#[test]
fn test_failing_method_becomes_empty_string() {
    let ctx = user_context();
    assert_eq!(eval("user.get_profile", &ctx).unwrap(), Value::from(""));
    assert_eq!(eval("user.get_profile == ''", &ctx).unwrap(), Value::Boolean(true));
}

#[test]
fn test_sequence_index() {
    let ctx = Context::new().with(
        "a",
        json_array(vec![Value::from("first"), Value::from("second")]),
    );
    assert_eq!(eval("a.0", &ctx).unwrap(), Value::from("first"));
    assert_eq!(eval("a.1", &ctx).unwrap(), Value::from("second"));
}

#[test]
fn test_index_into_entity_attribute() {
    let ctx = user_context();
    assert_eq!(eval("user.groups.1", &ctx).unwrap(), Value::from("reviewers"));
}

#[test]
fn test_string_index() {
    let ctx = Context::new().with("s", "abc");
    assert_eq!(eval("s.2", &ctx).unwrap(), Value::from("c"));
}

#[test]
fn test_lookup_order_item_before_attribute_before_index() {
    let ctx = Context::new().with("settings", Value::entity(Settings));
    assert_eq!(eval("settings.mode", &ctx).unwrap(), Value::from("item"));
    assert_eq!(eval("settings.limit", &ctx).unwrap(), Value::from("attribute"));
    assert_eq!(eval("settings.7", &ctx).unwrap(), Value::Integer(42));
}

#[test]
fn test_digit_keys_prefer_mapping_lookup() {
    let ctx = Context::new().with("a", json_object(vec![("0", Value::from("key"))]));
    assert_eq!(eval("a.0", &ctx).unwrap(), Value::from("key"));
}

#[test]
fn test_builtin_attributes() {
    let ctx = Context::new()
        .with("name", "  Alice ")
        .with("meta", json_object(vec![("b", Value::Integer(2)), ("a", Value::Integer(1))]));
    assert_eq!(eval("name.strip.lower", &ctx).unwrap(), Value::from("alice"));
    assert_eq!(eval("name.upper", &ctx).unwrap(), Value::from("  ALICE "));
    assert_eq!(
        eval("meta.keys", &ctx).unwrap(),
        json_array(vec![Value::from("a"), Value::from("b")])
    );
    assert_eq!(eval("'a' in meta.keys", &ctx).unwrap(), Value::Boolean(true));
    assert_eq!(
        eval("meta.values", &ctx).unwrap(),
        json_array(vec![Value::Integer(1), Value::Integer(2)])
    );
}

#[test]
fn test_unresolvable_segment() {
    let ctx = Context::new().with("a", json_object(vec![("b", Value::Integer(5))]));
    match evaluate("a.z", &ctx) {
        Err(Error::Eval(EvalError::VariableNotFound { segment, value })) => {
            assert_eq!(segment, "z");
            assert_eq!(value, r#"{"b": 5}"#);
        }
        other => panic!("Expected VariableNotFound, got {:?}", other),
    }
}

#[test]
fn test_unknown_top_level_name() {
    let ctx = Context::new().with("a", 1_i64);
    assert!(matches!(
        evaluate("b", &ctx),
        Err(Error::Eval(EvalError::VariableNotFound { ref segment, .. })) if segment == "b"
    ));
}

#[test]
fn test_index_out_of_range() {
    let ctx = Context::new().with("a", json_array(vec![Value::Integer(1)]));
    assert!(matches!(
        evaluate("a.5", &ctx),
        Err(Error::Eval(EvalError::VariableNotFound { ref segment, .. })) if segment == "5"
    ));
}

// ============================================================================
// Boolean composition
// ============================================================================

#[test]
fn test_and_of_comparisons() {
    let ctx = Context::new().with("a", 1_i64).with("b", 2_i64);
    assert_eq!(eval("a == 1 and b == 2", &ctx).unwrap(), Value::Boolean(true));
    assert_eq!(eval("a == 1 && b == 3", &ctx).unwrap(), Value::Boolean(false));
    assert_eq!(eval("a == 2 || b == 2", &ctx).unwrap(), Value::Boolean(true));
}

#[test]
fn test_negation() {
    let ctx = Context::new().with("a", 1_i64).with("b", 2_i64);
    assert_eq!(eval("not (a == 1)", &ctx).unwrap(), Value::Boolean(false));
    assert_eq!(eval("not b", &ctx).unwrap(), Value::Boolean(false));
    assert_eq!(eval("not ''", &ctx).unwrap(), Value::Boolean(true));
}

#[test]
fn test_chained_comparison_is_right_nested() {
    // 3 < (2 < 1) compares an integer with a boolean
    let ctx = Context::new();
    assert!(matches!(
        evaluate("3 < 2 < 1", &ctx),
        Err(Error::Eval(EvalError::TypeMismatch { .. }))
    ));
    let ctx = Context::new().with("flag", true);
    assert_eq!(eval("flag == (1 < 2)", &ctx).unwrap(), Value::Boolean(true));
}

#[test]
fn test_booleans_equal_zero_and_one() {
    let ctx = Context::new().with("flag", true);
    assert_eq!(eval("1 == (1 == 1)", &ctx).unwrap(), Value::Boolean(true));
    assert_eq!(eval("flag == 1", &ctx).unwrap(), Value::Boolean(true));
    assert_eq!(eval("flag is 1.0", &ctx).unwrap(), Value::Boolean(true));
    assert_eq!(eval("0 == (1 == 2)", &ctx).unwrap(), Value::Boolean(true));
    assert_eq!(eval("flag != 2", &ctx).unwrap(), Value::Boolean(true));
    assert_eq!(eval("flag == 'True'", &ctx).unwrap(), Value::Boolean(false));
}

// ============================================================================
// Membership
// ============================================================================

#[test]
fn test_in_array() {
    let ctx = Context::new().with(
        "groups",
        json_array(vec![Value::from("staff"), Value::from("admins")]),
    );
    assert_eq!(eval("'admins' in groups", &ctx).unwrap(), Value::Boolean(true));
    assert_eq!(eval("'guests' in groups", &ctx).unwrap(), Value::Boolean(false));
}

#[test]
fn test_in_object_keys() {
    let ctx = Context::new().with("flags", json_object(vec![("beta", Value::Boolean(false))]));
    assert_eq!(eval("'beta' in flags", &ctx).unwrap(), Value::Boolean(true));
    assert_eq!(eval("1 in flags", &ctx).unwrap(), Value::Boolean(false));
}

#[test]
fn test_in_entity() {
    let ctx = user_context();
    assert_eq!(eval("'reviewers' in user", &ctx).unwrap(), Value::Boolean(true));
    assert_eq!(eval("'reviewers' in user.groups", &ctx).unwrap(), Value::Boolean(true));
    assert!(evaluate("1 in user", &ctx).is_err());
}

// ============================================================================
// Expression reuse and purity
// ============================================================================

#[test]
fn test_expression_against_many_contexts() {
    let expr = Expression::parse("attempts < 3").unwrap();
    assert_eq!(expr.source(), "attempts < 3");
    assert_eq!(
        expr.resolve(&Context::new().with("attempts", 1_i64)).unwrap(),
        Value::Boolean(true)
    );
    assert_eq!(
        expr.resolve(&Context::new().with("attempts", 5_i64)).unwrap(),
        Value::Boolean(false)
    );
}

#[test]
fn test_evaluation_is_idempotent() {
    let ctx = user_context().with("a", json_object(vec![("b", Value::Integer(5))]));
    let before = ctx.clone();
    let first = eval("a.b * 2 == 10 and 'staff' in user.groups", &ctx).unwrap();
    let second = eval("a.b * 2 == 10 and 'staff' in user.groups", &ctx).unwrap();
    assert_eq!(first, second);
    assert_eq!(ctx, before);
}

#[test]
fn test_shared_types_are_thread_safe() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Value>();
    assert_send_sync::<Context>();
    assert_send_sync::<Expression>();
    assert_send_sync::<policy_expr::Node>();
    assert_send_sync::<policy_expr::Registry>();
}

#[test]
fn test_concurrent_evaluation() {
    let ctx = Context::new().with("n", 21_i64);
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| evaluate("n * 2", &ctx).unwrap()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), Value::Integer(42));
        }
    });
}

proptest! {
    #[test]
    fn arithmetic_matches_native(a in -1000i64..1000, b in -1000i64..1000, c in -1000i64..1000) {
        let ctx = Context::new().with("a", a).with("b", b).with("c", c);
        prop_assert_eq!(evaluate("a + b * c", &ctx).unwrap(), Value::Integer(a + b * c));
        prop_assert_eq!(evaluate("(a - b) * c", &ctx).unwrap(), Value::Integer((a - b) * c));
    }

    #[test]
    fn float_arithmetic_matches_native(
        a in prop_oneof![-1e12f64..1e12, -1e-12f64..1e-12],
        b in prop_oneof![-1e12f64..1e12, -1e-12f64..1e-12],
    ) {
        let ctx = Context::new().with("a", a).with("b", b);
        for (source, native) in [("a + b", a + b), ("a - b", a - b), ("a * b", a * b)] {
            let result = float_result(source, &ctx);
            let tolerance = 1e-12 * (a.abs() + b.abs() + native.abs());
            prop_assert!(
                result == native || (result - native).abs() <= tolerance,
                "{} with a={:?} b={:?}: {:?} vs native {:?}", source, a, b, result, native
            );
            prop_assert_eq!(result == 0.0, native == 0.0);
        }
    }

    #[test]
    fn float_literals_match_native(a in 0f64..1e6, b in 1e-9f64..1e-3) {
        let ctx = Context::new();
        let result = float_result(&format!("{:?} + {:?}", a, b), &ctx);
        prop_assert!((result - (a + b)).abs() <= 1e-12 * (a + b));
    }

    #[test]
    fn evaluation_is_repeatable(source in "[a-c0-9 ()+*<=!-]{0,24}") {
        let ctx = Context::new().with("a", 1_i64).with("b", 2_i64).with("c", 3_i64);
        prop_assert_eq!(evaluate(&source, &ctx), evaluate(&source, &ctx));
    }
}
