//! Dependency condition evaluation.
//!
//! This module evaluates a single dependency operator against the current
//! value of a field:
//! - Equality on normalized values (`equals`, `not_equals`)
//! - Membership / substring tests (`contains`, `not_contains`)
//! - Numeric comparisons (`greater_than`, `less_than`)
//! - Emptiness checks (`is_empty`, `is_not_empty`)
//!
//! Evaluation never fails. A type mismatch makes the operator's positive
//! branch false, so stale or malformed configuration hides a dependent
//! field instead of breaking the form.

use forma_core::FormData;
use forma_core::config::{ConditionKind, FieldDependency};
use serde_json::Value;

/// Evaluates dependency conditions against form data.
#[derive(Debug, Clone, Copy)]
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// Create a new condition evaluator.
    pub fn new() -> Self {
        Self
    }

    /// Evaluate a condition. An absent operand is treated as `null`.
    pub fn evaluate(
        &self,
        condition: ConditionKind,
        left: Option<&Value>,
        right: Option<&Value>,
    ) -> bool {
        let left = left.unwrap_or(&Value::Null);
        let right = right.unwrap_or(&Value::Null);

        match condition {
            ConditionKind::Equals => values_equal(left, right),
            ConditionKind::NotEquals => !values_equal(left, right),
            ConditionKind::Contains => self.contains(left, right),
            ConditionKind::NotContains => !self.contains(left, right),
            ConditionKind::GreaterThan => match (as_number(left), as_number(right)) {
                (Some(l), Some(r)) => l > r,
                _ => false,
            },
            ConditionKind::LessThan => match (as_number(left), as_number(right)) {
                (Some(l), Some(r)) => l < r,
                _ => false,
            },
            ConditionKind::IsEmpty => is_empty(left),
            ConditionKind::IsNotEmpty => !is_empty(left),
        }
    }

    /// Evaluate a field dependency against the target field's value in `data`.
    pub fn evaluate_dependency(&self, dependency: &FieldDependency, data: &FormData) -> bool {
        self.evaluate(
            dependency.condition,
            data.get(&dependency.depends_on),
            dependency.value.as_ref(),
        )
    }

    /// Membership for sequences, substring for strings, false otherwise.
    fn contains(&self, haystack: &Value, needle: &Value) -> bool {
        match haystack {
            Value::Array(items) => items.iter().any(|item| values_equal(item, needle)),
            Value::String(s) => needle.as_str().map(|n| s.contains(n)).unwrap_or(false),
            _ => false,
        }
    }
}

impl Default for ConditionEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// Structural equality with numbers compared by value, so `1` equals `1.0`.
/// Values of different kinds are never equal.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                x == y
            } else if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                x == y
            } else {
                match (x.as_f64(), y.as_f64()) {
                    (Some(x), Some(y)) => x == y,
                    _ => false,
                }
            }
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| values_equal(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).map(|w| values_equal(v, w)).unwrap_or(false))
        }
        _ => false,
    }
}

/// Numeric view of a value. Numeric strings count, since form inputs
/// usually arrive as text.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

/// Absent, null, empty string, or empty sequence.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ALL: [ConditionKind; 8] = [
        ConditionKind::Equals,
        ConditionKind::NotEquals,
        ConditionKind::Contains,
        ConditionKind::NotContains,
        ConditionKind::GreaterThan,
        ConditionKind::LessThan,
        ConditionKind::IsEmpty,
        ConditionKind::IsNotEmpty,
    ];

    fn eval(condition: ConditionKind, left: Value, right: Value) -> bool {
        ConditionEvaluator::new().evaluate(condition, Some(&left), Some(&right))
    }

    #[test]
    fn test_equals_normalizes_numbers() {
        assert!(eval(ConditionKind::Equals, json!(1), json!(1.0)));
        assert!(eval(ConditionKind::Equals, json!("cloud"), json!("cloud")));
        assert!(eval(ConditionKind::Equals, json!(true), json!(true)));
        assert!(eval(ConditionKind::Equals, json!([1, "a"]), json!([1.0, "a"])));
        assert!(!eval(ConditionKind::Equals, json!("Cloud"), json!("cloud")));
    }

    #[test]
    fn test_equals_different_kinds_are_unequal() {
        assert!(!eval(ConditionKind::Equals, json!("1"), json!(1)));
        assert!(!eval(ConditionKind::Equals, json!(true), json!("true")));
        assert!(!eval(ConditionKind::Equals, json!(0), json!(false)));
        assert!(eval(ConditionKind::NotEquals, json!("1"), json!(1)));
    }

    #[test]
    fn test_contains_sequence_and_string() {
        assert!(eval(ConditionKind::Contains, json!(["gdpr", "hipaa"]), json!("hipaa")));
        assert!(!eval(ConditionKind::Contains, json!(["gdpr"]), json!("hipaa")));
        assert!(eval(ConditionKind::Contains, json!("multi-cloud"), json!("cloud")));
        assert!(eval(ConditionKind::NotContains, json!("on_premise"), json!("cloud")));
    }

    #[test]
    fn test_contains_on_other_types_fails_open_to_not_contains() {
        for left in [json!(42), json!(true), json!(null), json!({"a": 1})] {
            assert!(!eval(ConditionKind::Contains, left.clone(), json!("a")));
            assert!(eval(ConditionKind::NotContains, left, json!("a")));
        }
        // Non-string needle in a string haystack
        assert!(!eval(ConditionKind::Contains, json!("123"), json!(2)));
    }

    #[test]
    fn test_numeric_comparisons() {
        assert!(eval(ConditionKind::GreaterThan, json!(10), json!(5)));
        assert!(!eval(ConditionKind::GreaterThan, json!(5), json!(5)));
        assert!(eval(ConditionKind::LessThan, json!(2.5), json!(3)));
        assert!(eval(ConditionKind::GreaterThan, json!(" 100 "), json!(99)));
    }

    #[test]
    fn test_non_numeric_left_operand_is_false() {
        assert!(!eval(ConditionKind::GreaterThan, json!("lots"), json!(5)));
        assert!(!eval(ConditionKind::LessThan, json!("lots"), json!(5)));
        assert!(!eval(ConditionKind::GreaterThan, json!(true), json!(0)));
        assert!(!eval(ConditionKind::LessThan, json!(null), json!(5)));
        assert!(!eval(ConditionKind::GreaterThan, json!(5), json!("five")));
    }

    #[test]
    fn test_emptiness() {
        let evaluator = ConditionEvaluator::new();
        assert!(evaluator.evaluate(ConditionKind::IsEmpty, None, None));
        for empty in [json!(null), json!(""), json!([])] {
            assert!(eval(ConditionKind::IsEmpty, empty.clone(), Value::Null));
            assert!(!eval(ConditionKind::IsNotEmpty, empty, Value::Null));
        }
        for filled in [json!(" "), json!(0), json!(false), json!(["x"]), json!({})] {
            assert!(eval(ConditionKind::IsNotEmpty, filled, Value::Null));
        }
    }

    #[test]
    fn test_never_panics_on_any_operand_combination() {
        let operands = [
            json!(null),
            json!(true),
            json!(-3),
            json!(1.5),
            json!(""),
            json!("text"),
            json!([]),
            json!([1, "two"]),
            json!({"k": "v"}),
        ];
        let evaluator = ConditionEvaluator::new();
        for condition in ALL {
            for left in &operands {
                for right in &operands {
                    let _ = evaluator.evaluate(condition, Some(left), Some(right));
                }
                let _ = evaluator.evaluate(condition, Some(left), None);
            }
            let _ = evaluator.evaluate(condition, None, None);
        }
    }

    #[test]
    fn test_evaluate_dependency_reads_target_field() {
        let evaluator = ConditionEvaluator::new();
        let dependency =
            FieldDependency::new("deployment_type", ConditionKind::Equals, json!("cloud"));

        let mut data = FormData::new();
        data.insert("deployment_type".to_string(), json!("on_premise"));
        assert!(!evaluator.evaluate_dependency(&dependency, &data));

        data.insert("deployment_type".to_string(), json!("cloud"));
        assert!(evaluator.evaluate_dependency(&dependency, &data));

        assert!(!evaluator.evaluate_dependency(&dependency, &FormData::new()));
    }
}
