//! Structural equality over canonical values.

use tenet_core::Value;

/// Structural equality after normalizing representations: numbers compare
/// numerically (a numeric string equals the number), dates by instant,
/// association ids like strings, collections element-wise.
pub fn eq(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,

        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::Number(a), other) | (other, Value::Number(a)) => {
            other.as_f64().is_some_and(|b| *a == b)
        }

        (Value::Bool(a), other) | (other, Value::Bool(a)) => other.as_bool() == Some(*a),

        (Value::Date(a), other) | (other, Value::Date(a)) => other.as_instant() == Some(*a),

        (Value::Record(a), Value::Record(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, value)| b.get(key).is_some_and(|other| eq(value, other)))
        }
        (Value::Record(_), _) | (_, Value::Record(_)) => false,

        (Value::List(_) | Value::RefList(_), Value::List(_) | Value::RefList(_)) => {
            match (actual.elements(), expected.elements()) {
                (Some(a), Some(b)) => a.len() == b.len() && a.iter().zip(&b).all(|(x, y)| eq(x, y)),
                _ => false,
            }
        }
        (Value::List(_) | Value::RefList(_), _) | (_, Value::List(_) | Value::RefList(_)) => false,

        _ => match (actual.as_str(), expected.as_str()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
    }
}

pub fn neq(actual: &Value, expected: &Value) -> bool {
    !eq(actual, expected)
}
