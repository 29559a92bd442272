use std::cmp::Ordering;

use serde_json::{Map, Number, Value};

use crate::ast::{Node, NodeKind, Operator};
use crate::error::RuleError;
use crate::field::FieldPath;

/// Evaluates a rule tree against a data record.
///
/// Logical and comparison operators yield booleans; a bare operand at the
/// root yields its resolved value.
pub fn evaluate(node: &Node, data: &Map<String, Value>) -> Result<Value, RuleError> {
    match node.kind {
        NodeKind::Operand => {
            if node.left.is_some() || node.right.is_some() {
                return Err(RuleError::MalformedAst(format!(
                    "operand '{}' cannot have children",
                    node.value
                )));
            }
            Ok(resolve_operand(&node.value, data))
        }
        NodeKind::Operator => {
            let op = Operator::parse(&node.value).ok_or_else(|| {
                RuleError::MalformedAst(format!("unsupported operator '{}'", node.value))
            })?;
            let left = child(node.left.as_deref(), op, "left")?;
            let right = child(node.right.as_deref(), op, "right")?;

            let left = evaluate(left, data)?;
            let right = evaluate(right, data)?;
            apply(op, &left, &right).map(Value::Bool)
        }
    }
}

fn child<'a>(node: Option<&'a Node>, op: Operator, side: &str) -> Result<&'a Node, RuleError> {
    node.ok_or_else(|| {
        RuleError::MalformedAst(format!("operator '{op}' is missing its {side} operand"))
    })
}

fn apply(op: Operator, left: &Value, right: &Value) -> Result<bool, RuleError> {
    match op {
        Operator::And => Ok(is_truthy(left) && is_truthy(right)),
        Operator::Or => Ok(is_truthy(left) || is_truthy(right)),
        Operator::Eq => Ok(values_equal(left, right)),
        Operator::NotEq => Ok(!values_equal(left, right)),
        Operator::Gt => order(op, left, right).map(Ordering::is_gt),
        Operator::Lt => order(op, left, right).map(Ordering::is_lt),
        Operator::Ge => order(op, left, right).map(Ordering::is_ge),
        Operator::Le => order(op, left, right).map(Ordering::is_le),
    }
}

/// Turns an operand token into a value.
///
/// Lookup order: exact key in the record, dotted path into the record,
/// quoted literal, integer, float, then the raw token as text.
pub fn resolve_operand(token: &str, data: &Map<String, Value>) -> Value {
    if let Some(value) = data.get(token) {
        return value.clone();
    }

    let path = FieldPath::new(token);
    if path.is_nested() {
        if let Some(value) = path.locate(data) {
            return value.clone();
        }
    }

    if token.starts_with('\'') && token.ends_with('\'') {
        return Value::String(token.trim_matches('\'').to_string());
    }

    if let Ok(int) = token.parse::<i64>() {
        return Value::Number(int.into());
    }

    if let Some(number) = token.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(number);
    }

    Value::String(token.to_string())
}

/// Falsy values: `null`, `false`, zero, empty strings, arrays and objects.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

#[derive(Debug, Clone, Copy)]
enum Numeric {
    Int(i64),
    Float(f64),
}

impl Numeric {
    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(flag) => Some(Numeric::Int(i64::from(*flag))),
            Value::Number(number) => number
                .as_i64()
                .map(Numeric::Int)
                .or_else(|| number.as_f64().map(Numeric::Float)),
            _ => None,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Numeric::Int(value) => value as f64,
            Numeric::Float(value) => value,
        }
    }

    fn compare(self, other: Numeric) -> Option<Ordering> {
        match (self, other) {
            (Numeric::Int(lhs), Numeric::Int(rhs)) => Some(lhs.cmp(&rhs)),
            (lhs, rhs) => lhs.as_f64().partial_cmp(&rhs.as_f64()),
        }
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Bool(lhs), Value::Bool(rhs)) => lhs == rhs,
        (Value::Number(_) | Value::Bool(_), Value::Number(_) | Value::Bool(_)) => {
            match (Numeric::of(left), Numeric::of(right)) {
                (Some(lhs), Some(rhs)) => lhs.compare(rhs) == Some(Ordering::Equal),
                _ => false,
            }
        }
        _ => left == right,
    }
}

fn order(op: Operator, left: &Value, right: &Value) -> Result<Ordering, RuleError> {
    let ordering = match (left, right) {
        (Value::String(lhs), Value::String(rhs)) => Some(lhs.cmp(rhs)),
        _ => match (Numeric::of(left), Numeric::of(right)) {
            (Some(lhs), Some(rhs)) => lhs.compare(rhs),
            _ => None,
        },
    };

    ordering.ok_or_else(|| RuleError::TypeMismatch {
        operator: op.to_string(),
        left: type_name(left).to_string(),
        right: type_name(right).to_string(),
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
