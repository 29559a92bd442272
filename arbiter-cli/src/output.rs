use arbiter_core::serde_utils::to_pretty_json;
use serde_json::Value;

use crate::error::CliError;

pub const TOO_FEW_RULES: &str = "Please enter at least two rules to combine.";

/// Pretty-prints an AST with two-space indentation, keys in server order.
pub fn render_rule(rule: &Value) -> Result<String, CliError> {
    Ok(to_pretty_json(rule)?)
}

pub fn render_error(message: impl std::fmt::Display) -> String {
    format!("Error: {message}")
}

pub fn render_result(result: &Value) -> String {
    format!("Result: {}", display_value(result))
}

pub fn render_combined(rule_id: &str) -> String {
    format!("Rules combined successfully. Rule ID: {rule_id}")
}

/// Renders a JSON value the way it reads when interpolated into a
/// JavaScript template string.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                int.to_string()
            } else if let Some(uint) = number.as_u64() {
                uint.to_string()
            } else {
                number
                    .as_f64()
                    .map(|float| float.to_string())
                    .unwrap_or_else(|| number.to_string())
            }
        }
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => display_value(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn results_render_like_template_strings() {
        assert_eq!(render_result(&json!(true)), "Result: true");
        assert_eq!(render_result(&json!(false)), "Result: false");
        assert_eq!(render_result(&json!(35)), "Result: 35");
        assert_eq!(render_result(&json!(2.0)), "Result: 2");
        assert_eq!(render_result(&json!(2.5)), "Result: 2.5");
        assert_eq!(render_result(&json!("Sales")), "Result: Sales");
        assert_eq!(render_result(&Value::Null), "Result: null");
        assert_eq!(render_result(&json!([1, null, "a"])), "Result: 1,,a");
        assert_eq!(render_result(&json!({"a": 1})), "Result: [object Object]");
    }

    #[test]
    fn rule_output_keeps_server_key_order() {
        let rule: Value = serde_json::from_str(
            r#"{"type":"operator","value":">","left":{"type":"operand","value":"age"},"right":{"type":"operand","value":"30"}}"#,
        )
        .unwrap();

        let rendered = render_rule(&rule).unwrap();
        let type_at = rendered.find("\"type\"").unwrap();
        let value_at = rendered.find("\"value\"").unwrap();
        let left_at = rendered.find("\"left\"").unwrap();
        assert!(type_at < value_at && value_at < left_at);
        assert!(rendered.starts_with("{\n  \"type\": \"operator\""));
    }

    #[test]
    fn messages_match_expected_text() {
        assert_eq!(render_error("Invalid rule string"), "Error: Invalid rule string");
        assert_eq!(
            render_combined("abc"),
            "Rules combined successfully. Rule ID: abc"
        );
    }
}
