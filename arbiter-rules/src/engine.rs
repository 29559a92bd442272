use serde_json::Value;
use tracing::debug;

use crate::ast::{Node, MAX_DEPTH};
use crate::combine::combine_asts;
use crate::error::RuleError;
use crate::evaluate::evaluate;
use crate::parser::parse_rule;
use crate::validate::validate_rule_string;

/// Entry point for the three rule operations exposed by the service.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleEngine;

impl RuleEngine {
    pub fn new() -> Self {
        Self
    }

    /// Validates and parses a rule string into its tree.
    pub fn create_rule(&self, rule: &str) -> Result<Node, RuleError> {
        validate_rule_string(rule)?;
        let ast = parse_rule(rule)?;
        debug!(nodes = ast.size(), "rule parsed");
        Ok(ast)
    }

    /// Parses every rule string and joins the trees under one root.
    pub fn combine_rules<S: AsRef<str>>(&self, rules: &[S]) -> Result<Node, RuleError> {
        if rules.is_empty() {
            return Err(RuleError::NothingToCombine);
        }
        // Each joined rule adds a level under the root.
        if rules.len() > MAX_DEPTH {
            return Err(RuleError::TooDeep { limit: MAX_DEPTH });
        }

        let asts = rules
            .iter()
            .map(|rule| self.create_rule(rule.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        let combined = combine_asts(asts)?;
        debug!(
            rules = rules.len(),
            root = %combined.value,
            nodes = combined.size(),
            "rules combined"
        );
        Ok(combined)
    }

    /// Evaluates a tree against a JSON object.
    pub fn evaluate_rule(&self, rule: &Node, data: &Value) -> Result<Value, RuleError> {
        let record = match data {
            Value::Object(map) => map,
            Value::Null => return Err(RuleError::InvalidData("null")),
            Value::Bool(_) => return Err(RuleError::InvalidData("a boolean")),
            Value::Number(_) => return Err(RuleError::InvalidData("a number")),
            Value::String(_) => return Err(RuleError::InvalidData("a string")),
            Value::Array(_) => return Err(RuleError::InvalidData("an array")),
        };

        let result = evaluate(rule, record)?;
        debug!(%result, "rule evaluated");
        Ok(result)
    }

    /// Decodes a tree received over the wire.
    pub fn parse_ast(&self, value: Value) -> Result<Node, RuleError> {
        serde_json::from_value(value).map_err(|err| RuleError::MalformedAst(err.to_string()))
    }
}
