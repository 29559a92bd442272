//! Arbiter: a small rule engine served over HTTP.
//!
//! Rule strings such as `age > 30 AND department = 'Sales'` are parsed into
//! binary ASTs, combined under a shared logical root and evaluated against
//! JSON records. The workspace is split into:
//!
//! * `arbiter-core`: errors, environment configuration, database pool, logging
//! * `arbiter-rules`: lexer, parser, combiner, evaluator, stores and the REST API
//! * `arbiter-server`: the `arbiter-server` binary
//! * `arbiter-cli`: the `arbiter` command-line client

pub use arbiter_core::{ArbiterError, ConfigError, CoreConfig, Environment};
pub use arbiter_rules::{
    combine_asts, evaluate, parse_rule, validate_rule_string, Node, NodeKind, Operator,
    RuleApiBuilder, RuleEngine, RuleError, RuleRepository, RuleServiceConfig, RuleStore,
    StoredRule, MAX_DEPTH,
};

use serde_json::Value;

/// Parses `rule` and evaluates it against `data` in one step.
pub fn evaluate_rule_string(rule: &str, data: &Value) -> Result<Value, RuleError> {
    let engine = RuleEngine::new();
    let ast = engine.create_rule(rule)?;
    engine.evaluate_rule(&ast, data)
}
