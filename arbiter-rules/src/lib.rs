//! Rule engine for the Arbiter service.
//!
//! Rule strings such as `age > 30 AND department = 'Sales'` are parsed into
//! a binary tree of operator and operand nodes. Trees can be combined under
//! a shared logical root and evaluated against a JSON data record. The
//! [`RuleApiBuilder`] exposes these operations over HTTP.

mod ast;
mod combine;
mod engine;
mod error;
mod evaluate;
mod field;
mod lexer;
mod loader;
mod parser;
mod postgres;
mod service;
mod store;
mod validate;

pub use ast::{Node, NodeKind, Operator, OperatorCounts, MAX_DEPTH};
pub use combine::{combine_asts, dominant_operator};
pub use engine::RuleEngine;
pub use error::RuleError;
pub use evaluate::{evaluate, is_truthy, resolve_operand};
pub use field::FieldPath;
pub use lexer::{tokenize, Token, TokenKind};
pub use loader::load_rule_strings;
pub use parser::{parse_rule, MAX_NESTING};
pub use postgres::PgRuleStore;
pub use service::{
    CombineRulesRequest, CombineRulesResponse, CreateRuleRequest, CreateRuleResponse,
    ErrorResponse, EvaluateRuleRequest, EvaluateRuleResponse, RuleApiBuilder, RuleServiceConfig,
    RuleServiceHandle,
};
pub use store::{RuleRepository, RuleStore, StoredRule};
pub use validate::validate_rule_string;
