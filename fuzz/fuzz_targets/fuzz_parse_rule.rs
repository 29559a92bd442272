// Fuzz target feeding arbitrary text through validation, parsing, combining
// and evaluation. Each input line is also treated as a separate rule.
#![no_main]

use arbiter_rules::{
    evaluate, parse_rule, tokenize, validate_rule_string, Node, RuleEngine, MAX_DEPTH,
};
use libfuzzer_sys::fuzz_target;
use serde_json::{json, Map, Value};

fn record() -> Map<String, Value> {
    match json!({"age": 35, "department": "Sales", "active": true}) {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn exercise(ast: &Node) {
    assert!(ast.depth() <= MAX_DEPTH, "tree deeper than {MAX_DEPTH}");
    let _ = evaluate(ast, &record());

    let encoded = serde_json::to_string(ast).expect("AST serializes");
    let decoded: Node = serde_json::from_str(&encoded).expect("AST decodes");
    assert_eq!(&decoded, ast);
}

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let _ = tokenize(text);
    if validate_rule_string(text).is_ok() {
        if let Ok(ast) = parse_rule(text) {
            exercise(&ast);
        }
    }

    let rules: Vec<&str> = text.lines().collect();
    if let Ok(combined) = RuleEngine::new().combine_rules(&rules) {
        exercise(&combined);
    }
});
