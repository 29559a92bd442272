// Benchmarks for parsing, combining and evaluating rules.
use arbiter::RuleEngine;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;

const SAMPLE_RULE: &str =
    "((age > 30 AND department = 'Marketing')) OR (salary > 20000 OR experience > 5)";

fn rule_benchmarks(c: &mut Criterion) {
    let engine = RuleEngine::new();
    let data = json!({
        "age": 35,
        "department": "Sales",
        "salary": 60000,
        "experience": 10
    });

    c.bench_function("create_rule", |b| {
        b.iter(|| {
            let ast = engine.create_rule(black_box(SAMPLE_RULE)).expect("parse rule");
            black_box(ast);
        });
    });

    c.bench_function("combine_rules", |b| {
        let rules = [SAMPLE_RULE, "age < 60", "department != 'Legal' AND active = 1"];
        b.iter(|| {
            let combined = engine.combine_rules(black_box(&rules[..])).expect("combine");
            black_box(combined);
        });
    });

    c.bench_function("evaluate_rule", |b| {
        let ast = engine.create_rule(SAMPLE_RULE).unwrap();
        b.iter(|| {
            let result = engine
                .evaluate_rule(black_box(&ast), black_box(&data))
                .expect("evaluate");
            black_box(result);
        });
    });

    c.bench_function("evaluate_ast_json", |b| {
        let payload = serde_json::to_value(engine.create_rule(SAMPLE_RULE).unwrap()).unwrap();
        b.iter(|| {
            let ast = engine.parse_ast(black_box(payload.clone())).expect("ast");
            let result = engine.evaluate_rule(&ast, &data).expect("evaluate");
            black_box(result);
        });
    });
}

criterion_group!(benches, rule_benchmarks);
criterion_main!(benches);
