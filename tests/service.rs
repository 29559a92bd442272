// End-to-end tests driving the rule API over a real socket.
use std::sync::Arc;

use arbiter::{
    Node, RuleApiBuilder, RuleError, RuleRepository, RuleServiceConfig, RuleStore, StoredRule,
    MAX_DEPTH,
};
use mockall::mock;
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

mock! {
    pub Repository {}

    #[async_trait::async_trait]
    impl RuleRepository for Repository {
        async fn save(&self, rule: Node, sources: Vec<String>) -> Result<StoredRule, RuleError>;
        async fn get(&self, rule_id: Uuid) -> Result<Option<StoredRule>, RuleError>;
        async fn get_many(&self, ids: &[Uuid]) -> Result<Vec<StoredRule>, RuleError>;
    }
}

struct TestServer {
    base: String,
    handle: arbiter_rules::RuleServiceHandle,
}

impl TestServer {
    async fn start(store: Arc<dyn RuleRepository>) -> anyhow::Result<Self> {
        let handle = RuleApiBuilder::new(store)
            .serve(RuleServiceConfig {
                bind_address: "127.0.0.1:0".into(),
            })
            .await?;
        Ok(Self {
            base: format!("http://{}", handle.addr),
            handle,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn stop(self) {
        self.handle.shutdown();
    }
}

#[tokio::test]
async fn create_combine_fetch_and_evaluate() -> anyhow::Result<()> {
    let server = TestServer::start(Arc::new(RuleStore::new())).await?;
    let client = reqwest::Client::new();

    let created: Value = client
        .post(server.url("/create_rule"))
        .json(&json!({ "rule": "age > 30 AND department = 'Sales'" }))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    assert_eq!(created["message"], "Rule created successfully");
    assert_eq!(created["rule"]["value"], "AND");

    let combined: Value = client
        .post(server.url("/combine_rules"))
        .json(&json!({ "rules": ["age > 30", "salary > 50000 OR experience > 5"] }))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    assert_eq!(combined["message"], "Rules combined successfully");
    let rule_id = combined["rule_id"].as_str().expect("rule id string").to_string();
    Uuid::parse_str(&rule_id)?;

    let stored: Value = client
        .get(server.url(&format!("/rules/{rule_id}")))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    assert_eq!(stored["rule"], combined["rule"]);

    let evaluated: Value = client
        .post(server.url("/evaluate_rule"))
        .json(&json!({
            "rule": combined["rule"],
            "data": {"age": 35, "salary": 40000, "experience": 10}
        }))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    assert_eq!(evaluated, json!({ "result": true }));

    server.stop();
    Ok(())
}

#[tokio::test]
async fn errors_are_json_with_status_codes() -> anyhow::Result<()> {
    let server = TestServer::start(Arc::new(RuleStore::new())).await?;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/create_rule"))
        .json(&json!({ "rule": "age > AND" }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await?;
    assert_eq!(body["error"], "Invalid rule string");

    let response = client
        .post(server.url("/create_rule"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await?;
    assert!(body["error"].is_string());

    let response = client
        .get(server.url(&format!("/rules/{}", Uuid::new_v4())))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    server.stop();
    Ok(())
}

#[tokio::test]
async fn storage_failures_map_to_server_error() -> anyhow::Result<()> {
    let mut repository = MockRepository::new();
    repository
        .expect_save()
        .times(1)
        .returning(|_, _| Err(RuleError::Storage("connection reset".into())));

    let server = TestServer::start(Arc::new(repository)).await?;
    let response = reqwest::Client::new()
        .post(server.url("/combine_rules"))
        .json(&json!({ "rules": ["a > 1", "b > 2"] }))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await?;
    assert!(body["error"]
        .as_str()
        .is_some_and(|message| message.contains("connection reset")));

    server.stop();
    Ok(())
}

#[tokio::test]
async fn invalid_combination_never_reaches_storage() -> anyhow::Result<()> {
    let mut repository = MockRepository::new();
    repository.expect_save().never();

    let server = TestServer::start(Arc::new(repository)).await?;
    let response = reqwest::Client::new()
        .post(server.url("/combine_rules"))
        .json(&json!({ "rules": ["a > 1", "(b > 2"] }))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    server.stop();
    Ok(())
}

fn chain(op: &str, terms: usize) -> String {
    (0..terms)
        .map(|i| format!("f{i} >= {i}"))
        .collect::<Vec<_>>()
        .join(&format!(" {op} "))
}

#[tokio::test]
async fn overly_deep_rules_are_rejected_and_the_server_keeps_serving() -> anyhow::Result<()> {
    let mut repository = MockRepository::new();
    repository.expect_save().never();

    let server = TestServer::start(Arc::new(repository)).await?;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/create_rule"))
        .json(&json!({ "rule": chain("AND", 20_000) }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await?;
    assert!(body["error"]
        .as_str()
        .is_some_and(|message| message.contains("deeper than")));

    let rules: Vec<String> = (0..20_000).map(|i| format!("f{i} = {i}")).collect();
    let response = client
        .post(server.url("/combine_rules"))
        .json(&json!({ "rules": rules }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .post(server.url("/create_rule"))
        .json(&json!({ "rule": "age > 30" }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    server.stop();
    Ok(())
}

#[tokio::test]
async fn widest_combination_evaluates_over_http() -> anyhow::Result<()> {
    let server = TestServer::start(Arc::new(RuleStore::new())).await?;
    let client = reqwest::Client::new();

    let rules: Vec<String> = (0..MAX_DEPTH - 1).map(|i| format!("f{i} >= {i}")).collect();
    let combined: Value = client
        .post(server.url("/combine_rules"))
        .json(&json!({ "rules": rules }))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let data: serde_json::Map<String, Value> = (0..MAX_DEPTH - 1)
        .map(|i| (format!("f{i}"), json!(i)))
        .collect();
    let evaluated: Value = client
        .post(server.url("/evaluate_rule"))
        .json(&json!({ "rule": combined["rule"], "data": data }))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    assert_eq!(evaluated, json!({ "result": true }));

    let response = client
        .post(server.url("/combine_rules"))
        .json(&json!({ "rules": [chain("AND", MAX_DEPTH - 1), "extra = 1"] }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    server.stop();
    Ok(())
}
