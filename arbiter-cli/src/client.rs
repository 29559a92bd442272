use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::CliError;
use crate::output::display_value;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8081";

/// HTTP client for the rule service endpoints.
#[derive(Clone)]
pub struct RulesClient {
    http: reqwest::Client,
    base_url: Url,
}

impl RulesClient {
    pub fn new(base_url: &str) -> Result<Self, CliError> {
        let mut url = Url::parse(base_url).map_err(|err| CliError::InvalidUrl {
            url: base_url.to_string(),
            source: err,
        })?;

        if !url.path().ends_with('/') {
            let mut path = url.path().trim_end_matches('/').to_string();
            path.push('/');
            url.set_path(&path);
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base_url: url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, CliError> {
        self.base_url
            .join(path)
            .map_err(|err| CliError::InvalidUrl {
                url: format!("{}{}", self.base_url, path),
                source: err,
            })
    }

    pub async fn create_rule(&self, rule: &str) -> Result<CreatedRule, CliError> {
        let url = self.endpoint("create_rule")?;
        debug!(%url, "creating rule");
        let response = self
            .http
            .post(url)
            .json(&CreateRuleRequest { rule })
            .send()
            .await?;
        parse_response(response).await
    }

    pub async fn combine_rules(&self, rules: &[String]) -> Result<CombinedRule, CliError> {
        let url = self.endpoint("combine_rules")?;
        debug!(%url, count = rules.len(), "combining rules");
        let response = self
            .http
            .post(url)
            .json(&CombineRulesRequest { rules })
            .send()
            .await?;
        parse_response(response).await
    }

    pub async fn evaluate_rule(&self, rule: &Value, data: &Value) -> Result<Evaluation, CliError> {
        let url = self.endpoint("evaluate_rule")?;
        debug!(%url, "evaluating rule");
        let response = self
            .http
            .post(url)
            .json(&EvaluateRuleRequest { rule, data })
            .send()
            .await?;
        parse_response(response).await
    }

    pub async fn fetch_rule(&self, rule_id: &str) -> Result<Value, CliError> {
        let segment: String = url::form_urlencoded::byte_serialize(rule_id.as_bytes()).collect();
        let url = self.endpoint(&format!("rules/{segment}"))?;
        debug!(%url, "fetching stored rule");
        let response = self.http.get(url).send().await?;
        parse_response(response).await
    }
}

/// Decodes a success body, or turns a failure body into the server's
/// `error` message (`HTTP <status>` when the body carries none).
async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, CliError> {
    let status = response.status();
    let body = response.text().await?;

    if status.is_success() {
        return serde_json::from_str(&body)
            .map_err(|err| CliError::Transport(format!("invalid JSON response: {err}")));
    }

    let payload: ServerError = serde_json::from_str(&body)
        .map_err(|err| CliError::Transport(format!("invalid JSON response: {err}")))?;
    match payload.error {
        Some(Value::String(message)) => Err(CliError::Server(message)),
        Some(other) => Err(CliError::Server(display_value(&other))),
        None => Err(CliError::Server(format!("HTTP {}", status.as_u16()))),
    }
}

#[derive(Debug, Deserialize)]
struct ServerError {
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Serialize)]
struct CreateRuleRequest<'a> {
    rule: &'a str,
}

#[derive(Debug, Serialize)]
struct CombineRulesRequest<'a> {
    rules: &'a [String],
}

#[derive(Debug, Serialize)]
struct EvaluateRuleRequest<'a> {
    rule: &'a Value,
    data: &'a Value,
}

#[derive(Debug, Deserialize)]
pub struct CreatedRule {
    pub rule: Value,
}

#[derive(Debug, Deserialize)]
pub struct CombinedRule {
    pub rule: Value,
    pub rule_id: String,
}

#[derive(Debug, Deserialize)]
pub struct Evaluation {
    #[serde(default)]
    pub result: Value,
}
