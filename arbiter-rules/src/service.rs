use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{Node, RuleEngine, RuleError, RuleRepository, StoredRule};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRuleRequest {
    pub rule: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRuleResponse {
    pub message: String,
    pub rule: Node,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombineRulesRequest {
    pub rules: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombineRulesResponse {
    pub message: String,
    pub rule: Node,
    pub rule_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateRuleRequest {
    pub rule: Value,
    pub data: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateRuleResponse {
    pub result: Value,
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<RuleError> for ApiError {
    fn from(err: RuleError) -> Self {
        let status = match &err {
            RuleError::InvalidRule { reason } => {
                warn!(%reason, "rejected rule string");
                StatusCode::BAD_REQUEST
            }
            RuleError::Lex { .. }
            | RuleError::Parse(_)
            | RuleError::TooDeep { .. }
            | RuleError::NothingToCombine
            | RuleError::MalformedAst(_)
            | RuleError::InvalidData(_) => StatusCode::BAD_REQUEST,
            RuleError::TypeMismatch { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            RuleError::NotFound(_) => StatusCode::NOT_FOUND,
            RuleError::Storage(_)
            | RuleError::MissingPath(_)
            | RuleError::Io { .. }
            | RuleError::Load { .. } => {
                error!(?err, "rule service failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self {
                status: StatusCode::PAYLOAD_TOO_LARGE,
                message: rejection.body_text(),
            };
        }
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

#[derive(Clone)]
struct RuleServiceState {
    engine: RuleEngine,
    store: Arc<dyn RuleRepository>,
}

/// Configuration for the rule API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleServiceConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

fn default_bind_address() -> String {
    "0.0.0.0:8081".to_string()
}

impl Default for RuleServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

/// Handle returned when the service is started programmatically.
pub struct RuleServiceHandle {
    pub addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
}

impl RuleServiceHandle {
    pub fn shutdown(self) {
        let _ = self.shutdown.send(());
    }
}

/// Helper used by binaries and tests to compose the REST API router.
#[derive(Clone)]
pub struct RuleApiBuilder {
    state: RuleServiceState,
}

impl RuleApiBuilder {
    pub fn new(store: Arc<dyn RuleRepository>) -> Self {
        Self {
            state: RuleServiceState {
                engine: RuleEngine::new(),
                store,
            },
        }
    }

    pub fn into_router(self) -> Router {
        Router::new()
            .route("/health", get(health))
            .route("/create_rule", post(create_rule))
            .route("/combine_rules", post(combine_rules))
            .route("/evaluate_rule", post(evaluate_rule))
            .route("/rules", get(list_rules))
            .route("/rules/:rule_id", get(get_rule))
            .with_state(self.state)
    }

    /// Binds the configured address and serves in the background until the
    /// returned handle is shut down.
    pub async fn serve(self, config: RuleServiceConfig) -> anyhow::Result<RuleServiceHandle> {
        let listener = tokio::net::TcpListener::bind(&config.bind_address)
            .await
            .with_context(|| format!("failed to bind {}", config.bind_address))?;
        let addr = listener
            .local_addr()
            .context("failed to read socket address")?;
        let (tx, rx) = oneshot::channel();
        let app = self.into_router();

        tokio::spawn(async move {
            info!(%addr, "starting rule service");
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = rx.await;
                })
                .await;
            match served {
                Ok(()) => info!(%addr, "rule service stopped"),
                Err(err) => error!(%addr, ?err, "rule service terminated with error"),
            }
        });

        Ok(RuleServiceHandle { addr, shutdown: tx })
    }
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn create_rule(
    State(state): State<RuleServiceState>,
    payload: Result<Json<CreateRuleRequest>, JsonRejection>,
) -> Result<Json<CreateRuleResponse>, ApiError> {
    let Json(payload) = payload?;
    let rule = state.engine.create_rule(&payload.rule)?;
    info!(nodes = rule.size(), "rule created");

    Ok(Json(CreateRuleResponse {
        message: "Rule created successfully".into(),
        rule,
    }))
}

async fn combine_rules(
    State(state): State<RuleServiceState>,
    payload: Result<Json<CombineRulesRequest>, JsonRejection>,
) -> Result<Json<CombineRulesResponse>, ApiError> {
    let Json(payload) = payload?;
    let rule = state.engine.combine_rules(payload.rules.as_slice())?;
    let stored = state.store.save(rule, payload.rules).await?;
    info!(rule_id = %stored.rule_id, sources = stored.sources.len(), "rules combined");

    Ok(Json(CombineRulesResponse {
        message: "Rules combined successfully".into(),
        rule_id: stored.rule_id.to_string(),
        rule: stored.rule,
    }))
}

async fn evaluate_rule(
    State(state): State<RuleServiceState>,
    payload: Result<Json<EvaluateRuleRequest>, JsonRejection>,
) -> Result<Json<EvaluateRuleResponse>, ApiError> {
    let Json(payload) = payload?;
    let rule = state.engine.parse_ast(payload.rule)?;
    let result = state.engine.evaluate_rule(&rule, &payload.data)?;

    Ok(Json(EvaluateRuleResponse { result }))
}

#[derive(Debug, Deserialize)]
struct RuleListQuery {
    ids: String,
}

async fn list_rules(
    State(state): State<RuleServiceState>,
    query: Result<Query<RuleListQuery>, QueryRejection>,
) -> Result<Json<Vec<StoredRule>>, ApiError> {
    let Query(query) = query?;
    let ids = query
        .ids
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(parse_rule_id)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(state.store.get_many(&ids).await?))
}

async fn get_rule(
    State(state): State<RuleServiceState>,
    Path(rule_id): Path<String>,
) -> Result<Json<StoredRule>, ApiError> {
    let id = parse_rule_id(&rule_id)?;
    state
        .store
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| RuleError::NotFound(rule_id).into())
}

fn parse_rule_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request(format!("invalid rule id '{raw}'")))
}
