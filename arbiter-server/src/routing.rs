use std::sync::Arc;

use arbiter_rules::{RuleApiBuilder, RuleRepository};
use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::ServerConfig;

/// Builds the rule API router wrapped in the server middleware stack.
///
/// Layers run outermost first: tracing, CORS, the global concurrency limit,
/// the request timeout and finally the body size limit.
pub fn build_app(store: Arc<dyn RuleRepository>, config: &ServerConfig) -> Router {
    RuleApiBuilder::new(store)
        .into_router()
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(GlobalConcurrencyLimitLayer::new(
            config.max_concurrent_requests,
        ))
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
}

pub fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let allow_origin = if config.allows_any_origin() {
        AllowOrigin::any()
    } else {
        let origins: Vec<_> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(err) => {
                    warn!(%origin, ?err, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();

        if origins.is_empty() {
            AllowOrigin::any()
        } else {
            AllowOrigin::list(origins)
        }
    };

    CorsLayer::new()
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_origin(allow_origin)
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::ORIGIN,
        ]))
}
