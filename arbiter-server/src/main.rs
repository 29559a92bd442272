mod config;
mod routing;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use arbiter_rules::{PgRuleStore, RuleRepository, RuleStore};
use tracing::{error, info, warn};

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    if let Err(err) = arbiter_core::logging::init_tracing(None) {
        eprintln!("failed to initialise tracing: {err}");
    }

    let config = ServerConfig::from_env().context("failed to load server configuration")?;
    let store = open_store(&config).await?;
    let app = routing::build_app(store, &config);

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .context("invalid bind address")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind TCP listener")?;
    let actual_addr = listener
        .local_addr()
        .context("failed to read socket address")?;
    info!(
        %actual_addr,
        node = %config.core.node_name,
        environment = ?config.core.environment,
        "starting arbiter-server"
    );

    if let Err(err) = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(?err, "arbiter-server terminated with error");
    }

    Ok(())
}

async fn open_store(config: &ServerConfig) -> anyhow::Result<Arc<dyn RuleRepository>> {
    if config.core.database_url().is_some() {
        let store = PgRuleStore::connect(&config.core)
            .await
            .context("failed to connect rule store to Postgres")?;
        info!("persisting combined rules in Postgres");
        return Ok(Arc::new(store));
    }

    if config.core.is_production() {
        warn!("DATABASE_URL not set in production; combined rules will not survive a restart");
    } else {
        info!("DATABASE_URL not set; keeping combined rules in memory");
    }
    Ok(Arc::new(RuleStore::new()))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sigterm) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sigterm.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
