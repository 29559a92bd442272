use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};

use crate::config::CoreConfig;
use crate::errors::{ConfigError, Result};

/// Wrapper around a Postgres connection pool.
#[derive(Clone)]
pub struct DatabasePool {
    pool: Pool<Postgres>,
}

impl DatabasePool {
    /// Establishes a new connection pool based on the core configuration.
    pub async fn connect(config: &CoreConfig) -> Result<Self> {
        let url = config
            .database_url()
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".into()))?;
        Self::connect_with_url(url).await
    }

    /// Establishes a connection pool directly from a database URL.
    pub async fn connect_with_url(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Builds a pool that only connects on first use.
    pub fn connect_lazy(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect_lazy(database_url)?;
        Ok(Self { pool })
    }

    pub fn inner(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

/// Trait implemented by stores that need to run database migrations.
#[async_trait]
pub trait DatabaseMigrator {
    async fn run_migrations(&self, pool: &DatabasePool) -> Result<()>;
}

/// Run migrations by delegating to the provided migrators.
pub async fn run_migrations(
    pool: &DatabasePool,
    migrators: &[&(dyn DatabaseMigrator + Send + Sync)],
) -> Result<()> {
    for migrator in migrators {
        migrator.run_migrations(pool).await?;
    }
    Ok(())
}
