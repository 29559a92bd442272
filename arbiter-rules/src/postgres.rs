use std::collections::HashMap;

use arbiter_core::db::{run_migrations, DatabaseMigrator, DatabasePool};
use arbiter_core::{CoreConfig, CoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use tracing::info;
use uuid::Uuid;

use crate::store::{RuleRepository, StoredRule};
use crate::{Node, RuleError};

const CREATE_RULES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS rules (
    rule_id UUID PRIMARY KEY,
    rule JSONB NOT NULL,
    sources JSONB NOT NULL DEFAULT '[]'::jsonb,
    created_at TIMESTAMPTZ NOT NULL
)
"#;

/// Postgres-backed rule store.
#[derive(Clone)]
pub struct PgRuleStore {
    pool: DatabasePool,
}

impl PgRuleStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Connects using `DATABASE_URL` from the core config and creates the schema.
    pub async fn connect(config: &CoreConfig) -> Result<Self, RuleError> {
        let pool = DatabasePool::connect(config).await?;
        let store = Self::new(pool);
        run_migrations(&store.pool, &[&store]).await?;
        info!("rules table ready");
        Ok(store)
    }
}

#[async_trait]
impl DatabaseMigrator for PgRuleStore {
    async fn run_migrations(&self, pool: &DatabasePool) -> CoreResult<()> {
        sqlx::query(CREATE_RULES_TABLE)
            .execute(pool.inner())
            .await?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct RuleRow {
    rule_id: Uuid,
    rule: Json<Node>,
    sources: Json<Vec<String>>,
    created_at: DateTime<Utc>,
}

impl From<RuleRow> for StoredRule {
    fn from(row: RuleRow) -> Self {
        Self {
            rule_id: row.rule_id,
            rule: row.rule.0,
            sources: row.sources.0,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl RuleRepository for PgRuleStore {
    async fn save(&self, rule: Node, sources: Vec<String>) -> Result<StoredRule, RuleError> {
        let stored = StoredRule::new(rule, sources);
        sqlx::query(
            "INSERT INTO rules (rule_id, rule, sources, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(stored.rule_id)
        .bind(Json(&stored.rule))
        .bind(Json(&stored.sources))
        .bind(stored.created_at)
        .execute(self.pool.inner())
        .await?;
        Ok(stored)
    }

    async fn get(&self, rule_id: Uuid) -> Result<Option<StoredRule>, RuleError> {
        let row = sqlx::query_as::<_, RuleRow>(
            "SELECT rule_id, rule, sources, created_at FROM rules WHERE rule_id = $1",
        )
        .bind(rule_id)
        .fetch_optional(self.pool.inner())
        .await?;
        Ok(row.map(StoredRule::from))
    }

    async fn get_many(&self, ids: &[Uuid]) -> Result<Vec<StoredRule>, RuleError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, RuleRow>(
            "SELECT rule_id, rule, sources, created_at FROM rules WHERE rule_id = ANY($1)",
        )
        .bind(ids.to_vec())
        .fetch_all(self.pool.inner())
        .await?;

        Ok(order_by_ids(rows.into_iter().map(StoredRule::from), ids))
    }
}

fn order_by_ids(rules: impl IntoIterator<Item = StoredRule>, ids: &[Uuid]) -> Vec<StoredRule> {
    let by_id: HashMap<Uuid, StoredRule> =
        rules.into_iter().map(|rule| (rule.rule_id, rule)).collect();
    ids.iter().filter_map(|id| by_id.get(id).cloned()).collect()
}
