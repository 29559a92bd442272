use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Node, RuleError};

/// A combined rule persisted by the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredRule {
    pub rule_id: Uuid,
    pub rule: Node,
    /// Rule strings the tree was combined from.
    pub sources: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl StoredRule {
    pub fn new(rule: Node, sources: Vec<String>) -> Self {
        Self {
            rule_id: Uuid::new_v4(),
            rule,
            sources,
            created_at: Utc::now(),
        }
    }
}

/// Storage backend for combined rules.
#[async_trait]
pub trait RuleRepository: Send + Sync {
    /// Persists a new rule and returns the stored record.
    async fn save(&self, rule: Node, sources: Vec<String>) -> Result<StoredRule, RuleError>;

    async fn get(&self, rule_id: Uuid) -> Result<Option<StoredRule>, RuleError>;

    /// Returns the rules for `ids` in the order requested; unknown ids are skipped.
    async fn get_many(&self, ids: &[Uuid]) -> Result<Vec<StoredRule>, RuleError>;
}

/// In-memory rule store used when no database is configured.
#[derive(Default, Clone)]
pub struct RuleStore {
    inner: Arc<RwLock<HashMap<Uuid, StoredRule>>>,
}

impl RuleStore {
    /// Creates a new empty rule store.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

#[async_trait]
impl RuleRepository for RuleStore {
    async fn save(&self, rule: Node, sources: Vec<String>) -> Result<StoredRule, RuleError> {
        let stored = StoredRule::new(rule, sources);
        self.inner.write().insert(stored.rule_id, stored.clone());
        Ok(stored)
    }

    async fn get(&self, rule_id: Uuid) -> Result<Option<StoredRule>, RuleError> {
        Ok(self.inner.read().get(&rule_id).cloned())
    }

    async fn get_many(&self, ids: &[Uuid]) -> Result<Vec<StoredRule>, RuleError> {
        let inner = self.inner.read();
        Ok(ids.iter().filter_map(|id| inner.get(id).cloned()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Operator;

    fn sample_rule() -> Node {
        Node::operator(Operator::Gt, Node::operand("age"), Node::operand("30"))
    }

    #[tokio::test]
    async fn saved_rules_can_be_fetched() {
        let store = RuleStore::new();
        let stored = store
            .save(sample_rule(), vec!["age > 30".into()])
            .await
            .expect("save");

        let fetched = store.get(stored.rule_id).await.expect("get");
        assert_eq!(fetched, Some(stored));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn get_many_keeps_request_order_and_skips_unknown_ids() {
        let store = RuleStore::new();
        let first = store.save(sample_rule(), vec![]).await.unwrap();
        let second = store.save(Node::operand("active"), vec![]).await.unwrap();

        let found = store
            .get_many(&[second.rule_id, Uuid::new_v4(), first.rule_id])
            .await
            .expect("get many");
        let ids: Vec<_> = found.iter().map(|rule| rule.rule_id).collect();
        assert_eq!(ids, vec![second.rule_id, first.rule_id]);
    }

    #[tokio::test]
    async fn each_save_gets_a_fresh_id() {
        let store = RuleStore::new();
        let a = store.save(sample_rule(), vec![]).await.unwrap();
        let b = store.save(sample_rule(), vec![]).await.unwrap();
        assert_ne!(a.rule_id, b.rule_id);
        assert!(!store.is_empty());
    }
}
