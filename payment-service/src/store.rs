use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::domain::{is_valid_transition, IntentStatus, PaymentIntent};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transaction id already exists: {0}")]
    Duplicate(String),
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Durable record of payment intents keyed by transaction id.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Fails with [`StoreError::Duplicate`] if the id is taken.
    async fn insert(&self, intent: &PaymentIntent) -> Result<(), StoreError>;

    async fn get(&self, tid: &str) -> Result<Option<PaymentIntent>, StoreError>;

    /// Compare-and-set out of `pending`. Returns the updated intent, or `None`
    /// when the intent is missing or no longer pending.
    async fn complete_pending(
        &self,
        tid: &str,
        to: IntentStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<PaymentIntent>, StoreError>;

    /// Moves every pending intent whose expiry is before `now` to `expired`.
    async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

pub type TransactionStoreRef = Arc<dyn TransactionStore>;

/// In-process store used when no database is configured and in tests.
#[derive(Default, Clone)]
pub struct InMemoryTransactionStore {
    intents: Arc<RwLock<HashMap<String, PaymentIntent>>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn insert(&self, intent: &PaymentIntent) -> Result<(), StoreError> {
        let mut intents = self.intents.write().await;
        if intents.contains_key(&intent.transaction_id) {
            return Err(StoreError::Duplicate(intent.transaction_id.clone()));
        }
        intents.insert(intent.transaction_id.clone(), intent.clone());
        Ok(())
    }

    async fn get(&self, tid: &str) -> Result<Option<PaymentIntent>, StoreError> {
        let intents = self.intents.read().await;
        Ok(intents.get(tid).cloned())
    }

    async fn complete_pending(
        &self,
        tid: &str,
        to: IntentStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<PaymentIntent>, StoreError> {
        let mut intents = self.intents.write().await;
        let Some(intent) = intents.get_mut(tid) else {
            return Ok(None);
        };
        if !is_valid_transition(intent.status, to) {
            return Ok(None);
        }
        intent.status = to;
        intent.completed_at = Some(at);
        Ok(Some(intent.clone()))
    }

    async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut intents = self.intents.write().await;
        let mut expired = 0;
        for intent in intents.values_mut().filter(|i| i.is_overdue(now)) {
            intent.status = IntentStatus::Expired;
            intent.completed_at = Some(now);
            expired += 1;
        }
        Ok(expired)
    }
}
