use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{IntentStatus, OrderUpdate, PaymentIntent, Provider};
use crate::orders::OrderStore;
use crate::store::{StoreError, TransactionStore};

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

const INTENT_COLUMNS: &str = "tid, order_id, user_id, amount, provider, merchant_upi, payload, signature, deep_link, note, status, created_at, expires_at, completed_at";

#[derive(Debug, sqlx::FromRow)]
struct IntentRow {
    tid: String,
    order_id: Option<String>,
    user_id: Option<String>,
    amount: BigDecimal,
    provider: String,
    merchant_upi: String,
    payload: String,
    signature: String,
    deep_link: String,
    note: String,
    status: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<IntentRow> for PaymentIntent {
    type Error = StoreError;

    fn try_from(row: IntentRow) -> Result<Self, Self::Error> {
        let provider = Provider::parse(&row.provider)
            .ok_or_else(|| StoreError::Backend(format!("unknown provider '{}' for {}", row.provider, row.tid)))?;
        let status = IntentStatus::from_str(&row.status)
            .ok_or_else(|| StoreError::Backend(format!("unknown status '{}' for {}", row.status, row.tid)))?;
        Ok(PaymentIntent {
            transaction_id: row.tid,
            order_id: row.order_id,
            user_id: row.user_id,
            amount: row.amount,
            provider,
            merchant_upi: row.merchant_upi,
            payload: row.payload,
            signature: row.signature,
            deep_link: row.deep_link,
            note: row.note,
            status,
            created_at: row.created_at,
            expires_at: row.expires_at,
            completed_at: row.completed_at,
        })
    }
}

/// PostgreSQL-backed intent store (`payment_transactions`).
#[derive(Clone)]
pub struct PgTransactionStore {
    db: PgPool,
}

impl PgTransactionStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TransactionStore for PgTransactionStore {
    async fn insert(&self, intent: &PaymentIntent) -> Result<(), StoreError> {
        let inserted = sqlx::query_scalar::<_, String>(
            r#"INSERT INTO payment_transactions
                 (tid, order_id, user_id, amount, provider, merchant_upi, payload, signature, deep_link, note, status, created_at, expires_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
               ON CONFLICT (tid) DO NOTHING
               RETURNING tid"#,
        )
        .bind(&intent.transaction_id)
        .bind(intent.order_id.as_deref())
        .bind(intent.user_id.as_deref())
        .bind(&intent.amount)
        .bind(intent.provider.as_str())
        .bind(&intent.merchant_upi)
        .bind(&intent.payload)
        .bind(&intent.signature)
        .bind(&intent.deep_link)
        .bind(&intent.note)
        .bind(intent.status.as_str())
        .bind(intent.created_at)
        .bind(intent.expires_at)
        .fetch_optional(&self.db)
        .await?;
        match inserted {
            Some(_) => Ok(()),
            None => Err(StoreError::Duplicate(intent.transaction_id.clone())),
        }
    }

    async fn get(&self, tid: &str) -> Result<Option<PaymentIntent>, StoreError> {
        let row = sqlx::query_as::<_, IntentRow>(&format!(
            "SELECT {INTENT_COLUMNS} FROM payment_transactions WHERE tid = $1"
        ))
        .bind(tid)
        .fetch_optional(&self.db)
        .await?;
        row.map(PaymentIntent::try_from).transpose()
    }

    async fn complete_pending(
        &self,
        tid: &str,
        to: IntentStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<PaymentIntent>, StoreError> {
        let row = sqlx::query_as::<_, IntentRow>(&format!(
            r#"UPDATE payment_transactions
               SET status = $2, completed_at = $3
               WHERE tid = $1 AND status = 'pending'
               RETURNING {INTENT_COLUMNS}"#
        ))
        .bind(tid)
        .bind(to.as_str())
        .bind(at)
        .fetch_optional(&self.db)
        .await?;
        row.map(PaymentIntent::try_from).transpose()
    }

    async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"UPDATE payment_transactions
               SET status = 'expired', completed_at = $1
               WHERE status = 'pending' AND expires_at < $1"#,
        )
        .bind(now)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected())
    }
}

/// PostgreSQL-backed order reconciliation (`orders`). Existing status text is
/// never parsed, so values this service does not know survive untouched.
#[derive(Clone)]
pub struct PgOrderStore {
    db: PgPool,
}

impl PgOrderStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn apply_payment_outcome(&self, order_id: &str, update: OrderUpdate) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"UPDATE orders SET payment_status = $2, status = $3, updated_at = now()
               WHERE id = $1"#,
        )
        .bind(order_id)
        .bind(update.payment_status.as_str())
        .bind(update.status.as_str())
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
