use std::sync::Arc;

use chrono::Duration;
use common_money::parse_amount;
use common_observability::PaymentMetrics;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::deeplink::{build_link, generate_note, generate_transaction_id, BuiltLink, DeepLinkError, LinkRequest};
use crate::domain::{IntentStatus, OrderUpdate, PaymentIntent, Provider};
use crate::merchant::{MerchantError, MerchantHandleSource};
use crate::orders::OrderStoreRef;
use crate::signature::Signer;
use crate::store::{StoreError, TransactionStoreRef};

/// Lifetime of a pending intent.
pub const INTENT_TTL_SECS: i64 = 600;
const MAX_ID_ATTEMPTS: usize = 3;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("{message}")]
    InvalidRequest { code: &'static str, message: &'static str },
    #[error("Transaction not found")]
    NotFound,
    #[error("Invalid signature")]
    SignatureMismatch,
    #[error("Transaction already {0}")]
    AlreadyProcessed(IntentStatus),
    #[error("merchant handle unavailable: {0}")]
    Merchant(#[from] MerchantError),
    #[error("deep link construction failed: {0}")]
    DeepLink(#[from] DeepLinkError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PaymentError {
    pub fn invalid_payload() -> Self {
        PaymentError::InvalidRequest { code: "invalid_payload", message: "Invalid payload" }
    }
}

/// Raw creation request; validation happens in [`PaymentIntentManager::create_intent`].
#[derive(Debug, Clone, Default)]
pub struct NewIntent {
    pub amount: Option<String>,
    pub pay_type: Option<String>,
    pub order_id: Option<String>,
    pub user_id: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Drives intents through pending -> success | failed | expired and keeps the
/// linked order in step.
pub struct PaymentIntentManager {
    store: TransactionStoreRef,
    orders: OrderStoreRef,
    signer: Signer,
    merchant: Arc<dyn MerchantHandleSource>,
    metrics: Arc<PaymentMetrics>,
    clock: Arc<dyn Clock>,
}

impl PaymentIntentManager {
    pub fn new(
        store: TransactionStoreRef,
        orders: OrderStoreRef,
        signer: Signer,
        merchant: Arc<dyn MerchantHandleSource>,
        metrics: Arc<PaymentMetrics>,
    ) -> Self {
        Self { store, orders, signer, merchant, metrics, clock: Arc::new(SystemClock) }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub async fn merchant_upi(&self) -> Result<String, PaymentError> {
        Ok(self.merchant.current().await?)
    }

    /// Validates, builds and signs the deep link, then persists a pending
    /// intent with a single insert.
    pub async fn create_intent(&self, req: NewIntent) -> Result<PaymentIntent, PaymentError> {
        let amount_raw = non_blank(req.amount).ok_or_else(PaymentError::invalid_payload)?;
        let pay_type = non_blank(req.pay_type).ok_or_else(PaymentError::invalid_payload)?;
        let provider = Provider::parse(&pay_type).ok_or(PaymentError::InvalidRequest {
            code: "unsupported_payment_type",
            message: "Unsupported payment type",
        })?;
        let amount = parse_amount(&amount_raw).map_err(|err| {
            debug!(error = %err, amount = %amount_raw, "Rejected payment amount");
            PaymentError::InvalidRequest { code: "invalid_amount", message: "Invalid amount" }
        })?;

        let upi = self.merchant.current().await?;
        let note = generate_note();
        let BuiltLink { payload, deep_link } =
            build_link(LinkRequest { provider, upi: &upi, amount: &amount, note: &note })?;
        let signature = self.signer.sign(&payload);
        let created_at = self.clock.now();

        let mut intent = PaymentIntent {
            transaction_id: String::new(),
            order_id: non_blank(req.order_id),
            user_id: non_blank(req.user_id),
            amount,
            provider,
            merchant_upi: upi,
            payload,
            signature,
            deep_link,
            note,
            status: IntentStatus::Pending,
            created_at,
            expires_at: created_at + Duration::seconds(INTENT_TTL_SECS),
            completed_at: None,
        };

        for attempt in 1..=MAX_ID_ATTEMPTS {
            intent.transaction_id = generate_transaction_id(created_at);
            match self.store.insert(&intent).await {
                Ok(()) => {
                    self.metrics.intents_created.with_label_values(&[provider.as_str()]).inc();
                    info!(
                        tid = %intent.transaction_id,
                        provider = provider.as_str(),
                        order_id = intent.order_id.as_deref().unwrap_or("-"),
                        "Payment intent created"
                    );
                    return Ok(intent);
                }
                Err(StoreError::Duplicate(tid)) => {
                    warn!(tid = %tid, attempt, "Transaction id collision; regenerating");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(StoreError::Backend("could not allocate a unique transaction id".into()).into())
    }

    /// Current view of an intent, expiring it first if its window has passed.
    pub async fn get_status(&self, tid: &str) -> Result<PaymentIntent, PaymentError> {
        let intent = self.store.get(tid).await?.ok_or(PaymentError::NotFound)?;
        self.expire_if_overdue(intent).await
    }

    /// Records the client-reported outcome of a pending intent.
    pub async fn verify(
        &self,
        tid: &str,
        reported: &str,
        signature: Option<&str>,
    ) -> Result<PaymentIntent, PaymentError> {
        let outcome = IntentStatus::from_reported(reported)
            .ok_or(PaymentError::InvalidRequest { code: "invalid_status", message: "Invalid status" })?;
        let intent = self.store.get(tid).await?.ok_or(PaymentError::NotFound)?;

        if let Some(candidate) = signature.filter(|s| !s.trim().is_empty()) {
            if !self.signer.verify(&intent.payload, candidate) {
                self.metrics.verifications.with_label_values(&["rejected"]).inc();
                warn!(tid, "Payment verification signature mismatch");
                return Err(PaymentError::SignatureMismatch);
            }
        }

        let intent = self.expire_if_overdue(intent).await?;
        if intent.status.is_terminal() {
            self.metrics.verifications.with_label_values(&["rejected"]).inc();
            return Err(PaymentError::AlreadyProcessed(intent.status));
        }

        let now = self.clock.now();
        let Some(updated) = self.store.complete_pending(tid, outcome, now).await? else {
            // Lost the race to a concurrent verification or expiry.
            self.metrics.verifications.with_label_values(&["rejected"]).inc();
            let current = self.store.get(tid).await?.ok_or(PaymentError::NotFound)?;
            return Err(PaymentError::AlreadyProcessed(current.status));
        };
        self.metrics.verifications.with_label_values(&[outcome.as_str()]).inc();
        info!(tid, status = outcome.as_str(), "Payment intent verified");

        self.reconcile_order(&updated).await;
        Ok(updated)
    }

    /// Expires every overdue pending intent; used by the background sweeper.
    pub async fn expire_overdue(&self) -> Result<u64, PaymentError> {
        let expired = self.store.expire_overdue(self.clock.now()).await?;
        if expired > 0 {
            self.metrics.intents_expired.inc_by(expired);
            info!(expired, "Expired overdue payment intents");
        }
        Ok(expired)
    }

    async fn expire_if_overdue(&self, intent: PaymentIntent) -> Result<PaymentIntent, PaymentError> {
        let now = self.clock.now();
        if !intent.is_overdue(now) {
            return Ok(intent);
        }
        match self.store.complete_pending(&intent.transaction_id, IntentStatus::Expired, now).await? {
            Some(expired) => {
                self.metrics.intents_expired.inc();
                info!(tid = %expired.transaction_id, "Payment intent expired");
                Ok(expired)
            }
            None => self.store.get(&intent.transaction_id).await?.ok_or(PaymentError::NotFound),
        }
    }

    // Failures here are logged and counted; the intent outcome stands.
    async fn reconcile_order(&self, intent: &PaymentIntent) {
        let Some(order_id) = intent.order_id.as_deref() else { return };
        let Some(update) = OrderUpdate::for_outcome(intent.status) else { return };
        match self.orders.apply_payment_outcome(order_id, update).await {
            Ok(true) => info!(
                tid = %intent.transaction_id,
                order_id,
                payment_status = update.payment_status.as_str(),
                status = update.status.as_str(),
                "Order reconciled with payment outcome"
            ),
            Ok(false) => warn!(tid = %intent.transaction_id, order_id, "Order for payment intent not found"),
            Err(err) => {
                self.metrics.reconcile_failures.inc();
                error!(tid = %intent.transaction_id, order_id, error = %err, "Failed to reconcile order");
            }
        }
    }
}
