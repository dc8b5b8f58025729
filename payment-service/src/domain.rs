use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    PhonePe,
    Paytm,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::PhonePe => "phonepe",
            Provider::Paytm => "paytm",
        }
    }

    /// Case-insensitive, so `PhonePe` and `PAYTM` are accepted.
    pub fn parse(s: &str) -> Option<Provider> {
        match s.trim().to_ascii_lowercase().as_str() {
            "phonepe" => Some(Provider::PhonePe),
            "paytm" => Some(Provider::Paytm),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentStatus {
    Pending,
    Success,
    Failed,
    Expired,
}

impl IntentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentStatus::Pending => "pending",
            IntentStatus::Success => "success",
            IntentStatus::Failed => "failed",
            IntentStatus::Expired => "expired",
        }
    }

    pub fn from_str(s: &str) -> Option<IntentStatus> {
        match s {
            "pending" => Some(IntentStatus::Pending),
            "success" => Some(IntentStatus::Success),
            "failed" => Some(IntentStatus::Failed),
            "expired" => Some(IntentStatus::Expired),
            _ => None,
        }
    }

    /// Outcomes a client may report through verification.
    pub fn from_reported(s: &str) -> Option<IntentStatus> {
        match s.trim().to_ascii_lowercase().as_str() {
            "success" => Some(IntentStatus::Success),
            "failed" => Some(IntentStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, IntentStatus::Pending)
    }
}

impl fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Valid transitions:
/// pending -> success | failed | expired
/// Terminal states never move again.
pub fn is_valid_transition(from: IntentStatus, to: IntentStatus) -> bool {
    from == IntentStatus::Pending && to.is_terminal()
}

/// One attempt to collect a payment through a deep-linked UPI app.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentIntent {
    pub transaction_id: String,
    pub order_id: Option<String>,
    pub user_id: Option<String>,
    pub amount: BigDecimal,
    pub provider: Provider,
    pub merchant_upi: String,
    pub payload: String,
    pub signature: String,
    pub deep_link: String,
    pub note: String,
    pub status: IntentStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl PaymentIntent {
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == IntentStatus::Pending && now > self.expires_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderPaymentStatus {
    Unpaid,
    Paid,
    Failed,
}

impl OrderPaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderPaymentStatus::Unpaid => "unpaid",
            OrderPaymentStatus::Paid => "paid",
            OrderPaymentStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

/// The slice of an order this service writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub id: String,
    pub payment_status: OrderPaymentStatus,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderUpdate {
    pub payment_status: OrderPaymentStatus,
    pub status: OrderStatus,
}

impl OrderUpdate {
    /// Order changes implied by a completed intent; `None` for outcomes that
    /// leave the order alone.
    pub fn for_outcome(status: IntentStatus) -> Option<OrderUpdate> {
        match status {
            IntentStatus::Success => Some(OrderUpdate {
                payment_status: OrderPaymentStatus::Paid,
                status: OrderStatus::Confirmed,
            }),
            IntentStatus::Failed => Some(OrderUpdate {
                payment_status: OrderPaymentStatus::Failed,
                status: OrderStatus::Cancelled,
            }),
            IntentStatus::Pending | IntentStatus::Expired => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_parse_ignores_case() {
        assert_eq!(Provider::parse("PhonePe"), Some(Provider::PhonePe));
        assert_eq!(Provider::parse("PAYTM"), Some(Provider::Paytm));
        assert_eq!(Provider::parse("gpay"), None);
    }

    #[test]
    fn only_pending_moves() {
        assert!(is_valid_transition(IntentStatus::Pending, IntentStatus::Success));
        assert!(is_valid_transition(IntentStatus::Pending, IntentStatus::Expired));
        assert!(!is_valid_transition(IntentStatus::Pending, IntentStatus::Pending));
        for from in [IntentStatus::Success, IntentStatus::Failed, IntentStatus::Expired] {
            for to in [IntentStatus::Pending, IntentStatus::Success, IntentStatus::Failed, IntentStatus::Expired] {
                assert!(!is_valid_transition(from, to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn reported_status_is_restricted() {
        assert_eq!(IntentStatus::from_reported("success"), Some(IntentStatus::Success));
        assert_eq!(IntentStatus::from_reported("FAILED"), Some(IntentStatus::Failed));
        assert_eq!(IntentStatus::from_reported("expired"), None);
        assert_eq!(IntentStatus::from_reported("refunded"), None);
    }

    #[test]
    fn order_updates_follow_outcome() {
        let paid = OrderUpdate::for_outcome(IntentStatus::Success).unwrap();
        assert_eq!(paid.payment_status, OrderPaymentStatus::Paid);
        assert_eq!(paid.status, OrderStatus::Confirmed);
        let failed = OrderUpdate::for_outcome(IntentStatus::Failed).unwrap();
        assert_eq!(failed.payment_status, OrderPaymentStatus::Failed);
        assert_eq!(failed.status, OrderStatus::Cancelled);
        assert!(OrderUpdate::for_outcome(IntentStatus::Expired).is_none());
    }
}
