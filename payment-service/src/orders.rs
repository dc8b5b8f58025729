use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::{OrderPaymentStatus, OrderRecord, OrderStatus, OrderUpdate};
use crate::store::StoreError;

/// Narrow view of the order store: payment reconciliation only.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Applies `update`; returns `false` when no such order exists.
    async fn apply_payment_outcome(&self, order_id: &str, update: OrderUpdate) -> Result<bool, StoreError>;
}

pub type OrderStoreRef = Arc<dyn OrderStore>;

#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<String, OrderRecord>>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an unpaid, pending order.
    pub async fn insert_pending(&self, order_id: &str) {
        let mut orders = self.orders.write().await;
        orders.insert(
            order_id.to_string(),
            OrderRecord {
                id: order_id.to_string(),
                payment_status: OrderPaymentStatus::Unpaid,
                status: OrderStatus::Pending,
            },
        );
    }

    pub async fn get(&self, order_id: &str) -> Option<OrderRecord> {
        self.orders.read().await.get(order_id).cloned()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn apply_payment_outcome(&self, order_id: &str, update: OrderUpdate) -> Result<bool, StoreError> {
        let mut orders = self.orders.write().await;
        match orders.get_mut(order_id) {
            Some(order) => {
                order.payment_status = update.payment_status;
                order.status = update.status;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
