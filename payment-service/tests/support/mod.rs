#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use common_observability::PaymentMetrics;
use payment_service::{
    build_router,
    clock::ManualClock,
    merchant::SharedMerchantHandle,
    orders::InMemoryOrderStore,
    signature::Signer,
    store::InMemoryTransactionStore,
    AppState, PaymentIntentManager,
};
use serde_json::Value;
use tower::ServiceExt;

pub const SECRET: &str = "integration-secret";
pub const MERCHANT_UPI: &str = "shop@ybl";
pub const ADMIN_KEY: &str = "admin-token-123";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    pub orders: InMemoryOrderStore,
    pub store: InMemoryTransactionStore,
}

pub fn start_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z").unwrap().with_timezone(&Utc)
}

pub fn test_app() -> TestApp {
    test_app_with_admin(Some(ADMIN_KEY))
}

pub fn test_app_with_admin(admin_key: Option<&str>) -> TestApp {
    let store = InMemoryTransactionStore::new();
    let orders = InMemoryOrderStore::new();
    let clock = Arc::new(ManualClock::new(start_time()));
    let metrics = Arc::new(PaymentMetrics::new());
    let merchant = SharedMerchantHandle::new(MERCHANT_UPI).unwrap();
    let manager = PaymentIntentManager::new(
        Arc::new(store.clone()),
        Arc::new(orders.clone()),
        Signer::new(SECRET).unwrap(),
        Arc::new(merchant.clone()),
        metrics.clone(),
    )
    .with_clock(clock.clone());
    let state = AppState {
        manager: Arc::new(manager),
        merchant,
        admin_api_key: admin_key.map(Arc::from),
        metrics,
    };
    TestApp { router: build_router(state.clone()), state, clock, orders, store }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>, headers: &[(&str, &str)]) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let req = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send_request(req).await
    }

    pub async fn send_request(&self, req: Request<Body>) -> TestResponse {
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = to_bytes(resp.into_body(), 1024 * 64).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
        };
        TestResponse { status, headers, body }
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.send("POST", uri, Some(body), &[]).await
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send("GET", uri, None, &[]).await
    }

    /// `(paymentStatus, status)` of a seeded order.
    pub async fn orders_snapshot(&self, order_id: &str) -> (String, String) {
        let order = self.orders.get(order_id).await.expect("order seeded");
        (order.payment_status.as_str().to_string(), order.status.as_str().to_string())
    }

    /// Creates an intent and returns the create response body.
    pub async fn create(&self, body: Value) -> Value {
        let resp = self.post("/api/payment/create", body).await;
        assert_eq!(resp.status, StatusCode::OK, "create failed: {}", resp.body);
        resp.body
    }
}

pub fn assert_error(resp: &TestResponse, status: StatusCode, code: &str, message: &str) {
    assert_eq!(resp.status, status, "body: {}", resp.body);
    assert_eq!(resp.body["code"], code);
    assert_eq!(resp.body["error"], message);
    assert_eq!(resp.headers.get("X-Error-Code").and_then(|v| v.to_str().ok()), Some(code));
}

pub fn is_transaction_id(tid: &str) -> bool {
    tid.len() == 22
        && tid.starts_with("TXN")
        && tid[3..16].chars().all(|c| c.is_ascii_digit())
        && tid[16..].chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}
