use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{Request, State},
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, StatusCode,
    },
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use common_http_errors::ApiError;
use common_observability::PaymentMetrics;
use sqlx::postgres::PgPoolOptions;
use subtle::ConstantTimeEq;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use crate::config::PaymentConfig;
use crate::manager::PaymentIntentManager;
use crate::merchant::SharedMerchantHandle;
use crate::orders::{InMemoryOrderStore, OrderStoreRef};
use crate::payment_handlers::{
    create_payment, merchant_upi, payment_status, set_merchant_upi, status_missing_tid, verify_payment,
};
use crate::repo::{PgOrderStore, PgTransactionStore};
use crate::signature::Signer;
use crate::store::{InMemoryTransactionStore, TransactionStoreRef};

const SERVICE_NAME: &str = "payment-service";
const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<PaymentIntentManager>,
    pub merchant: SharedMerchantHandle,
    pub admin_api_key: Option<Arc<str>>,
    pub metrics: Arc<PaymentMetrics>,
}

/// Wires stores, signer and merchant handle from configuration. PostgreSQL is
/// used when a database URL is configured.
pub async fn build_state(config: &PaymentConfig) -> anyhow::Result<AppState> {
    let signer = Signer::new(&config.merchant_secret).context("invalid MERCHANT_SECRET_KEY")?;
    let merchant = SharedMerchantHandle::new(&config.merchant_upi).context("invalid MERCHANT_UPI_ID")?;
    let metrics = Arc::new(PaymentMetrics::new());

    let (store, orders): (TransactionStoreRef, OrderStoreRef) = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .context("failed to connect to DATABASE_URL")?;
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("failed to run payment migrations")?;
            info!("Using PostgreSQL payment store");
            (Arc::new(PgTransactionStore::new(pool.clone())), Arc::new(PgOrderStore::new(pool)))
        }
        None => {
            warn!("DATABASE_URL not set; payment intents are kept in memory and lost on restart");
            (Arc::new(InMemoryTransactionStore::new()), Arc::new(InMemoryOrderStore::new()))
        }
    };

    let manager = PaymentIntentManager::new(store, orders, signer, Arc::new(merchant.clone()), metrics.clone());
    Ok(AppState {
        manager: Arc::new(manager),
        merchant,
        admin_api_key: config.admin_api_key.as_deref().map(Arc::from),
        metrics,
    })
}

pub async fn health() -> &'static str {
    "ok"
}

async fn metrics_endpoint(State(state): State<AppState>) -> (StatusCode, String) {
    match state.metrics.render() {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("metrics encode error: {e}")),
    }
}

pub async fn http_error_metrics(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let resp = next.run(req).await;
    let status = resp.status();
    if status.as_u16() >= 400 {
        let code = resp.headers().get("X-Error-Code").and_then(|v| v.to_str().ok()).unwrap_or("unknown");
        state.metrics.http_errors_total.with_label_values(&[SERVICE_NAME, code, status.as_str()]).inc();
    }
    resp
}

/// Admin routes need `X-Admin-Token` equal to the configured key; with no key
/// configured they are closed.
pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(expected) = state.admin_api_key.as_deref() else {
        warn!("Admin request rejected: ADMIN_API_KEY is not configured");
        return ApiError::Unauthorized { code: "unauthorized" }.into_response();
    };
    let provided = req.headers().get(ADMIN_TOKEN_HEADER).and_then(|v| v.to_str().ok()).unwrap_or("");
    if !bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
        warn!("Admin request rejected: bad token");
        return ApiError::Unauthorized { code: "unauthorized" }.into_response();
    }
    next.run(req).await
}

pub fn build_router(state: AppState) -> Router {
    let allowed_origins = [
        "http://localhost:3000",
        "http://localhost:3001",
        "http://localhost:5173",
    ];
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(
            allowed_origins.iter().filter_map(|o| o.parse::<HeaderValue>().ok()).collect::<Vec<_>>(),
        ))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([ACCEPT, CONTENT_TYPE, HeaderName::from_static(ADMIN_TOKEN_HEADER)]);

    let admin = Router::new()
        .route("/api/admin/merchant-upi", put(set_merchant_upi))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/healthz", get(health))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/payment/create", post(create_payment))
        .route("/api/payment/status", get(status_missing_tid))
        .route("/api/payment/status/", get(status_missing_tid))
        .route("/api/payment/status/:tid", get(payment_status))
        .route("/api/payment/verify", post(verify_payment))
        .route("/api/payment/merchant-upi", get(merchant_upi))
        .merge(admin)
        .layer(middleware::from_fn_with_state(state.clone(), http_error_metrics))
        .with_state(state)
        .layer(cors)
}
