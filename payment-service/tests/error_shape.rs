use axum::body::to_bytes;
use axum::response::IntoResponse;
use common_http_errors::ApiError;
use payment_service::{domain::IntentStatus, PaymentError};

#[tokio::test]
async fn already_processed_error_shape() {
    let err: ApiError = PaymentError::AlreadyProcessed(IntentStatus::Failed).into();
    let resp = err.into_response();
    assert_eq!(resp.status().as_u16(), 400);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "already_processed");
    let body_bytes = to_bytes(resp.into_body(), 1024 * 8).await.unwrap();
    let text = String::from_utf8(body_bytes.to_vec()).unwrap();
    assert!(text.contains("\"error\":\"Transaction already failed\""), "unexpected body: {}", text);
}

#[tokio::test]
async fn internal_errors_hide_details() {
    let err: ApiError = PaymentError::Store(payment_service::store::StoreError::Backend("pool timed out".into())).into();
    let resp = err.into_response();
    assert_eq!(resp.status().as_u16(), 500);
    let body_bytes = to_bytes(resp.into_body(), 1024 * 8).await.unwrap();
    let text = String::from_utf8(body_bytes.to_vec()).unwrap();
    assert!(!text.contains("pool timed out"));
    assert!(text.contains("internal_error"));
}
