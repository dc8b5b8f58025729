use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use common_http_errors::{ApiError, ApiResult};
use common_money::display_amount;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::app::AppState;
use crate::domain::{IntentStatus, PaymentIntent, Provider};
use crate::manager::{NewIntent, PaymentError};
use crate::merchant::MerchantError;

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::InvalidRequest { code, message } => ApiError::bad_request(code, message),
            PaymentError::NotFound => ApiError::not_found("transaction_not_found", "Transaction not found"),
            PaymentError::SignatureMismatch => ApiError::bad_request("signature_mismatch", "Invalid signature"),
            PaymentError::AlreadyProcessed(status) => {
                ApiError::bad_request("already_processed", format!("Transaction already {status}"))
            }
            other => {
                error!(error = %other, "Payment request failed");
                ApiError::Internal { message: None }
            }
        }
    }
}

fn invalid_payload(rejection: JsonRejection) -> ApiError {
    warn!(error = %rejection, "Rejected malformed payment request body");
    ApiError::bad_request("invalid_payload", "Invalid payload")
}

// Amounts arrive as JSON numbers or numeric strings. Floats render as
// `100.0`; integral ones are trimmed to match how integers are echoed.
fn amount_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => {
            let text = n.to_string();
            Some(match text.strip_suffix(".0") {
                Some(integral) => integral.to_string(),
                None => text,
            })
        }
        other => Some(other.to_string()),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub pay_type: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatePaymentResponse {
    pub redirect_url: String,
    pub payload: String,
    pub sig: String,
    /// Epoch seconds.
    pub expires: i64,
    pub tid: String,
    pub amount: String,
}

impl From<PaymentIntent> for CreatePaymentResponse {
    fn from(intent: PaymentIntent) -> Self {
        Self {
            amount: display_amount(&intent.amount),
            expires: intent.expires_at.timestamp(),
            redirect_url: intent.deep_link,
            payload: intent.payload,
            sig: intent.signature,
            tid: intent.transaction_id,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusResponse {
    pub tid: String,
    pub status: IntentStatus,
    pub amount: String,
    pub pay_type: Provider,
    pub upi: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<PaymentIntent> for PaymentStatusResponse {
    fn from(intent: PaymentIntent) -> Self {
        Self {
            amount: display_amount(&intent.amount),
            tid: intent.transaction_id,
            status: intent.status,
            pay_type: intent.provider,
            upi: intent.merchant_upi,
            created_at: intent.created_at,
            completed_at: intent.completed_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    #[serde(default)]
    pub tid: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub message: String,
    pub tid: String,
    pub status: IntentStatus,
    pub amount: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MerchantUpiBody {
    pub upi: String,
}

pub async fn create_payment(
    State(state): State<AppState>,
    body: Result<Json<CreatePaymentRequest>, JsonRejection>,
) -> ApiResult<Json<CreatePaymentResponse>> {
    let Json(req) = body.map_err(invalid_payload)?;
    let intent = state
        .manager
        .create_intent(NewIntent {
            amount: amount_text(req.amount),
            pay_type: req.pay_type,
            order_id: req.order_id,
            user_id: req.user_id,
        })
        .await?;
    Ok(Json(intent.into()))
}

pub async fn payment_status(
    State(state): State<AppState>,
    Path(tid): Path<String>,
) -> ApiResult<Json<PaymentStatusResponse>> {
    let tid = tid.trim();
    if tid.is_empty() {
        return Err(ApiError::bad_request("missing_tid", "Transaction ID is required"));
    }
    let intent = state.manager.get_status(tid).await?;
    Ok(Json(intent.into()))
}

pub async fn status_missing_tid() -> ApiResult<Json<PaymentStatusResponse>> {
    Err(ApiError::bad_request("missing_tid", "Transaction ID is required"))
}

pub async fn verify_payment(
    State(state): State<AppState>,
    body: Result<Json<VerifyPaymentRequest>, JsonRejection>,
) -> ApiResult<Json<VerifyPaymentResponse>> {
    let Json(req) = body.map_err(invalid_payload)?;
    let present = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    let (Some(tid), Some(reported)) = (present(req.tid), present(req.status)) else {
        return Err(ApiError::bad_request("missing_fields", "Missing required fields"));
    };

    let intent = state.manager.verify(&tid, &reported, req.signature.as_deref()).await?;
    Ok(Json(VerifyPaymentResponse {
        success: true,
        message: format!("Payment {}", intent.status),
        amount: display_amount(&intent.amount),
        tid: intent.transaction_id,
        status: intent.status,
    }))
}

pub async fn merchant_upi(State(state): State<AppState>) -> ApiResult<Json<MerchantUpiBody>> {
    let upi = state.manager.merchant_upi().await?;
    Ok(Json(MerchantUpiBody { upi }))
}

pub async fn set_merchant_upi(
    State(state): State<AppState>,
    body: Result<Json<MerchantUpiBody>, JsonRejection>,
) -> ApiResult<Json<MerchantUpiBody>> {
    let Json(req) = body.map_err(invalid_payload)?;
    let upi = state.merchant.set(&req.upi).await.map_err(|err| {
        let message = match err {
            MerchantError::Empty => "UPI handle is required".to_string(),
            MerchantError::Malformed(_) => "Invalid UPI handle".to_string(),
        };
        ApiError::bad_request("invalid_upi", message)
    })?;
    info!(upi = %upi, "Merchant UPI handle updated");
    Ok(Json(MerchantUpiBody { upi }))
}
