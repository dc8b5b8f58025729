//! Provider payloads and the deep links mobile clients open to pay.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use common_money::{display_amount, to_minor_units_floor, MoneyError};
use rand::Rng;
use serde::Serialize;
use thiserror::Error;

use crate::domain::Provider;

const CURRENCY: &str = "INR";
const ID_PREFIX: &str = "TXN";
const ID_SUFFIX_LEN: usize = 6;
const ID_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const NOTE_WORDS: &[&str] = &[
    "Groceries", "Dinner", "Lunch", "Snacks", "Books", "Gift", "Tickets", "Shopping", "Fuel",
    "Coffee", "Rent", "Bills", "Travel", "Movie", "Clothes", "Dues",
];

#[derive(Debug, Error)]
pub enum DeepLinkError {
    #[error("amount cannot be expressed in paise: {0}")]
    Amount(#[from] MoneyError),
    #[error("payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PhonePeContact<'a> {
    cbs_name: &'a str,
    nick_name: &'a str,
    vpa: &'a str,
    r#type: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PhonePeCheckoutParams<'a> {
    note: &'a str,
    is_by_default_known_contact: bool,
    enable_amount_editing: bool,
    show_qr_code_option: bool,
    disable_view_history: bool,
    should_show_unsaved_contact_banner: bool,
    is_recurring: bool,
    checkout_type: &'a str,
    transaction_context: &'a str,
    initial_amount: i64,
    disable_notes_edit: bool,
    show_keyboard: bool,
    currency: &'a str,
    should_show_masked_number: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PhonePePayload<'a> {
    contact: PhonePeContact<'a>,
    p2p_payment_checkout_params: PhonePeCheckoutParams<'a>,
}

#[derive(Serialize)]
struct PaytmPayload<'a> {
    pa: &'a str,
    pn: &'a str,
    am: &'a str,
    tn: &'a str,
    cu: &'a str,
    uri: String,
}

/// Inputs shared by every provider.
#[derive(Debug, Clone, Copy)]
pub struct LinkRequest<'a> {
    pub provider: Provider,
    pub upi: &'a str,
    pub amount: &'a BigDecimal,
    pub note: &'a str,
}

/// Base64 payload plus the URI the client launches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltLink {
    pub payload: String,
    pub deep_link: String,
}

pub fn build_link(req: LinkRequest<'_>) -> Result<BuiltLink, DeepLinkError> {
    let amount = display_amount(req.amount);
    let json = match req.provider {
        Provider::PhonePe => {
            let payload = PhonePePayload {
                contact: PhonePeContact { cbs_name: "", nick_name: "", vpa: req.upi, r#type: "VPA" },
                p2p_payment_checkout_params: PhonePeCheckoutParams {
                    note: req.note,
                    is_by_default_known_contact: true,
                    enable_amount_editing: false,
                    show_qr_code_option: false,
                    disable_view_history: true,
                    should_show_unsaved_contact_banner: false,
                    is_recurring: false,
                    checkout_type: "DEFAULT",
                    transaction_context: "p2p",
                    initial_amount: to_minor_units_floor(req.amount)?,
                    disable_notes_edit: true,
                    show_keyboard: false,
                    currency: CURRENCY,
                    should_show_masked_number: true,
                },
            };
            serde_json::to_vec(&payload)?
        }
        Provider::Paytm => {
            let payload = PaytmPayload {
                pa: req.upi,
                pn: req.upi,
                am: &amount,
                tn: req.note,
                cu: CURRENCY,
                uri: format!("upi://pay?pa={}&pn={}&am={}&tn={}&cu={}", req.upi, req.upi, amount, req.note, CURRENCY),
            };
            serde_json::to_vec(&payload)?
        }
    };
    let payload = BASE64_STANDARD.encode(json);
    let deep_link = match req.provider {
        Provider::PhonePe => format!("phonepe://native?data={}&id=p2ppayment", urlencoding::encode(&payload)),
        // Paytm takes the raw parameters, not the encoded payload.
        Provider::Paytm => format!(
            "paytmmp://cash_wallet?pa={upi}&am={amount}&tn={note}&pn={upi}&mc=&cu={CURRENCY}&url=&mode=&purpose=&orgid=&sign=&featuretype=money_transfer",
            upi = req.upi,
            note = req.note,
        ),
    };
    Ok(BuiltLink { payload, deep_link })
}

/// `TXN` + epoch millis + random uppercase alphanumeric suffix.
pub fn generate_transaction_id(now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| ID_CHARSET[rng.gen_range(0..ID_CHARSET.len())] as char)
        .collect();
    format!("{ID_PREFIX}{}{suffix}", now.timestamp_millis())
}

/// Short human-looking reference such as `Groceries482`.
pub fn generate_note() -> String {
    let mut rng = rand::thread_rng();
    let word = NOTE_WORDS[rng.gen_range(0..NOTE_WORDS.len())];
    format!("{word}{}", rng.gen_range(100..1000))
}
