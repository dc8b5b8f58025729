mod support;

use axum::http::StatusCode;
use serde_json::json;
use support::{assert_error, test_app, test_app_with_admin, ADMIN_KEY};

#[tokio::test]
async fn admin_update_changes_handle_for_new_links() {
    let app = test_app();
    let resp = app
        .send("PUT", "/api/admin/merchant-upi", Some(json!({"upi": " newshop@okaxis "})), &[("X-Admin-Token", ADMIN_KEY)])
        .await;
    assert_eq!(resp.status, StatusCode::OK, "body: {}", resp.body);
    assert_eq!(resp.body, json!({"upi": "newshop@okaxis"}));

    let resp = app.get("/api/payment/merchant-upi").await;
    assert_eq!(resp.body["upi"], "newshop@okaxis");

    let created = app.create(json!({"amount": 5, "payType": "paytm"})).await;
    assert!(created["redirect_url"].as_str().unwrap().contains("pa=newshop@okaxis&am=5"));
}

#[tokio::test]
async fn admin_update_requires_matching_token() {
    let app = test_app();
    let body = json!({"upi": "evil@ybl"});

    let resp = app.send("PUT", "/api/admin/merchant-upi", Some(body.clone()), &[]).await;
    assert_error(&resp, StatusCode::UNAUTHORIZED, "unauthorized", "Unauthorized");

    let resp = app
        .send("PUT", "/api/admin/merchant-upi", Some(body), &[("X-Admin-Token", "wrong")])
        .await;
    assert_error(&resp, StatusCode::UNAUTHORIZED, "unauthorized", "Unauthorized");

    let resp = app.get("/api/payment/merchant-upi").await;
    assert_eq!(resp.body["upi"], support::MERCHANT_UPI);
}

#[tokio::test]
async fn admin_routes_closed_without_configured_key() {
    let app = test_app_with_admin(None);
    let resp = app
        .send("PUT", "/api/admin/merchant-upi", Some(json!({"upi": "a@b"})), &[("X-Admin-Token", "")])
        .await;
    assert_error(&resp, StatusCode::UNAUTHORIZED, "unauthorized", "Unauthorized");
}

#[tokio::test]
async fn admin_update_validates_handle() {
    let app = test_app();
    let resp = app
        .send("PUT", "/api/admin/merchant-upi", Some(json!({"upi": "no-at-sign"})), &[("X-Admin-Token", ADMIN_KEY)])
        .await;
    assert_error(&resp, StatusCode::BAD_REQUEST, "invalid_upi", "Invalid UPI handle");

    let resp = app
        .send("PUT", "/api/admin/merchant-upi", Some(json!({"upi": "   "})), &[("X-Admin-Token", ADMIN_KEY)])
        .await;
    assert_error(&resp, StatusCode::BAD_REQUEST, "invalid_upi", "UPI handle is required");
}
