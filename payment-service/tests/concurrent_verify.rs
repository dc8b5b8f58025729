mod support;

use axum::http::StatusCode;
use serde_json::json;
use support::test_app;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_verifies_have_one_winner() {
    let app = std::sync::Arc::new(test_app());
    app.orders.insert_pending("ord_race").await;
    let created = app.create(json!({"amount": 100, "payType": "phonepe", "orderId": "ord_race"})).await;
    let tid = created["tid"].as_str().unwrap().to_string();

    let mut handles = Vec::new();
    for i in 0..16 {
        let app = app.clone();
        let tid = tid.clone();
        let outcome = if i % 2 == 0 { "success" } else { "failed" };
        handles.push(tokio::spawn(async move {
            app.post("/api/payment/verify", json!({"tid": tid, "status": outcome})).await
        }));
    }

    let mut winners = Vec::new();
    let mut rejected = 0;
    for handle in handles {
        let resp = handle.await.unwrap();
        match resp.status {
            StatusCode::OK => winners.push(resp.body["status"].as_str().unwrap().to_string()),
            StatusCode::BAD_REQUEST => {
                assert_eq!(resp.body["code"], "already_processed");
                rejected += 1;
            }
            other => panic!("unexpected status {other}"),
        }
    }
    assert_eq!(winners.len(), 1);
    assert_eq!(rejected, 15);

    let (payment_status, status) = app.orders_snapshot("ord_race").await;
    if winners[0] == "success" {
        assert_eq!((payment_status.as_str(), status.as_str()), ("paid", "confirmed"));
    } else {
        assert_eq!((payment_status.as_str(), status.as_str()), ("failed", "cancelled"));
    }
}
