mod support;

use std::time::Duration;

use payment_service::{domain::IntentStatus, store::TransactionStore, sweeper::spawn_expiry_sweeper};
use serde_json::json;
use support::test_app;

#[tokio::test]
async fn sweeper_expires_unpolled_intents() {
    let app = test_app();
    let created = app.create(json!({"amount": 10, "payType": "paytm"})).await;
    let tid = created["tid"].as_str().unwrap().to_string();
    app.clock.advance(chrono::Duration::seconds(700));

    let handle = spawn_expiry_sweeper(app.state.manager.clone(), app.state.metrics.clone(), Duration::from_millis(20));

    let mut status = IntentStatus::Pending;
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        status = app.store.get(&tid).await.unwrap().unwrap().status;
        if status != IntentStatus::Pending {
            break;
        }
    }
    handle.abort();

    assert_eq!(status, IntentStatus::Expired);
    assert_eq!(app.state.metrics.intents_expired.get(), 1);
    assert!(app.state.metrics.sweeper_duration_seconds.get_sample_count() >= 1);
}
