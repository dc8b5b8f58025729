use prometheus::{IntCounter, Histogram, Registry, IntCounterVec, Encoder, TextEncoder};

#[derive(Clone)]
pub struct PaymentMetrics {
    pub registry: Registry,
    pub intents_created: IntCounterVec,
    pub verifications: IntCounterVec,
    pub intents_expired: IntCounter,
    pub reconcile_failures: IntCounter,
    pub sweeper_duration_seconds: Histogram,
    pub http_errors_total: IntCounterVec,
}

impl PaymentMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();
        let intents_created = IntCounterVec::new(
            prometheus::Opts::new("payment_intents_created_total", "Payment intents created"),
            &["provider"],
        ).unwrap();
        let verifications = IntCounterVec::new(
            prometheus::Opts::new(
                "payment_verifications_total",
                "Verification attempts by outcome (success, failed, rejected)"
            ),
            &["outcome"],
        ).unwrap();
        let intents_expired = IntCounter::new(
            "payment_intents_expired_total",
            "Pending intents moved to expired",
        ).unwrap();
        let reconcile_failures = IntCounter::new(
            "payment_order_reconcile_failures_total",
            "Order status updates that failed after a verification",
        ).unwrap();
        let sweeper_duration_seconds = Histogram::with_opts(
            prometheus::HistogramOpts::new(
                "payment_expiry_sweep_duration_seconds",
                "Duration of a payment intent expiry sweep"
            ).buckets(vec![0.001,0.005,0.01,0.05,0.1,0.25,0.5,1.0])
        ).unwrap();
        let http_errors_total = IntCounterVec::new(
            prometheus::Opts::new(
                "http_errors_total",
                "Count of HTTP error responses emitted (status >= 400)"
            ),
            &["service", "code", "status"]
        ).unwrap();
        let _ = registry.register(Box::new(intents_created.clone()));
        let _ = registry.register(Box::new(verifications.clone()));
        let _ = registry.register(Box::new(intents_expired.clone()));
        let _ = registry.register(Box::new(reconcile_failures.clone()));
        let _ = registry.register(Box::new(sweeper_duration_seconds.clone()));
        let _ = registry.register(Box::new(http_errors_total.clone()));
        PaymentMetrics { registry, intents_created, verifications, intents_expired, reconcile_failures, sweeper_duration_seconds, http_errors_total }
    }

    /// Text exposition of every registered family.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&families, &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).to_string())
    }
}

impl Default for PaymentMetrics {
    fn default() -> Self { Self::new() }
}
