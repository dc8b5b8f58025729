use anyhow::Context;
use payment_service::{build_router, build_state, sweeper::spawn_expiry_sweeper, PaymentConfig};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = PaymentConfig::from_env()?;
    info!(?config, "Loaded payment configuration");

    let state = build_state(&config).await?;
    match config.expiry_sweep {
        Some(every) => {
            spawn_expiry_sweeper(state.manager.clone(), state.metrics.clone(), every);
        }
        None => info!("Expiry sweeper disabled"),
    }

    let app = build_router(state);
    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr).await.with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "starting payment-service");
    axum::serve(listener, app).await?;
    Ok(())
}
