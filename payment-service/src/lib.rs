pub mod app;
pub mod clock;
pub mod config;
pub mod deeplink;
pub mod domain;
pub mod manager;
pub mod merchant;
pub mod orders;
pub mod payment_handlers;
pub mod repo;
pub mod signature;
pub mod store;
pub mod sweeper;

pub use app::{build_router, build_state, AppState};
pub use config::PaymentConfig;
pub use manager::{NewIntent, PaymentError, PaymentIntentManager, INTENT_TTL_SECS};
