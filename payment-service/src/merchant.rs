use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MerchantError {
    #[error("merchant UPI handle is empty")]
    Empty,
    #[error("merchant UPI handle '{0}' is not of the form name@bank")]
    Malformed(String),
}

/// Checks a receiving handle before it is embedded raw in deep links.
pub fn validate_upi(raw: &str) -> Result<String, MerchantError> {
    let handle = raw.trim();
    if handle.is_empty() {
        return Err(MerchantError::Empty);
    }
    let well_formed = handle
        .split_once('@')
        .map(|(name, bank)| !name.is_empty() && !bank.is_empty() && !bank.contains('@'))
        .unwrap_or(false)
        && handle
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '-' | '_'));
    if !well_formed {
        return Err(MerchantError::Malformed(handle.to_string()));
    }
    Ok(handle.to_string())
}

/// Where the current receiving handle comes from.
#[async_trait]
pub trait MerchantHandleSource: Send + Sync {
    async fn current(&self) -> Result<String, MerchantError>;
}

/// A handle fixed for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct StaticMerchantHandle(String);

impl StaticMerchantHandle {
    pub fn new(raw: &str) -> Result<Self, MerchantError> {
        validate_upi(raw).map(Self)
    }
}

#[async_trait]
impl MerchantHandleSource for StaticMerchantHandle {
    async fn current(&self) -> Result<String, MerchantError> {
        Ok(self.0.clone())
    }
}

/// A handle that administrators can replace at runtime.
#[derive(Debug, Clone)]
pub struct SharedMerchantHandle {
    inner: Arc<RwLock<String>>,
}

impl SharedMerchantHandle {
    pub fn new(raw: &str) -> Result<Self, MerchantError> {
        let handle = validate_upi(raw)?;
        Ok(Self { inner: Arc::new(RwLock::new(handle)) })
    }

    /// Replaces the handle and returns the normalized value.
    pub async fn set(&self, raw: &str) -> Result<String, MerchantError> {
        let handle = validate_upi(raw)?;
        *self.inner.write().await = handle.clone();
        Ok(handle)
    }
}

#[async_trait]
impl MerchantHandleSource for SharedMerchantHandle {
    async fn current(&self) -> Result<String, MerchantError> {
        Ok(self.inner.read().await.clone())
    }
}
