use std::{fmt, net::SocketAddr, time::Duration};

use anyhow::{bail, Context, Result};

const DEFAULT_SWEEP_SECS: u64 = 60;
const MIN_SWEEP_SECS: u64 = 5;

#[derive(Clone)]
pub struct PaymentConfig {
    pub merchant_secret: String,
    pub merchant_upi: String,
    pub admin_api_key: Option<String>,
    pub database_url: Option<String>,
    /// `None` disables the background sweeper.
    pub expiry_sweep: Option<Duration>,
    pub host: String,
    pub port: u16,
}

impl PaymentConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let merchant_secret = lookup("MERCHANT_SECRET_KEY").context("MERCHANT_SECRET_KEY must be set")?;
        if merchant_secret.is_empty() {
            bail!("MERCHANT_SECRET_KEY must not be empty");
        }
        let merchant_upi = non_empty("MERCHANT_UPI_ID").context("MERCHANT_UPI_ID must be set")?;

        let sweep_secs = match non_empty("EXPIRY_SWEEP_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("EXPIRY_SWEEP_SECS is not a number: {raw}"))?,
            None => DEFAULT_SWEEP_SECS,
        };
        let expiry_sweep = (sweep_secs > 0).then(|| Duration::from_secs(sweep_secs.max(MIN_SWEEP_SECS)));

        let port = match non_empty("PORT") {
            Some(raw) => raw.parse::<u16>().with_context(|| format!("PORT is not a valid port: {raw}"))?,
            None => 8086,
        };

        Ok(Self {
            merchant_secret,
            merchant_upi,
            admin_api_key: non_empty("ADMIN_API_KEY"),
            database_url: non_empty("DATABASE_URL"),
            expiry_sweep,
            host: non_empty("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let ip = self.host.parse().with_context(|| format!("HOST is not an IP address: {}", self.host))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

impl fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("merchant_secret", &"<redacted>")
            .field("merchant_upi", &self.merchant_upi)
            .field("admin_api_key", &self.admin_api_key.as_ref().map(|_| "<redacted>"))
            .field("database_url", &self.database_url.as_ref().map(|_| "<redacted>"))
            .field("expiry_sweep", &self.expiry_sweep)
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}
