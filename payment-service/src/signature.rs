use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("signing secret must not be empty")]
    EmptySecret,
    #[error("invalid HMAC key")]
    InvalidKey,
}

/// HMAC-SHA256 over encoded intent payloads, keyed by the merchant secret.
#[derive(Clone)]
pub struct Signer {
    mac: HmacSha256,
}

impl Signer {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, SignatureError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(SignatureError::EmptySecret);
        }
        let mac = <HmacSha256 as Mac>::new_from_slice(secret).map_err(|_| SignatureError::InvalidKey)?;
        Ok(Self { mac })
    }

    /// Lowercase hex MAC of `payload`.
    pub fn sign(&self, payload: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Recomputes the MAC and compares it with `candidate` in constant time.
    pub fn verify(&self, payload: &str, candidate: &str) -> bool {
        let expected = self.sign(payload);
        let provided = candidate.trim().to_ascii_lowercase();
        expected.as_bytes().ct_eq(provided.as_bytes()).unwrap_u8() == 1
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("secret", &"***redacted***")
            .finish()
    }
}
