//! Authentication of payment gateway callbacks.
//!
//! The gateway signs `order_ref|payment_ref` with HMAC-SHA256 under the shared
//! secret and sends the lowercase hex digest alongside the identifiers.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing {0}")]
    MissingField(&'static str),

    #[error("invalid signing key")]
    InvalidKey,
}

/// Server-held key shared with the payment gateway.
#[derive(Clone)]
pub struct GatewaySecret(Vec<u8>);

impl GatewaySecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self(secret.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for GatewaySecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GatewaySecret(**redacted**)")
    }
}

/// Lowercase hex HMAC-SHA256 of `order_ref|payment_ref`.
pub fn sign(order_ref: &str, payment_ref: &str, secret: &[u8]) -> Result<String, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| SignatureError::InvalidKey)?;
    mac.update(order_ref.as_bytes());
    mac.update(b"|");
    mac.update(payment_ref.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Checks a gateway-supplied signature.
///
/// A mismatch is `Ok(false)`. Errors are reserved for inputs the caller should
/// never have sent: empty identifiers, an empty signature, or an empty key.
///
/// # Security
///
/// The comparison runs in constant time over the encoded digest.
pub fn verify(
    order_ref: &str,
    payment_ref: &str,
    provided_signature: &str,
    secret: &[u8],
) -> Result<bool, SignatureError> {
    if order_ref.is_empty() {
        return Err(SignatureError::MissingField("order reference"));
    }
    if payment_ref.is_empty() {
        return Err(SignatureError::MissingField("payment reference"));
    }
    if provided_signature.is_empty() {
        return Err(SignatureError::MissingField("signature"));
    }
    if secret.is_empty() {
        return Err(SignatureError::InvalidKey);
    }

    let expected = sign(order_ref, payment_ref, secret)?;
    Ok(expected
        .as_bytes()
        .ct_eq(provided_signature.as_bytes())
        .into())
}
