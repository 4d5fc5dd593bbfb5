//! HMAC-SHA256 payload signing.
//!
//! Signatures are computed over the exact serialized bytes that go on the
//! wire, so a receiver can recompute the MAC over the request body it
//! read. Header format is `sha256=<lowercase hex>`.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{DeliveryError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Prefix carried by the signature header value.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Signs a payload with the subscription's secret.
///
/// The secret is used as raw key bytes, not hashed first. Returns the
/// header value `sha256=<hex digest>`.
///
/// # Errors
///
/// Returns `DeliveryError::Signing` if the key material is rejected by the
/// MAC implementation.
pub fn sign(payload: &[u8], secret: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| DeliveryError::signing(e.to_string()))?;

    mac.update(payload);
    let digest = mac.finalize().into_bytes();

    Ok(format!("{SIGNATURE_PREFIX}{}", hex::encode(digest)))
}

/// Verifies a signature header value against a payload and secret.
///
/// Recomputes the HMAC over `payload` and compares it to the header value
/// in constant time. Returns `false` for malformed headers, wrong secrets,
/// or any altered payload byte.
pub fn verify(payload: &[u8], header_value: &str, secret: &str) -> bool {
    let Some(provided) = header_value.strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };

    let Ok(expected) = sign(payload, secret) else {
        return false;
    };
    let expected = &expected[SIGNATURE_PREFIX.len()..];

    constant_time_eq(provided.as_bytes(), expected.as_bytes())
}

/// Constant-time byte comparison to avoid leaking digest prefixes.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
