//! Webhook signature verification.
//!
//! Deliveries are signed with HMAC-SHA256 over the exact raw request body,
//! keyed by the secret exchanged during the handshake, hex encoded in
//! lower case.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Lower-case hex HMAC-SHA256 of `body` keyed by `secret`.
pub fn compute_signature(secret: &str, body: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Check `signature` against the expected signature for `body`.
///
/// The comparison is exact: an empty or upper-case signature never matches.
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    match compute_signature(secret, body) {
        Some(expected) => constant_time_compare(&expected, signature),
        None => false,
    }
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
