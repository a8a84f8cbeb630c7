//! HMAC-SHA256 request signing.
//!
//! Every request to the server carries a `CTBREC-HMAC` header holding
//! the hex HMAC-SHA256 digest of the raw request body (the empty string
//! for GET requests), keyed with the secret fetched from
//! `/secured/hmac` at connect time.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute the hex HMAC-SHA256 digest of `payload` under `key`.
///
/// An empty key is valid and is used when the server does not expose an
/// HMAC secret.
pub fn sign(key: &[u8], payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(payload);
    let digest = mac.finalize().into_bytes();
    format!("{digest:x}")
}
