//! HMAC-SHA256 signatures in the form the embed login endpoint checks:
//! keyed by the embed secret, rendered as base64url with padding.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn mac(secret: &[u8], blob: &str) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(blob.as_bytes());
    mac
}

/// Sign the UTF-8 bytes of `blob`.
pub fn sign(secret: &[u8], blob: &str) -> String {
    URL_SAFE.encode(mac(secret, blob).finalize().into_bytes())
}

/// Check `signature` against `blob` in constant time.
///
/// Anything that is not padded base64url fails, including the standard
/// alphabet.
pub fn verify(secret: &[u8], blob: &str, signature: &str) -> bool {
    let Ok(digest) = URL_SAFE.decode(signature) else {
        return false;
    };
    mac(secret, blob).verify_slice(&digest).is_ok()
}
