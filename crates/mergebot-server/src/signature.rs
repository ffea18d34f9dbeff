//! Webhook delivery signatures.

use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Verify a GitHub `X-Hub-Signature-256` header against the raw request
/// body. The header value carries a `sha256=` prefix followed by the
/// hex-encoded HMAC digest.
#[must_use]
pub fn verify(secret: &[u8], body: &[u8], signature: &str) -> bool {
    let Some(signature_hex) = signature.strip_prefix("sha256=") else {
        return false;
    };

    let Ok(expected) = hex::decode(signature_hex) else {
        return false;
    };

    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"development";
    const BODY: &[u8] = br#"{"zen":"Design for failure."}"#;
    // HMAC-SHA256 of BODY under SECRET.
    const SIGNATURE: &str =
        "sha256=84cf98d6a2656cf871a5d98db3eada136d8e2b707659eddd1fb6d50539febba2";

    #[test]
    fn accepts_valid_signature() {
        assert!(verify(SECRET, BODY, SIGNATURE));
    }

    #[test]
    fn rejects_wrong_secret() {
        assert!(!verify(b"other-secret", BODY, SIGNATURE));
    }

    #[test]
    fn rejects_tampered_body() {
        assert!(!verify(SECRET, br#"{"zen":"Tampered."}"#, SIGNATURE));
    }

    #[test]
    fn rejects_missing_prefix() {
        assert!(!verify(SECRET, BODY, SIGNATURE.trim_start_matches("sha256=")));
    }

    #[test]
    fn rejects_non_hex_signature() {
        assert!(!verify(SECRET, BODY, "sha256=not-hex"));
    }
}
