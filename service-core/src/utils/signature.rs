use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Hex-encoded HMAC-SHA256 of `payload` keyed with `secret`.
pub fn hmac_sha256_hex(secret: &str, payload: &[u8]) -> Result<String, anyhow::Error> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("Invalid key length: {}", e))?;
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Hex-encoded SHA-256 digest.
pub fn sha256_hex(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}

/// Constant-time string comparison. Length is not secret.
pub fn constant_time_eq(expected: &str, provided: &str) -> bool {
    let expected = expected.as_bytes();
    let provided = provided.as_bytes();

    if expected.len() != provided.len() {
        return false;
    }

    expected.ct_eq(provided).into()
}

/// Verifies a hex HMAC-SHA256 signature over `payload`.
pub fn verify_hmac_sha256_hex(
    secret: &str,
    payload: &[u8],
    signature: &str,
) -> Result<bool, anyhow::Error> {
    let expected = hmac_sha256_hex(secret, payload)?;
    Ok(constant_time_eq(&expected, &signature.trim().to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hmac_matches_known_vector() {
        // RFC 4231 test case 2
        let sig = hmac_sha256_hex("Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(
            sig,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn sha256_matches_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn verify_accepts_valid_and_rejects_tampered() {
        let secret = "webhook_secret";
        let body = br#"{"event":"payment.captured"}"#;
        let sig = hmac_sha256_hex(secret, body).unwrap();

        assert!(verify_hmac_sha256_hex(secret, body, &sig).unwrap());
        assert!(verify_hmac_sha256_hex(secret, body, &sig.to_uppercase()).unwrap());
        assert!(!verify_hmac_sha256_hex(secret, br#"{"event":"payment.failed"}"#, &sig).unwrap());
        assert!(!verify_hmac_sha256_hex("other", body, &sig).unwrap());
        assert!(!verify_hmac_sha256_hex(secret, body, "").unwrap());
    }

    #[test]
    fn constant_time_eq_handles_length_mismatch() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(!constant_time_eq("abc", "abcd"));
        assert!(!constant_time_eq("abc", "abd"));
    }
}
