//! TOTP second-factor enrollment and verification (RFC 6238), plus the
//! single-use recovery codes issued alongside each enrollment.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use sha2::{Digest, Sha256};
use totp_rs::{Algorithm, Secret, TOTP};

use crate::error::{ApiError, ApiResult};

/// Number of recovery codes minted per enrollment.
pub const RECOVERY_CODE_COUNT: usize = 10;

fn build(secret_bytes: &[u8], account: &str, issuer: &str) -> ApiResult<TOTP> {
    TOTP::new(
        Algorithm::SHA1,
        6,
        1,
        30,
        secret_bytes.to_vec(),
        Some(issuer.to_string()),
        account.to_string(),
    )
    .map_err(|e| ApiError::CryptoError(format!("invalid totp parameters: {e}")))
}

/// Generates a fresh 20-byte TOTP secret plus the `otpauth://` enrollment
/// URL for a QR code. The raw secret is what gets KEK-wrapped and stored.
pub fn generate(account: &str, issuer: &str) -> ApiResult<(Vec<u8>, String, String)> {
    let mut secret_bytes = vec![0u8; 20];
    rand::rngs::OsRng.fill_bytes(&mut secret_bytes);
    let totp = build(&secret_bytes, account, issuer)?;
    let secret_base32 = Secret::Raw(secret_bytes.clone()).to_encoded().to_string();
    let otpauth_url = totp.get_url();
    Ok((secret_bytes, secret_base32, otpauth_url))
}

/// Verifies a user-entered 6-digit code against the stored secret, allowing
/// one step of clock skew in either direction.
pub fn verify(secret_bytes: &[u8], account: &str, issuer: &str, code: &str) -> ApiResult<bool> {
    let totp = build(secret_bytes, account, issuer)?;
    totp.check_current(code)
        .map_err(|e| ApiError::Internal(format!("totp check failed: {e}")))
}

/// Mints [`RECOVERY_CODE_COUNT`] fresh single-use recovery codes. Returns
/// each code's plaintext (shown to the caller exactly once) paired with
/// its SHA-256 hash (what actually gets persisted) -- the database never
/// holds anything a reader could redeem directly.
pub fn generate_recovery_codes() -> Vec<(String, String)> {
    (0..RECOVERY_CODE_COUNT)
        .map(|_| {
            let mut raw = [0u8; 10];
            rand::rngs::OsRng.fill_bytes(&mut raw);
            let code = format_recovery_code(&raw);
            let hash = hash_recovery_code(&code);
            (code, hash)
        })
        .collect()
}

/// Hashes a recovery code the same way at mint time and at redemption
/// time, so redemption is a plain equality check against stored hashes.
pub fn hash_recovery_code(code: &str) -> String {
    let digest = Sha256::digest(code.trim().to_uppercase().as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

fn format_recovery_code(raw: &[u8; 10]) -> String {
    let hex: String = raw.iter().map(|b| format!("{b:02X}")).collect();
    hex.as_bytes()
        .chunks(4)
        .map(|chunk| std::str::from_utf8(chunk).expect("hex digits are ascii"))
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_secret_validates_its_own_current_code() {
        let (secret_bytes, _b32, _url) = generate("user@example.com", "DarkAuth").unwrap();
        let totp = build(&secret_bytes, "user@example.com", "DarkAuth").unwrap();
        let code = totp.generate_current().unwrap();
        assert!(verify(&secret_bytes, "user@example.com", "DarkAuth", &code).unwrap());
    }

    #[test]
    fn wrong_code_does_not_verify() {
        let (secret_bytes, _b32, _url) = generate("user@example.com", "DarkAuth").unwrap();
        assert!(!verify(&secret_bytes, "user@example.com", "DarkAuth", "000000").unwrap());
    }

    #[test]
    fn recovery_codes_are_distinct_and_hash_matches_at_redemption() {
        let codes = generate_recovery_codes();
        assert_eq!(codes.len(), RECOVERY_CODE_COUNT);
        let mut plaintexts: Vec<&str> = codes.iter().map(|(c, _)| c.as_str()).collect();
        plaintexts.sort();
        plaintexts.dedup();
        assert_eq!(plaintexts.len(), RECOVERY_CODE_COUNT);

        for (code, hash) in &codes {
            assert_eq!(&hash_recovery_code(code), hash);
        }
    }

    #[test]
    fn recovery_code_hash_is_case_insensitive() {
        let (code, hash) = &generate_recovery_codes()[0];
        assert_eq!(&hash_recovery_code(&code.to_lowercase()), hash);
    }
}
