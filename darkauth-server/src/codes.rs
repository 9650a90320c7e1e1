//! Authorization code and PKCE verification helpers.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use darkauth_types::auth::random_token_b64;
use sha2::{Digest, Sha256};

use crate::error::{ApiError, ApiResult};

pub fn new_authorization_code() -> String {
    random_token_b64(32)
}

pub fn new_request_id() -> String {
    random_token_b64(24)
}

pub fn new_login_session_id() -> String {
    random_token_b64(24)
}

pub fn new_registration_id() -> String {
    random_token_b64(24)
}

/// Verifies `code_verifier` against a stored `code_challenge` under the
/// given `code_challenge_method` ("plain" or "S256").
pub fn verify_pkce(
    code_challenge: &str,
    code_challenge_method: &str,
    code_verifier: &str,
) -> ApiResult<()> {
    let computed = match code_challenge_method {
        "S256" => {
            let digest = Sha256::digest(code_verifier.as_bytes());
            URL_SAFE_NO_PAD.encode(digest)
        }
        "plain" => code_verifier.to_string(),
        other => {
            return Err(ApiError::InvalidRequest(format!(
                "unsupported code_challenge_method `{other}`"
            )));
        }
    };
    if computed != code_challenge {
        return Err(ApiError::InvalidGrant("PKCE verification failed".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s256_challenge_verifies_against_matching_verifier() {
        let verifier = "a-very-random-code-verifier-string-value";
        let digest = Sha256::digest(verifier.as_bytes());
        let challenge = URL_SAFE_NO_PAD.encode(digest);
        assert!(verify_pkce(&challenge, "S256", verifier).is_ok());
    }

    #[test]
    fn s256_challenge_rejects_wrong_verifier() {
        let digest = Sha256::digest(b"correct-verifier");
        let challenge = URL_SAFE_NO_PAD.encode(digest);
        assert!(verify_pkce(&challenge, "S256", "wrong-verifier").is_err());
    }

    #[test]
    fn unknown_method_is_rejected() {
        assert!(verify_pkce("x", "md5", "x").is_err());
    }
}
