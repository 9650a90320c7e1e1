use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Persisted TOTP secret for a user or admin. The secret is KEK-wrapped at
/// rest exactly like OPAQUE envelope fields.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OtpCredential {
    pub sub: String,
    pub secret_enc: Vec<u8>,
    pub verified: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl std::fmt::Debug for OtpCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpCredential")
            .field("sub", &self.sub)
            .field("secret_enc", &"[REDACTED]")
            .field("verified", &self.verified)
            .field("created_at", &self.created_at)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
pub struct OtpSetupResponse {
    pub secret_base32: String,
    pub otpauth_url: String,
    /// Plaintext recovery codes, shown exactly once at enrollment. Only
    /// their hashes are ever persisted.
    pub recovery_codes: Vec<String>,
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OtpVerifyRequest {
    pub code: String,
}

impl std::fmt::Debug for OtpVerifyRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpVerifyRequest")
            .field("code", &"[REDACTED]")
            .finish()
    }
}

/// Fallback second-factor redemption when the caller has lost their TOTP
/// device: consumes one single-use recovery code instead of a 6-digit code.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OtpRecoveryVerifyRequest {
    pub recovery_code: String,
}

impl std::fmt::Debug for OtpRecoveryVerifyRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpRecoveryVerifyRequest")
            .field("recovery_code", &"[REDACTED]")
            .finish()
    }
}
