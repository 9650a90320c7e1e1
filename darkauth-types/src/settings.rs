use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Argon2id parameters used to derive the KEK from the install passphrase.
/// Persisted alongside the wrapped secrets they protect so a parameter
/// change can be detected and a re-wrap scheduled.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
pub struct KdfParams {
    pub salt: String,
    pub memory_cost_kib: u32,
    pub time_cost: u32,
    pub parallelism: u32,
    pub hash_length: u32,
}

impl KdfParams {
    pub const HASH_LENGTH: u32 = 32;

    /// Conservative floor per spec: >=128 MiB, >=3 iterations, >=4 lanes.
    pub fn defaults(salt: String) -> Self {
        Self {
            salt,
            memory_cost_kib: 128 * 1024,
            time_cost: 3,
            parallelism: 4,
            hash_length: Self::HASH_LENGTH,
        }
    }
}

/// A single row in the administrative settings table. Values are stored as
/// JSON so callers don't need a migration for every new scalar setting.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Setting {
    pub key: String,
    pub value: serde_json::Value,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Body of `PUT /admin/settings/{key}`.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
pub struct SettingUpdateRequest {
    pub value: serde_json::Value,
}

pub mod keys {
    pub const INSTALLED: &str = "installed";
    pub const ENCRYPTION_PUBLIC_JWK_VISIBLE: &str = "encryption_public_jwk_visible";
    pub const KDF_PARAMS: &str = "kdf_params";
    pub const ISSUER: &str = "issuer";
    /// Whether `POST /opaque/register/start` is reachable for the user
    /// cohort without an admin having pre-created the account. Defaults to
    /// `false`; admins flip it on via the settings endpoint.
    pub const SELF_REGISTRATION_ENABLED: &str = "self_registration_enabled";
}
