use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Upper bound on any `/crypto/*` blob's serialized size. The server never
/// parses these beyond this check -- the shape is a contract between
/// clients, not something this service enforces.
pub const MAX_BLOB_BYTES: usize = 10 * 1024;

/// A per-user client-side key-material blob (a wrapped DRK, a wrapped
/// encryption private key, or a public encryption JWK). The server stores
/// `value` as opaque JSON; it never inspects, derives, or validates its
/// contents beyond the size cap.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CryptoBlob {
    pub user_sub: String,
    pub value: serde_json::Value,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
pub struct CryptoBlobRequest {
    pub value: serde_json::Value,
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
pub struct CryptoBlobResponse {
    pub value: serde_json::Value,
}
