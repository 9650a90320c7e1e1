use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// An append-only audit trail row. Written for every security-relevant
/// event (logins, grants, admin mutations, key rotation) and never updated.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub event: String,
    pub actor_sub: Option<String>,
    pub actor_cohort: Option<String>,
    pub target: Option<String>,
    pub ip: Option<String>,
    pub metadata: serde_json::Value,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
pub struct NewAuditLogEntry {
    pub event: String,
    pub actor_sub: Option<String>,
    pub actor_cohort: Option<String>,
    pub target: Option<String>,
    pub ip: Option<String>,
    pub metadata: serde_json::Value,
}

pub mod events {
    pub const LOGIN_SUCCESS: &str = "login.success";
    pub const LOGIN_FAILURE: &str = "login.failure";
    pub const TOKEN_ISSUED: &str = "token.issued";
    pub const TOKEN_REFRESHED: &str = "token.refreshed";
    pub const CLIENT_CREATED: &str = "client.created";
    pub const CLIENT_UPDATED: &str = "client.updated";
    pub const USER_CREATED: &str = "user.created";
    pub const ADMIN_CREATED: &str = "admin.created";
    pub const KEY_ROTATED: &str = "signing_key.rotated";
    pub const SETTINGS_UPDATED: &str = "settings.updated";
    pub const INSTALL_COMPLETED: &str = "install.completed";
    pub const USER_DELETED: &str = "user.deleted";
    pub const ADMIN_DELETED: &str = "admin.deleted";
    pub const CLIENT_DELETED: &str = "client.deleted";
    pub const LOGOUT: &str = "logout";
    pub const OTP_ENROLLED: &str = "otp.enrolled";
    pub const OTP_VERIFIED: &str = "otp.verified";
}
