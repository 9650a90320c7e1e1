use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// An end-user account. The authentication path never mutates this row;
/// only admin-initiated CRUD and self-registration do.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    /// Opaque, immutable subject identifier used as `sub` in issued tokens.
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub password_reset_required: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
pub struct NewUser {
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "admin_role", rename_all = "lowercase"))]
pub enum AdminRole {
    Read,
    Write,
}

/// Same shape as [`User`] but in a distinct namespace -- admin and user
/// subjects never collide even if an operator reuses an email address.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Admin {
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub admin_role: AdminRole,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
pub struct NewAdmin {
    pub email: Option<String>,
    pub name: Option<String>,
    pub admin_role: AdminRole,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("sub", &self.sub)
            .field("email", &self.email)
            .field("name", &self.name)
            .field(
                "password_reset_required",
                &self.password_reset_required,
            )
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl std::fmt::Debug for Admin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Admin")
            .field("sub", &self.sub)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("admin_role", &self.admin_role)
            .field("created_at", &self.created_at)
            .finish()
    }
}
