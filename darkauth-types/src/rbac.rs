use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// A single grantable permission, e.g. `"users:write"`.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Permission {
    pub key: String,
    pub description: Option<String>,
}

/// A named bundle of permissions assignable to groups or organization members.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Organization {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Where a membership stands in the invite/suspend lifecycle. Only `Active`
/// members count toward organization-context resolution and RBAC.
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[cfg_attr(
    feature = "sqlx",
    derive(sqlx::Type),
    sqlx(type_name = "membership_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    Active,
    Invited,
    Suspended,
}

/// A user's membership in an organization, carrying the roles that govern
/// their permissions while acting in that organization's context.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrganizationMember {
    pub organization_id: Uuid,
    pub user_sub: String,
    pub status: MembershipStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub joined_at: OffsetDateTime,
}

/// A role assignment within a specific organization membership.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrganizationMemberRole {
    pub organization_id: Uuid,
    pub user_sub: String,
    pub role_id: Uuid,
}

/// The fully resolved set of permissions for a user, optionally scoped to an
/// organization context. This is what gets embedded in ID-token claims, never
/// the raw role/group assignments.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug, Default)]
pub struct ResolvedPermissions {
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

impl ResolvedPermissions {
    /// Union direct, group, and organization-role permissions, deduplicating
    /// and sorting so token claims are stable across calls.
    pub fn union(sources: impl IntoIterator<Item = Vec<String>>) -> Vec<String> {
        let mut set: std::collections::BTreeSet<String> = std::collections::BTreeSet::new();
        for source in sources {
            set.extend(source);
        }
        set.into_iter().collect()
    }
}
