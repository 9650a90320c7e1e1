//! Resolves the effective permission set for a user: the union of
//! permissions granted directly, via group membership, and via roles held
//! in their current organization context.

use darkauth_types::rbac::ResolvedPermissions;
use uuid::Uuid;

use crate::{db::DbPool, error::ApiResult, queries};

pub async fn resolve(
    pool: &DbPool,
    user_sub: &str,
    organization_id: Option<Uuid>,
) -> ApiResult<ResolvedPermissions> {
    let direct = queries::rbac::direct_permissions_for_user(pool, user_sub).await?;
    let group = queries::rbac::group_permissions_for_user(pool, user_sub).await?;
    let org_roles = match organization_id {
        Some(org_id) => queries::rbac::organization_role_names(pool, user_sub, org_id).await?,
        None => Vec::new(),
    };
    let org_permissions = match organization_id {
        Some(org_id) => {
            queries::rbac::organization_role_permissions(pool, user_sub, org_id).await?
        }
        None => Vec::new(),
    };

    let permissions = ResolvedPermissions::union([direct, group, org_permissions]);
    Ok(ResolvedPermissions {
        roles: org_roles,
        permissions,
    })
}

/// Picks the organization a token's claims should be scoped to. If the
/// caller requested one and the user is an active member, that wins; if they
/// requested none or aren't a member of the one requested, fall back to the
/// user's active membership with the lexicographically lowest slug so the
/// choice is stable across logins. Returns `None` if the user belongs to no
/// organization at all.
pub async fn resolve_organization_context(
    pool: &DbPool,
    user_sub: &str,
    requested_org_id: Option<Uuid>,
) -> ApiResult<Option<Uuid>> {
    if let Some(org_id) = requested_org_id {
        if queries::organizations::is_active_member(pool, org_id, user_sub).await? {
            return Ok(Some(org_id));
        }
    }
    let memberships = queries::organizations::active_memberships_for_user(pool, user_sub).await?;
    Ok(memberships.into_iter().next().map(|org| org.id))
}

#[cfg(test)]
mod tests {
    use darkauth_types::rbac::ResolvedPermissions;

    #[test]
    fn union_deduplicates_and_sorts_across_sources() {
        let merged = ResolvedPermissions::union([
            vec!["users:write".to_string(), "users:read".to_string()],
            vec!["users:read".to_string()],
            vec!["billing:read".to_string()],
        ]);
        assert_eq!(
            merged,
            vec![
                "billing:read".to_string(),
                "users:read".to_string(),
                "users:write".to_string(),
            ]
        );
    }

    #[test]
    fn union_of_nothing_is_empty() {
        let merged = ResolvedPermissions::union(Vec::<Vec<String>>::new());
        assert!(merged.is_empty());
    }
}
