use darkauth_types::rbac::Organization;
use uuid::Uuid;

use crate::{db::DbPool, error::ApiResult};

pub async fn get_by_slug(pool: &DbPool, slug: &str) -> ApiResult<Organization> {
    let org = sqlx::query_as!(
        Organization,
        "select id, slug, name, created_at from organizations where slug = $1",
        slug,
    )
    .fetch_one(pool)
    .await?;
    Ok(org)
}

pub async fn get(pool: &DbPool, id: Uuid) -> ApiResult<Organization> {
    let org = sqlx::query_as!(
        Organization,
        "select id, slug, name, created_at from organizations where id = $1",
        id,
    )
    .fetch_one(pool)
    .await?;
    Ok(org)
}

pub async fn is_active_member(
    pool: &DbPool,
    organization_id: Uuid,
    user_sub: &str,
) -> ApiResult<bool> {
    let row = sqlx::query!(
        "select 1 as present from organization_members \
         where organization_id = $1 and user_sub = $2 and status = 'active'",
        organization_id,
        user_sub,
    )
    .fetch_optional(pool)
    .await?;
    Ok(row.is_some())
}

/// Organizations the user is an active member of, ordered by slug so the
/// deterministic-default pick in `rbac::resolve_organization_context` is
/// stable across calls.
pub async fn active_memberships_for_user(
    pool: &DbPool,
    user_sub: &str,
) -> ApiResult<Vec<Organization>> {
    let orgs = sqlx::query_as!(
        Organization,
        "select o.id, o.slug, o.name, o.created_at \
         from organizations o \
         join organization_members m on m.organization_id = o.id \
         where m.user_sub = $1 and m.status = 'active' \
         order by o.slug",
        user_sub,
    )
    .fetch_all(pool)
    .await?;
    Ok(orgs)
}
