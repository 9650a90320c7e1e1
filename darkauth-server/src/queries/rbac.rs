use uuid::Uuid;

use crate::{db::DbPool, error::ApiResult};

pub async fn direct_permissions_for_user(pool: &DbPool, user_sub: &str) -> ApiResult<Vec<String>> {
    let rows = sqlx::query!(
        "select permission_key from user_permissions where user_sub = $1",
        user_sub,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|r| r.permission_key).collect())
}

pub async fn group_permissions_for_user(pool: &DbPool, user_sub: &str) -> ApiResult<Vec<String>> {
    let rows = sqlx::query!(
        r#"
        select distinct gp.permission_key
        from group_members gm
        join group_permissions gp on gp.group_id = gm.group_id
        where gm.user_sub = $1
        "#,
        user_sub,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|r| r.permission_key).collect())
}

pub async fn organization_role_names(
    pool: &DbPool,
    user_sub: &str,
    organization_id: Uuid,
) -> ApiResult<Vec<String>> {
    let rows = sqlx::query!(
        r#"
        select r.name
        from organization_member_roles omr
        join roles r on r.id = omr.role_id
        where omr.user_sub = $1 and omr.organization_id = $2
        "#,
        user_sub,
        organization_id,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|r| r.name).collect())
}

pub async fn organization_role_permissions(
    pool: &DbPool,
    user_sub: &str,
    organization_id: Uuid,
) -> ApiResult<Vec<String>> {
    let rows = sqlx::query!(
        r#"
        select distinct rp.permission_key
        from organization_member_roles omr
        join role_permissions rp on rp.role_id = omr.role_id
        where omr.user_sub = $1 and omr.organization_id = $2
        "#,
        user_sub,
        organization_id,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|r| r.permission_key).collect())
}
