//! Storage for the four `/crypto/*` blobs. Two tables: `user_encryption_keys`
//! holds the (potentially public) encryption JWK, `wrapped_root_keys` holds
//! the two client-wrapped secrets side by side since they're always read
//! and written by the same owning user.

use crate::{db::DbPool, error::ApiResult};

pub async fn get_enc_pub(pool: &DbPool, user_sub: &str) -> ApiResult<Option<serde_json::Value>> {
    let row = sqlx::query!(
        "select public_jwk from user_encryption_keys where user_sub = $1",
        user_sub,
    )
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|r| r.public_jwk))
}

pub async fn put_enc_pub(
    pool: &DbPool,
    user_sub: &str,
    value: &serde_json::Value,
) -> ApiResult<()> {
    sqlx::query!(
        r#"
        insert into user_encryption_keys (user_sub, public_jwk, updated_at)
        values ($1, $2, now())
        on conflict (user_sub) do update set public_jwk = excluded.public_jwk, updated_at = now()
        "#,
        user_sub,
        value,
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_wrapped_drk(pool: &DbPool, user_sub: &str) -> ApiResult<Option<serde_json::Value>> {
    let row = sqlx::query!(
        "select wrapped_drk from wrapped_root_keys where user_sub = $1",
        user_sub,
    )
    .fetch_optional(pool)
    .await?;
    Ok(row.and_then(|r| r.wrapped_drk))
}

pub async fn put_wrapped_drk(
    pool: &DbPool,
    user_sub: &str,
    value: &serde_json::Value,
) -> ApiResult<()> {
    sqlx::query!(
        r#"
        insert into wrapped_root_keys (user_sub, wrapped_drk, updated_at)
        values ($1, $2, now())
        on conflict (user_sub) do update set wrapped_drk = excluded.wrapped_drk, updated_at = now()
        "#,
        user_sub,
        value,
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_wrapped_enc_priv(
    pool: &DbPool,
    user_sub: &str,
) -> ApiResult<Option<serde_json::Value>> {
    let row = sqlx::query!(
        "select wrapped_enc_priv from wrapped_root_keys where user_sub = $1",
        user_sub,
    )
    .fetch_optional(pool)
    .await?;
    Ok(row.and_then(|r| r.wrapped_enc_priv))
}

pub async fn put_wrapped_enc_priv(
    pool: &DbPool,
    user_sub: &str,
    value: &serde_json::Value,
) -> ApiResult<()> {
    sqlx::query!(
        r#"
        insert into wrapped_root_keys (user_sub, wrapped_enc_priv, updated_at)
        values ($1, $2, now())
        on conflict (user_sub) do update set wrapped_enc_priv = excluded.wrapped_enc_priv, updated_at = now()
        "#,
        user_sub,
        value,
    )
    .execute(pool)
    .await?;
    Ok(())
}
