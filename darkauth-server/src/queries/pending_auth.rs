use darkauth_types::auth::PendingAuthorization;

use crate::{db::DbPool, error::ApiResult};

pub async fn insert(pool: &DbPool, pending: &PendingAuthorization) -> ApiResult<()> {
    sqlx::query!(
        r#"
        insert into pending_authorizations
            (request_id, client_id, redirect_uri, state, code_challenge,
             code_challenge_method, nonce, zk_pub_kid, zk_pub_raw, user_sub,
             origin, expires_at)
        values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
        pending.request_id,
        pending.client_id,
        pending.redirect_uri,
        pending.state,
        pending.code_challenge,
        pending.code_challenge_method,
        pending.nonce,
        pending.zk_pub_kid,
        pending.zk_pub_raw,
        pending.user_sub,
        pending.origin,
        pending.expires_at,
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get(pool: &DbPool, request_id: &str) -> ApiResult<PendingAuthorization> {
    let row = sqlx::query_as!(
        PendingAuthorization,
        r#"
        select request_id, client_id, redirect_uri, state, code_challenge,
               code_challenge_method, nonce, zk_pub_kid, zk_pub_raw, user_sub,
               origin, expires_at
        from pending_authorizations where request_id = $1
        "#,
        request_id,
    )
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn set_user(pool: &DbPool, request_id: &str, user_sub: &str) -> ApiResult<()> {
    sqlx::query!(
        "update pending_authorizations set user_sub = $2 where request_id = $1",
        request_id,
        user_sub,
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete(pool: &DbPool, request_id: &str) -> ApiResult<()> {
    sqlx::query!(
        "delete from pending_authorizations where request_id = $1",
        request_id,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Atomically removes and returns a pending authorization so `/authorize`
/// finalization can never be replayed against the same `request_id`.
pub async fn consume(
    pool: &DbPool,
    request_id: &str,
) -> ApiResult<Option<PendingAuthorization>> {
    let row = sqlx::query_as!(
        PendingAuthorization,
        r#"
        delete from pending_authorizations where request_id = $1
        returning request_id, client_id, redirect_uri, state, code_challenge,
                  code_challenge_method, nonce, zk_pub_kid, zk_pub_raw, user_sub,
                  origin, expires_at
        "#,
        request_id,
    )
    .fetch_optional(pool)
    .await?;
    Ok(row)
}
