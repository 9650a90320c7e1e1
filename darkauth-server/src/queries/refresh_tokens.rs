use darkauth_types::auth::RefreshTokenRecord;
use time::OffsetDateTime;

use crate::{db::DbPool, error::ApiResult};

pub async fn insert(pool: &DbPool, record: &RefreshTokenRecord) -> ApiResult<()> {
    sqlx::query!(
        r#"
        insert into refresh_tokens
            (refresh_token, client_id, sub, scope, organization_id, revoked, otp_verified,
             expires_at, created_at)
        values ($1, $2, $3, $4, $5, false, $6, $7, $8)
        "#,
        record.refresh_token,
        record.client_id,
        record.sub,
        record.scope,
        record.organization_id,
        record.otp_verified,
        record.expires_at,
        record.created_at,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Read-only lookup used to authenticate the calling client and check
/// `client_id` binding *before* rotating, so a request under the wrong
/// client never burns the legitimate refresh token.
pub async fn lookup(pool: &DbPool, token: &str) -> ApiResult<Option<RefreshTokenRecord>> {
    let row = sqlx::query_as!(
        RefreshTokenRecord,
        r#"
        select refresh_token, client_id, sub, scope, organization_id, revoked, otp_verified,
               expires_at, created_at
        from refresh_tokens
        where refresh_token = $1
        "#,
        token,
    )
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Atomically rotates a refresh token: the old row is revoked and a fresh
/// one inserted in the same transaction only if the old token was still
/// valid and unexpired, so two concurrent requests using the same refresh
/// token can never both succeed. Every field but the token string, expiry,
/// and creation time is carried forward from the old row -- `client_id`,
/// `sub`, `scope`, `organization_id`, and `otp_verified` are properties of
/// the original authorization grant, not something a bare token refresh can
/// change.
pub async fn rotate(
    pool: &DbPool,
    old_token: &str,
    new_token: &str,
    new_expires_at: OffsetDateTime,
) -> ApiResult<Option<RefreshTokenRecord>> {
    let mut tx = pool.begin().await?;

    let consumed = sqlx::query_as!(
        RefreshTokenRecord,
        r#"
        update refresh_tokens
        set revoked = true
        where refresh_token = $1 and revoked = false and expires_at > now()
        returning refresh_token, client_id, sub, scope, organization_id, revoked, otp_verified,
                  expires_at, created_at
        "#,
        old_token,
    )
    .fetch_optional(&mut *tx)
    .await?;

    let Some(old) = consumed else {
        tx.rollback().await?;
        return Ok(None);
    };

    let created_at = OffsetDateTime::now_utc();
    sqlx::query!(
        r#"
        insert into refresh_tokens
            (refresh_token, client_id, sub, scope, organization_id, revoked, otp_verified,
             expires_at, created_at)
        values ($1, $2, $3, $4, $5, false, $6, $7, $8)
        "#,
        new_token,
        old.client_id,
        old.sub,
        old.scope,
        old.organization_id,
        old.otp_verified,
        new_expires_at,
        created_at,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some(old))
}

pub async fn revoke_all_for_sub(pool: &DbPool, sub: &str) -> ApiResult<()> {
    sqlx::query!(
        "update refresh_tokens set revoked = true where sub = $1 and revoked = false",
        sub,
    )
    .execute(pool)
    .await?;
    Ok(())
}
