use darkauth_types::auth::AuthorizationCode;

use crate::{db::DbPool, error::ApiResult};

pub async fn insert(pool: &DbPool, code: &AuthorizationCode) -> ApiResult<()> {
    sqlx::query!(
        r#"
        insert into authorization_codes
            (code, client_id, sub, redirect_uri, code_challenge, code_challenge_method,
             nonce, has_zk, zk_pub_kid, drk_hash, organization_id, otp_verified, consumed, expires_at)
        values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, false, $13)
        "#,
        code.code,
        code.client_id,
        code.sub,
        code.redirect_uri,
        code.code_challenge,
        code.code_challenge_method,
        code.nonce,
        code.has_zk,
        code.zk_pub_kid,
        code.drk_hash,
        code.organization_id,
        code.otp_verified,
        code.expires_at,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Read-only lookup used to validate a code's `redirect_uri`, `client_id`,
/// expiry, and PKCE challenge *before* anything is consumed. Must never be
/// treated as proof of single-use on its own -- only `consume`'s atomic
/// `RETURNING` gives that guarantee.
pub async fn lookup(pool: &DbPool, code: &str) -> ApiResult<Option<AuthorizationCode>> {
    let row = sqlx::query_as!(
        AuthorizationCode,
        r#"
        select code, client_id, sub, redirect_uri, code_challenge, code_challenge_method,
               nonce, has_zk, zk_pub_kid, drk_hash, organization_id, otp_verified, consumed,
               expires_at
        from authorization_codes
        where code = $1
        "#,
        code,
    )
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Atomically marks a code consumed and returns the row it consumed, or
/// `None` if the code didn't exist or was already used. This single
/// conditional `UPDATE ... RETURNING` is what makes code exchange exactly-once
/// under concurrent requests.
pub async fn consume(pool: &DbPool, code: &str) -> ApiResult<Option<AuthorizationCode>> {
    let row = sqlx::query_as!(
        AuthorizationCode,
        r#"
        update authorization_codes
        set consumed = true
        where code = $1 and consumed = false
        returning code, client_id, sub, redirect_uri, code_challenge, code_challenge_method,
                  nonce, has_zk, zk_pub_kid, drk_hash, organization_id, otp_verified, consumed,
                  expires_at
        "#,
        code,
    )
    .fetch_optional(pool)
    .await?;
    Ok(row)
}
