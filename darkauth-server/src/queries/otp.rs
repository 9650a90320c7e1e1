use darkauth_types::otp::OtpCredential;

use crate::{db::DbPool, error::ApiResult};

pub async fn upsert(pool: &DbPool, sub: &str, secret_enc: &[u8]) -> ApiResult<()> {
    sqlx::query!(
        r#"
        insert into otp_credentials (sub, secret_enc, verified)
        values ($1, $2, false)
        on conflict (sub) do update set secret_enc = excluded.secret_enc, verified = false
        "#,
        sub,
        secret_enc,
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get(pool: &DbPool, sub: &str) -> ApiResult<Option<OtpCredential>> {
    let row = sqlx::query_as!(
        OtpCredential,
        "select sub, secret_enc, verified, created_at from otp_credentials where sub = $1",
        sub,
    )
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn mark_verified(pool: &DbPool, sub: &str) -> ApiResult<()> {
    sqlx::query!("update otp_credentials set verified = true where sub = $1", sub)
        .execute(pool)
        .await?;
    Ok(())
}

/// Discards any previously issued recovery codes for `sub` and stores the
/// fresh batch's hashes, atomically, so re-enrolling invalidates every
/// recovery code printed for an earlier enrollment.
pub async fn replace_recovery_codes(pool: &DbPool, sub: &str, hashes: &[String]) -> ApiResult<()> {
    let mut tx = pool.begin().await?;
    sqlx::query!("delete from otp_recovery_codes where sub = $1", sub)
        .execute(&mut *tx)
        .await?;
    for hash in hashes {
        sqlx::query!(
            "insert into otp_recovery_codes (sub, code_hash) values ($1, $2)",
            sub,
            hash,
        )
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(())
}

/// Atomically marks one recovery code consumed; `true` only if an unused
/// matching hash existed for `sub`, enforcing single-use the same way
/// authorization-code consumption does.
pub async fn consume_recovery_code(pool: &DbPool, sub: &str, code_hash: &str) -> ApiResult<bool> {
    let row = sqlx::query!(
        r#"
        update otp_recovery_codes
        set used = true
        where sub = $1 and code_hash = $2 and used = false
        returning id
        "#,
        sub,
        code_hash,
    )
    .fetch_optional(pool)
    .await?;
    Ok(row.is_some())
}
