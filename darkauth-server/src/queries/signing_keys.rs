//! Persistence for EdDSA signing keys (C2). The private half is always
//! C1-wrapped before it reaches this module; `signing.rs` is the only
//! caller and the only place that ever sees it in the clear.

use time::OffsetDateTime;

use crate::{db::DbPool, error::ApiResult};

pub struct SigningKeyRow {
    pub kid: String,
    pub private_jwk_enc: Vec<u8>,
    pub public_jwk: serde_json::Value,
    pub is_primary: bool,
    pub created_at: OffsetDateTime,
}

pub async fn list(pool: &DbPool) -> ApiResult<Vec<SigningKeyRow>> {
    let rows = sqlx::query_as!(
        SigningKeyRow,
        r#"
        select kid, private_jwk_enc, public_jwk, is_primary, created_at
        from signing_keys order by created_at asc
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn insert(
    pool: &DbPool,
    kid: &str,
    private_jwk_enc: &[u8],
    public_jwk: &serde_json::Value,
    is_primary: bool,
) -> ApiResult<()> {
    sqlx::query!(
        r#"
        insert into signing_keys (kid, private_jwk_enc, public_jwk, is_primary, created_at)
        values ($1, $2, $3, $4, now())
        "#,
        kid,
        private_jwk_enc,
        public_jwk,
        is_primary,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Demotes every row to verify-only. Called immediately before inserting a
/// fresh primary so rotation never leaves two rows marked primary at once.
pub async fn demote_all(pool: &DbPool) -> ApiResult<()> {
    sqlx::query!("update signing_keys set is_primary = false")
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete(pool: &DbPool, kid: &str) -> ApiResult<()> {
    sqlx::query!("delete from signing_keys where kid = $1", kid)
        .execute(pool)
        .await?;
    Ok(())
}
