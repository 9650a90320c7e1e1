use darkauth_types::auth::OpaqueLoginSession;

use crate::{db::DbPool, error::ApiResult};

/// Writes a fresh envelope for `sub`, archiving whatever envelope it
/// replaces into `opaque_record_history` first, in the same transaction,
/// so a prior record is always retained for password-change recovery
/// (spec.md §3) rather than overwritten and lost.
pub async fn put_record(pool: &DbPool, sub: &str, envelope: &[u8]) -> ApiResult<()> {
    let mut tx = pool.begin().await?;

    let previous = sqlx::query!("select envelope from opaque_records where sub = $1", sub)
        .fetch_optional(&mut *tx)
        .await?;
    if let Some(previous) = previous {
        sqlx::query!(
            "insert into opaque_record_history (sub, envelope) values ($1, $2)",
            sub,
            previous.envelope,
        )
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query!(
        r#"
        insert into opaque_records (sub, envelope)
        values ($1, $2)
        on conflict (sub) do update set envelope = excluded.envelope, created_at = now()
        "#,
        sub,
        envelope,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

pub async fn get_envelope(pool: &DbPool, sub: &str) -> ApiResult<Option<Vec<u8>>> {
    let row = sqlx::query!("select envelope from opaque_records where sub = $1", sub)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| r.envelope))
}

/// All archived prior envelopes for `sub`, newest first, so a recovery flow
/// can try proving knowledge of a previously set password against each in
/// turn. Read-only: nothing ever mutates or deletes a history row.
pub async fn get_history_envelopes(pool: &DbPool, sub: &str) -> ApiResult<Vec<Vec<u8>>> {
    let rows = sqlx::query!(
        "select envelope from opaque_record_history where sub = $1 order by replaced_at desc",
        sub,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|r| r.envelope).collect())
}

pub async fn insert_login_session(
    pool: &DbPool,
    session: &OpaqueLoginSession,
) -> ApiResult<()> {
    sqlx::query!(
        r#"
        insert into opaque_login_sessions (id, server_state, identity_u_enc, identity_s_enc, cohort, expires_at)
        values ($1, $2, $3, $4, $5, $6)
        "#,
        session.id,
        session.server_state,
        session.identity_u_enc,
        session.identity_s_enc,
        session.cohort,
        session.expires_at,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Consumes the login session atomically so the same `CredentialFinalization`
/// can never be replayed against a still-pending state row.
pub async fn take_login_session(
    pool: &DbPool,
    id: &str,
) -> ApiResult<Option<OpaqueLoginSession>> {
    let row = sqlx::query_as!(
        OpaqueLoginSession,
        r#"delete from opaque_login_sessions where id = $1 returning id, server_state, identity_u_enc, identity_s_enc, cohort, expires_at"#,
        id,
    )
    .fetch_optional(pool)
    .await?;
    Ok(row)
}
