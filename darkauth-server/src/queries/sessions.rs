use darkauth_types::auth::Session;

use crate::{db::DbPool, error::ApiResult};

pub async fn insert(pool: &DbPool, session: &Session) -> ApiResult<()> {
    sqlx::query!(
        r#"
        insert into sessions
            (id, cohort, sub, email, name, organization_id, organization_slug,
             client_id, otp_verified, data, refresh_token, expires_at)
        values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
        session.id,
        session.cohort,
        session.sub,
        session.email,
        session.name,
        session.organization_id,
        session.organization_slug,
        session.client_id,
        session.otp_verified,
        session.data,
        session.refresh_token,
        session.expires_at,
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get(pool: &DbPool, id: &str) -> ApiResult<Session> {
    let session = sqlx::query_as!(
        Session,
        r#"
        select id, cohort, sub, email, name, organization_id, organization_slug,
               client_id, otp_verified, data, refresh_token, expires_at
        from sessions where id = $1
        "#,
        id,
    )
    .fetch_one(pool)
    .await?;
    Ok(session)
}

pub async fn set_organization_context(
    pool: &DbPool,
    id: &str,
    organization_id: uuid::Uuid,
    organization_slug: &str,
) -> ApiResult<()> {
    sqlx::query!(
        "update sessions set organization_id = $2, organization_slug = $3 where id = $1",
        id,
        organization_id,
        organization_slug,
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn mark_otp_verified(pool: &DbPool, id: &str) -> ApiResult<()> {
    sqlx::query!("update sessions set otp_verified = true where id = $1", id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete(pool: &DbPool, id: &str) -> ApiResult<()> {
    sqlx::query!("delete from sessions where id = $1", id)
        .execute(pool)
        .await?;
    Ok(())
}
