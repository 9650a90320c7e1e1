use darkauth_types::audit::{AuditLogEntry, NewAuditLogEntry};
use uuid::Uuid;

use crate::{db::DbPool, error::ApiResult};

pub async fn insert(pool: &DbPool, entry: &NewAuditLogEntry) -> ApiResult<()> {
    sqlx::query!(
        r#"
        insert into audit_log (id, event, actor_sub, actor_cohort, target, ip, metadata, created_at)
        values ($1, $2, $3, $4, $5, $6, $7, now())
        "#,
        Uuid::new_v4(),
        entry.event,
        entry.actor_sub,
        entry.actor_cohort,
        entry.target,
        entry.ip,
        entry.metadata,
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list_recent(pool: &DbPool, limit: i64) -> ApiResult<Vec<AuditLogEntry>> {
    let rows = sqlx::query_as!(
        AuditLogEntry,
        r#"
        select id, event, actor_sub, actor_cohort, target, ip, metadata, created_at
        from audit_log order by created_at desc limit $1
        "#,
        limit,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
