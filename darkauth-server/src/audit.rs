//! Thin wrapper around the audit log insert so call sites read as a single
//! statement of intent instead of a row-construction chore.

use darkauth_types::audit::NewAuditLogEntry;
use serde_json::json;

use crate::{db::DbPool, error::ApiResult, queries};

pub async fn record(
    pool: &DbPool,
    event: &str,
    actor_sub: Option<&str>,
    actor_cohort: Option<&str>,
    target: Option<&str>,
    ip: Option<&str>,
) -> ApiResult<()> {
    let entry = NewAuditLogEntry {
        event: event.to_string(),
        actor_sub: actor_sub.map(str::to_string),
        actor_cohort: actor_cohort.map(str::to_string),
        target: target.map(str::to_string),
        ip: ip.map(str::to_string),
        metadata: json!({}),
    };
    queries::audit::insert(pool, &entry).await?;
    Ok(())
}
