use darkauth_types::settings::Setting;

use crate::{db::DbPool, error::ApiResult};

pub async fn get(pool: &DbPool, key: &str) -> ApiResult<Option<serde_json::Value>> {
    let row = sqlx::query!("select value from settings where key = $1", key)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| r.value))
}

pub async fn get_row(pool: &DbPool, key: &str) -> ApiResult<Option<Setting>> {
    let row = sqlx::query_as!(
        Setting,
        "select key, value, updated_at from settings where key = $1",
        key,
    )
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn put(pool: &DbPool, key: &str, value: &serde_json::Value) -> ApiResult<()> {
    sqlx::query!(
        r#"
        insert into settings (key, value, updated_at)
        values ($1, $2, now())
        on conflict (key) do update set value = excluded.value, updated_at = now()
        "#,
        key,
        value,
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list(pool: &DbPool) -> ApiResult<Vec<Setting>> {
    let rows = sqlx::query_as!(Setting, "select key, value, updated_at from settings order by key")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}
