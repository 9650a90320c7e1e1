use darkauth_types::user::{Admin, AdminRole, NewAdmin};

use crate::{db::DbPool, error::ApiResult};

pub async fn insert(pool: &DbPool, sub: &str, new_admin: &NewAdmin) -> ApiResult<Admin> {
    let admin = sqlx::query_as!(
        Admin,
        r#"
        insert into admins (sub, email, name, admin_role)
        values ($1, $2, $3, $4)
        returning sub, email, name, admin_role as "admin_role: AdminRole", created_at
        "#,
        sub,
        new_admin.email,
        new_admin.name,
        new_admin.admin_role as AdminRole,
    )
    .fetch_one(pool)
    .await?;
    Ok(admin)
}

pub async fn get(pool: &DbPool, sub: &str) -> ApiResult<Admin> {
    let admin = sqlx::query_as!(
        Admin,
        r#"select sub, email, name, admin_role as "admin_role: AdminRole", created_at from admins where sub = $1"#,
        sub,
    )
    .fetch_one(pool)
    .await?;
    Ok(admin)
}

pub async fn get_by_email(pool: &DbPool, email: &str) -> ApiResult<Option<Admin>> {
    let admin = sqlx::query_as!(
        Admin,
        r#"select sub, email, name, admin_role as "admin_role: AdminRole", created_at from admins where email = $1"#,
        email,
    )
    .fetch_optional(pool)
    .await?;
    Ok(admin)
}

pub async fn list(pool: &DbPool) -> ApiResult<Vec<Admin>> {
    let admins = sqlx::query_as!(
        Admin,
        r#"select sub, email, name, admin_role as "admin_role: AdminRole", created_at from admins order by created_at desc"#,
    )
    .fetch_all(pool)
    .await?;
    Ok(admins)
}

pub async fn count(pool: &DbPool) -> ApiResult<i64> {
    let row = sqlx::query!("select count(*) as count from admins")
        .fetch_one(pool)
        .await?;
    Ok(row.count.unwrap_or(0))
}
