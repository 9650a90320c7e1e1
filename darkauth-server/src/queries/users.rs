use darkauth_types::user::{NewUser, User};

use crate::{db::DbPool, error::ApiResult};

pub async fn insert(pool: &DbPool, sub: &str, new_user: &NewUser) -> ApiResult<User> {
    let user = sqlx::query_as!(
        User,
        r#"
        insert into users (sub, email, name, password_reset_required)
        values ($1, $2, $3, false)
        returning sub, email, name, password_reset_required, created_at
        "#,
        sub,
        new_user.email,
        new_user.name,
    )
    .fetch_one(pool)
    .await?;
    Ok(user)
}

pub async fn get(pool: &DbPool, sub: &str) -> ApiResult<User> {
    let user = sqlx::query_as!(
        User,
        r#"select sub, email, name, password_reset_required, created_at from users where sub = $1"#,
        sub,
    )
    .fetch_one(pool)
    .await?;
    Ok(user)
}

pub async fn get_by_email(pool: &DbPool, email: &str) -> ApiResult<Option<User>> {
    let user = sqlx::query_as!(
        User,
        r#"select sub, email, name, password_reset_required, created_at from users where email = $1"#,
        email,
    )
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn list(pool: &DbPool) -> ApiResult<Vec<User>> {
    let users = sqlx::query_as!(
        User,
        r#"select sub, email, name, password_reset_required, created_at from users order by created_at desc"#,
    )
    .fetch_all(pool)
    .await?;
    Ok(users)
}

pub async fn delete(pool: &DbPool, sub: &str) -> ApiResult<()> {
    sqlx::query!("delete from users where sub = $1", sub)
        .execute(pool)
        .await?;
    Ok(())
}
