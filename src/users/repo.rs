use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{User, USER_COLUMNS};
use crate::{db::like_pattern, lifecycle::Role};

/// Insert the user unless the email is taken. Returns the stored user and
/// whether this call created it. Existing users get `last_login_at` bumped.
pub async fn upsert_login(
    db: &PgPool,
    email: &str,
    name: Option<&str>,
) -> anyhow::Result<(User, bool)> {
    let sql = format!(
        r#"
        INSERT INTO users (email, name, last_login_at)
        VALUES ($1, $2, now())
        ON CONFLICT (email) DO NOTHING
        RETURNING {USER_COLUMNS}
        "#
    );
    let inserted = sqlx::query_as::<_, User>(&sql)
        .bind(email)
        .bind(name)
        .fetch_optional(db)
        .await
        .context("insert user")?;
    if let Some(user) = inserted {
        return Ok((user, true));
    }

    let sql = format!(
        "UPDATE users SET last_login_at = now() WHERE email = $1 RETURNING {USER_COLUMNS}"
    );
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(email)
        .fetch_one(db)
        .await
        .context("touch user login")?;
    Ok((user, false))
}

pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(email)
        .fetch_optional(db)
        .await
        .context("find user by email")?;
    Ok(user)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find user by id")?;
    Ok(user)
}

pub async fn role_of(db: &PgPool, email: &str) -> anyhow::Result<Option<Role>> {
    let role = sqlx::query_scalar::<_, Role>("SELECT role FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(db)
        .await
        .context("load user role")?;
    Ok(role)
}

/// Case-insensitive partial email match.
pub async fn search(db: &PgPool, term: &str, limit: i64) -> anyhow::Result<Vec<User>> {
    let sql = format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email ILIKE $1 ORDER BY created_at DESC LIMIT $2"
    );
    let rows = sqlx::query_as::<_, User>(&sql)
        .bind(like_pattern(term))
        .bind(limit)
        .fetch_all(db)
        .await
        .context("search users")?;
    Ok(rows)
}

pub async fn set_role(db: &PgPool, id: Uuid, role: Role) -> anyhow::Result<Option<User>> {
    let sql = format!("UPDATE users SET role = $1 WHERE id = $2 RETURNING {USER_COLUMNS}");
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(role)
        .bind(id)
        .fetch_optional(db)
        .await
        .context("update user role")?;
    Ok(user)
}

pub async fn set_role_by_email(db: &PgPool, email: &str, role: Role) -> anyhow::Result<u64> {
    let result = sqlx::query("UPDATE users SET role = $1 WHERE email = $2")
        .bind(role)
        .bind(email)
        .execute(db)
        .await
        .context("update user role by email")?;
    Ok(result.rows_affected())
}
