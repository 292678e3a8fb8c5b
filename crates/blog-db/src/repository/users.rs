//! User operations

use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{NewUser, User, UserRole};
use crate::repository::Database;
use crate::store::UserStore;

const USER_COLUMNS: &str =
    "id, email, username, password_hash, role, avatar_url, is_active, created_at, updated_at";

impl Database {
    /// Check if any users exist
    pub async fn has_users(&self) -> Result<bool, DbError> {
        let result = sqlx::query("SELECT COUNT(*) as count FROM users")
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = result.get("count");
        Ok(count > 0)
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<User>, DbError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?");
        let result = sqlx::query(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        result
            .map(|row| User::try_from(&row).map_err(|e| DbError::Corrupt(e.to_string())))
            .transpose()
    }

    async fn exists(&self, column: &str, value: &str) -> Result<bool, DbError> {
        let query = format!("SELECT COUNT(*) as count FROM users WHERE {column} = ?");
        let result = sqlx::query(&query)
            .bind(value)
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = result.get("count");
        Ok(count > 0)
    }
}

/// Map a unique-constraint violation onto the column that caused it
fn duplicate_from(err: sqlx::Error, user: &NewUser) -> DbError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            if db_err.message().contains("users.email") {
                DbError::Duplicate { field: "email", value: user.email.clone() }
            } else {
                DbError::Duplicate { field: "username", value: user.username.clone() }
            }
        }
        _ => DbError::Connection(err),
    }
}

#[async_trait]
impl UserStore for Database {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DbError> {
        self.find_one("id", &id.to_string()).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        self.find_one("email", email).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
        self.find_one("username", username).await
    }

    async fn create(&self, user: NewUser) -> Result<User, DbError> {
        if self.exists("email", &user.email).await? {
            return Err(DbError::Duplicate { field: "email", value: user.email });
        }
        if self.exists("username", &user.username).await? {
            return Err(DbError::Duplicate { field: "username", value: user.username });
        }

        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO users (
                id, email, username, password_hash, role, avatar_url,
                is_active, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, NULL, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_from(e, &user))?;

        Ok(User {
            id,
            email: user.email,
            username: user.username,
            password_hash: user.password_hash,
            role: user.role,
            avatar_url: None,
            is_active: user.is_active,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update_role(&self, id: Uuid, role: UserRole) -> Result<Option<User>, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE users
            SET role = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(role.as_str())
        .bind(now.to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    async fn set_active(&self, id: Uuid, is_active: bool) -> Result<Option<User>, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE users
            SET is_active = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(is_active)
        .bind(now.to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    async fn update_avatar_url(
        &self,
        id: Uuid,
        avatar_url: Option<&str>,
    ) -> Result<Option<User>, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE users
            SET avatar_url = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(avatar_url)
        .bind(now.to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }
}
