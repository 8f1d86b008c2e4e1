use async_trait::async_trait;
use sqlx::query_as;
use time::OffsetDateTime;

use crate::application::repos::{NewUser, RepoError, UserCredentials, UsersRepo};
use crate::domain::entities::UserRecord;

use super::SqliteRepositories;
use super::map_sqlx_error;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    created_at: OffsetDateTime,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    id: i64,
    username: String,
    created_at: OffsetDateTime,
    password_digest: String,
    password_salt: String,
}

#[async_trait]
impl UsersRepo for SqliteRepositories {
    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, RepoError> {
        let row = query_as::<_, UserRow>(
            "SELECT id, username, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(UserRecord::from))
    }

    async fn find_user_credentials(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentials>, RepoError> {
        let row = query_as::<_, CredentialsRow>(
            "SELECT id, username, created_at, password_digest, password_salt \
             FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|row| UserCredentials {
            user: UserRecord {
                id: row.id,
                username: row.username,
                created_at: row.created_at,
            },
            password_digest: row.password_digest,
            password_salt: row.password_salt,
        }))
    }

    async fn create_user(&self, params: NewUser) -> Result<UserRecord, RepoError> {
        let created_at = OffsetDateTime::now_utc();
        let result = sqlx::query(
            "INSERT INTO users (username, password_digest, password_salt, created_at) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(&params.username)
        .bind(&params.password_digest)
        .bind(&params.password_salt)
        .bind(created_at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let id = result.last_insert_rowid();
        let row = query_as::<_, UserRow>("SELECT id, username, created_at FROM users WHERE id = ?")
            .bind(id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(UserRecord::from(row))
    }
}
