use async_trait::async_trait;
use sqlx::query_as;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{RepoError, SessionsRepo};
use crate::domain::entities::UserRecord;

use super::SqliteRepositories;
use super::map_sqlx_error;

#[derive(sqlx::FromRow)]
struct SessionUserRow {
    id: i64,
    username: String,
    created_at: OffsetDateTime,
}

#[async_trait]
impl SessionsRepo for SqliteRepositories {
    async fn insert_session(&self, token: Uuid, user_id: i64) -> Result<(), RepoError> {
        sqlx::query("INSERT INTO sessions (token, user_id, created_at) VALUES (?, ?, ?)")
            .bind(token.to_string())
            .bind(user_id)
            .bind(OffsetDateTime::now_utc())
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn find_session_user(&self, token: Uuid) -> Result<Option<UserRecord>, RepoError> {
        let row = query_as::<_, SessionUserRow>(
            "SELECT u.id, u.username, u.created_at \
             FROM sessions s INNER JOIN users u ON u.id = s.user_id \
             WHERE s.token = ?",
        )
        .bind(token.to_string())
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|row| UserRecord {
            id: row.id,
            username: row.username,
            created_at: row.created_at,
        }))
    }

    async fn delete_session(&self, token: Uuid) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token.to_string())
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }
}
