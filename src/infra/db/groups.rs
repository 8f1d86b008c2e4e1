use async_trait::async_trait;
use sqlx::query_as;
use time::OffsetDateTime;

use crate::application::repos::{GroupsRepo, NewGroup, RepoError};
use crate::domain::entities::GroupRecord;

use super::SqliteRepositories;
use super::map_sqlx_error;

#[derive(sqlx::FromRow)]
struct GroupRow {
    id: i64,
    title: String,
    slug: String,
    description: String,
    created_at: OffsetDateTime,
}

impl From<GroupRow> for GroupRecord {
    fn from(row: GroupRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            slug: row.slug,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

const GROUP_SELECT: &str = r#"SELECT id, title, slug, description, created_at FROM "groups""#;

#[async_trait]
impl GroupsRepo for SqliteRepositories {
    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError> {
        let row = query_as::<_, GroupRow>(&format!("{GROUP_SELECT} WHERE slug = ?"))
            .bind(slug)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(GroupRecord::from))
    }

    async fn find_group(&self, id: i64) -> Result<Option<GroupRecord>, RepoError> {
        let row = query_as::<_, GroupRow>(&format!("{GROUP_SELECT} WHERE id = ?"))
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(GroupRecord::from))
    }

    async fn list_groups(&self) -> Result<Vec<GroupRecord>, RepoError> {
        let rows = query_as::<_, GroupRow>(&format!("{GROUP_SELECT} ORDER BY title, id"))
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(GroupRecord::from).collect())
    }

    async fn create_group(&self, params: NewGroup) -> Result<GroupRecord, RepoError> {
        let created_at = OffsetDateTime::now_utc();
        let result = sqlx::query(
            r#"INSERT INTO "groups" (title, slug, description, created_at) VALUES (?, ?, ?, ?)"#,
        )
        .bind(&params.title)
        .bind(&params.slug)
        .bind(&params.description)
        .bind(created_at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        self.find_group(result.last_insert_rowid())
            .await?
            .ok_or_else(|| RepoError::integrity("inserted group row is not readable back"))
    }
}
