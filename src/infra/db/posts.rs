use async_trait::async_trait;
use sqlx::QueryBuilder;
use time::OffsetDateTime;

use crate::application::pagination::Slice;
use crate::application::repos::{
    NewPost, PostFilter, PostsRepo, PostsWriteRepo, RepoError, UpdatePostParams,
};
use crate::domain::entities::PostRecord;

use super::SqliteRepositories;
use super::map_sqlx_error;

const POST_COLUMNS: &str = "p.id, p.body, p.author_id, u.username AS author_username, \
     p.group_id, g.title AS group_title, g.slug AS group_slug, p.created_at";

const POST_JOINS: &str = "FROM posts p \
     INNER JOIN users u ON u.id = p.author_id \
     LEFT JOIN \"groups\" g ON g.id = p.group_id";

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    body: String,
    author_id: i64,
    author_username: String,
    group_id: Option<i64>,
    group_title: Option<String>,
    group_slug: Option<String>,
    created_at: OffsetDateTime,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            body: row.body,
            author_id: row.author_id,
            author_username: row.author_username,
            group_id: row.group_id,
            group_title: row.group_title,
            group_slug: row.group_slug,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl PostsRepo for SqliteRepositories {
    async fn list_posts(
        &self,
        filter: PostFilter,
        slice: Slice,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let offset = i64::try_from(slice.offset)
            .map_err(|_| RepoError::from_persistence("offset exceeds supported range"))?;

        let mut qb = QueryBuilder::new(format!("SELECT {POST_COLUMNS} {POST_JOINS} WHERE 1=1 "));
        Self::apply_post_filter(&mut qb, filter);

        qb.push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ");
        qb.push_bind(i64::from(slice.limit));
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows = qb
            .build_query_as::<PostRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<u64, RepoError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM posts p WHERE 1=1 ");
        Self::apply_post_filter(&mut qb, filter);

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Self::convert_count(count)
    }

    async fn find_post(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} {POST_JOINS} WHERE p.id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }
}

#[async_trait]
impl PostsWriteRepo for SqliteRepositories {
    async fn create_post(&self, params: NewPost) -> Result<PostRecord, RepoError> {
        let created_at = OffsetDateTime::now_utc();
        let result = sqlx::query(
            "INSERT INTO posts (body, author_id, group_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&params.body)
        .bind(params.author_id)
        .bind(params.group_id)
        .bind(created_at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let id = result.last_insert_rowid();
        self.find_post(id).await?.ok_or_else(|| {
            RepoError::integrity("inserted post row is not readable back")
        })
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        // Author and created_at are immutable by contract; the statement
        // deliberately omits them.
        let result = sqlx::query("UPDATE posts SET body = ?, group_id = ? WHERE id = ?")
            .bind(&params.body)
            .bind(params.group_id)
            .bind(params.id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        self.find_post(params.id).await?.ok_or(RepoError::NotFound)
    }
}
