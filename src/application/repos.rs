//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::application::pagination::Slice;
use crate::domain::entities::{GroupRecord, PostRecord, UserRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("integrity error: {message}")]
    Integrity { message: String },
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn duplicate(constraint: impl Into<String>) -> Self {
        Self::Duplicate {
            constraint: constraint.into(),
        }
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity {
            message: message.into(),
        }
    }
}

/// Narrows post listings to one group or one author. The default filter
/// selects every post.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostFilter {
    pub group_id: Option<i64>,
    pub author_id: Option<i64>,
}

impl PostFilter {
    pub fn by_group(group_id: i64) -> Self {
        Self {
            group_id: Some(group_id),
            author_id: None,
        }
    }

    pub fn by_author(author_id: i64) -> Self {
        Self {
            group_id: None,
            author_id: Some(author_id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub body: String,
    pub author_id: i64,
    pub group_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: i64,
    pub body: String,
    pub group_id: Option<i64>,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// List posts newest-first within the filter, bounded by the slice.
    async fn list_posts(&self, filter: PostFilter, slice: Slice)
    -> Result<Vec<PostRecord>, RepoError>;

    async fn count_posts(&self, filter: PostFilter) -> Result<u64, RepoError>;

    async fn find_post(&self, id: i64) -> Result<Option<PostRecord>, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, params: NewPost) -> Result<PostRecord, RepoError>;

    /// Update body and group in place. Author and creation timestamp are
    /// immutable; the statement never touches them.
    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError>;
}

#[derive(Debug, Clone)]
pub struct NewGroup {
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[async_trait]
pub trait GroupsRepo: Send + Sync {
    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError>;

    async fn find_group(&self, id: i64) -> Result<Option<GroupRecord>, RepoError>;

    /// All groups ordered by title, for the post form's select control.
    async fn list_groups(&self) -> Result<Vec<GroupRecord>, RepoError>;

    async fn create_group(&self, params: NewGroup) -> Result<GroupRecord, RepoError>;
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_digest: String,
    pub password_salt: String,
}

/// Credential columns for a stored user, fetched only during login.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: UserRecord,
    pub password_digest: String,
    pub password_salt: String,
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn find_user_by_username(&self, username: &str)
    -> Result<Option<UserRecord>, RepoError>;

    async fn find_user_credentials(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentials>, RepoError>;

    async fn create_user(&self, params: NewUser) -> Result<UserRecord, RepoError>;
}

#[async_trait]
pub trait SessionsRepo: Send + Sync {
    async fn insert_session(&self, token: Uuid, user_id: i64) -> Result<(), RepoError>;

    async fn find_session_user(&self, token: Uuid) -> Result<Option<UserRecord>, RepoError>;

    async fn delete_session(&self, token: Uuid) -> Result<(), RepoError>;
}
