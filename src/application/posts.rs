//! Write-side service for creating and editing posts.

use std::sync::Arc;

use tracing::info;

use crate::application::error::AppError;
use crate::application::repos::{
    GroupsRepo, NewPost, PostsRepo, PostsWriteRepo, UpdatePostParams,
};
use crate::domain::entities::PostRecord;
use crate::domain::error::DomainError;
use crate::domain::posts::{PostDraft, PostFormErrors, PostInput};

/// Result of a create submission.
#[derive(Debug)]
pub enum SubmitOutcome {
    Saved(PostRecord),
    Rejected(PostFormErrors),
}

/// Result of an edit submission.
///
/// `NotAuthor` carries no message: the caller redirects to the detail view
/// without applying any change.
#[derive(Debug)]
pub enum EditOutcome {
    Updated(PostRecord),
    Rejected(PostFormErrors),
    NotAuthor,
}

pub struct PostService {
    posts: Arc<dyn PostsRepo>,
    posts_write: Arc<dyn PostsWriteRepo>,
    groups: Arc<dyn GroupsRepo>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        posts_write: Arc<dyn PostsWriteRepo>,
        groups: Arc<dyn GroupsRepo>,
    ) -> Self {
        Self {
            posts,
            posts_write,
            groups,
        }
    }

    pub async fn find_post(&self, id: i64) -> Result<PostRecord, AppError> {
        self.posts
            .find_post(id)
            .await?
            .ok_or_else(|| DomainError::not_found("post").into())
    }

    /// Validate and persist a new post authored by `author_id`.
    pub async fn create(
        &self,
        author_id: i64,
        input: &PostInput,
    ) -> Result<SubmitOutcome, AppError> {
        let draft = match self.bind(input).await? {
            Ok(draft) => draft,
            Err(errors) => return Ok(SubmitOutcome::Rejected(errors)),
        };

        let record = self
            .posts_write
            .create_post(NewPost {
                body: draft.body,
                author_id,
                group_id: draft.group_id,
            })
            .await?;

        info!(
            target = "brezza::posts",
            post_id = record.id,
            author = %record.author_username,
            "post created"
        );
        Ok(SubmitOutcome::Saved(record))
    }

    /// Validate and apply an edit to `post_id` on behalf of `editor_id`.
    ///
    /// Only the original author may edit; anyone else gets `NotAuthor` and
    /// the stored post is left untouched. Body and group are the only
    /// mutable fields.
    pub async fn edit(
        &self,
        post_id: i64,
        editor_id: i64,
        input: &PostInput,
    ) -> Result<EditOutcome, AppError> {
        let post = self.find_post(post_id).await?;
        if post.author_id != editor_id {
            return Ok(EditOutcome::NotAuthor);
        }

        let draft = match self.bind(input).await? {
            Ok(draft) => draft,
            Err(errors) => return Ok(EditOutcome::Rejected(errors)),
        };

        let record = self
            .posts_write
            .update_post(UpdatePostParams {
                id: post.id,
                body: draft.body,
                group_id: draft.group_id,
            })
            .await?;

        info!(
            target = "brezza::posts",
            post_id = record.id,
            "post updated"
        );
        Ok(EditOutcome::Updated(record))
    }

    /// Syntactic validation plus the group-existence check.
    async fn bind(&self, input: &PostInput) -> Result<Result<PostDraft, PostFormErrors>, AppError> {
        let draft = match PostDraft::parse(input) {
            Ok(draft) => draft,
            Err(errors) => return Ok(Err(errors)),
        };

        if let Some(group_id) = draft.group_id {
            if self.groups.find_group(group_id).await?.is_none() {
                return Ok(Err(PostFormErrors::unknown_group()));
            }
        }

        Ok(Ok(draft))
    }
}
