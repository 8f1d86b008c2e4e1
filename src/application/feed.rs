//! Read-side services backing the public listing and detail pages.

use std::sync::Arc;

use crate::application::error::AppError;
use crate::application::pagination::{PAGE_SIZE, Page, Paginator};
use crate::application::repos::{GroupsRepo, PostFilter, PostsRepo, UsersRepo};
use crate::domain::entities::{GroupRecord, PostRecord, UserRecord};
use crate::domain::error::DomainError;

/// A group listing page together with the resolved group.
#[derive(Debug, Clone)]
pub struct GroupFeed {
    pub group: GroupRecord,
    pub page: Page<PostRecord>,
}

/// An author's profile page: their posts plus the total authored count.
#[derive(Debug, Clone)]
pub struct ProfileFeed {
    pub author: UserRecord,
    pub post_count: u64,
    pub page: Page<PostRecord>,
}

/// A single post with its author's total post count.
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: PostRecord,
    pub author_post_count: u64,
}

pub struct FeedService {
    posts: Arc<dyn PostsRepo>,
    groups: Arc<dyn GroupsRepo>,
    users: Arc<dyn UsersRepo>,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        groups: Arc<dyn GroupsRepo>,
        users: Arc<dyn UsersRepo>,
    ) -> Self {
        Self {
            posts,
            groups,
            users,
        }
    }

    /// Newest-first page over every post.
    pub async fn index_page(&self, requested: Option<&str>) -> Result<Page<PostRecord>, AppError> {
        self.filtered_page(PostFilter::default(), requested).await
    }

    /// Page over one group's posts; the slug must resolve.
    pub async fn group_page(
        &self,
        slug: &str,
        requested: Option<&str>,
    ) -> Result<GroupFeed, AppError> {
        let group = self
            .groups
            .find_group_by_slug(slug)
            .await?
            .ok_or(DomainError::not_found("group"))?;

        let page = self
            .filtered_page(PostFilter::by_group(group.id), requested)
            .await?;

        Ok(GroupFeed { group, page })
    }

    /// Page over one author's posts; the username must resolve.
    pub async fn profile_page(
        &self,
        username: &str,
        requested: Option<&str>,
    ) -> Result<ProfileFeed, AppError> {
        let author = self
            .users
            .find_user_by_username(username)
            .await?
            .ok_or(DomainError::not_found("user"))?;

        let filter = PostFilter::by_author(author.id);
        let post_count = self.posts.count_posts(filter).await?;
        let page = self.filtered_page(filter, requested).await?;

        Ok(ProfileFeed {
            author,
            post_count,
            page,
        })
    }

    pub async fn post_detail(&self, id: i64) -> Result<PostDetail, AppError> {
        let post = self
            .posts
            .find_post(id)
            .await?
            .ok_or(DomainError::not_found("post"))?;

        let author_post_count = self
            .posts
            .count_posts(PostFilter::by_author(post.author_id))
            .await?;

        Ok(PostDetail {
            post,
            author_post_count,
        })
    }

    async fn filtered_page(
        &self,
        filter: PostFilter,
        requested: Option<&str>,
    ) -> Result<Page<PostRecord>, AppError> {
        let total_items = self.posts.count_posts(filter).await?;
        let paginator = Paginator::new(total_items, PAGE_SIZE);
        let number = paginator.resolve(requested);
        let items = self.posts.list_posts(filter, paginator.slice(number)).await?;

        Ok(Page {
            items,
            number,
            total_pages: paginator.total_pages(),
            total_items,
        })
    }
}
