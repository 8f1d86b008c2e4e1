//! View structs and template plumbing.
//!
//! Handlers assemble these from domain records; templates never touch
//! records directly. Optional values are flattened to plain strings and
//! booleans before they reach a template.

use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use time::{format_description::FormatItem, format_description::well_known::Rfc3339, macros::format_description};

use crate::application::error::ErrorReport;
use crate::application::pagination::Page;
use crate::domain::entities::{GroupRecord, PostRecord, UserRecord};

const PUBLISHED_FORMAT: &[FormatItem<'static>] =
    format_description!("[day padding:none] [month repr:short] [year], [hour]:[minute]");

#[derive(Debug, Error)]
#[error("template rendering failed")]
pub struct TemplateRenderError {
    #[source]
    pub(crate) error: AskamaError,
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, TemplateRenderError> {
    template
        .render()
        .map(Html)
        .map_err(|error| TemplateRenderError { error })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => {
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            let report = ErrorReport::from_error("presentation::views::render_template", status, &err);
            let mut response = (status, "Template rendering failed").into_response();
            report.attach(&mut response);
            response
        }
    }
}

pub fn render_not_found_response(chrome: LayoutChrome) -> Response {
    let view = LayoutContext::new(chrome, ErrorPageView::not_found());
    let mut response = render_template_response(ErrorTemplate { view }, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

/// Shared page chrome: who is signed in, if anyone.
#[derive(Clone)]
pub struct LayoutChrome {
    pub signed_in: bool,
    pub current_username: String,
    pub profile_href: String,
}

impl LayoutChrome {
    pub fn for_visitor(user: Option<&UserRecord>) -> Self {
        match user {
            Some(user) => Self {
                signed_in: true,
                current_username: user.username.clone(),
                profile_href: profile_href(&user.username),
            },
            None => Self {
                signed_in: false,
                current_username: String::new(),
                profile_href: String::new(),
            },
        }
    }
}

#[derive(Clone)]
pub struct LayoutContext<T> {
    pub chrome: LayoutChrome,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(chrome: LayoutChrome, content: T) -> Self {
        Self { chrome, content }
    }
}

#[derive(Clone)]
pub struct PostCard {
    pub id: i64,
    pub body: String,
    pub author_username: String,
    pub author_href: String,
    pub detail_href: String,
    pub published: String,
    pub iso_date: String,
    pub has_group: bool,
    pub group_title: String,
    pub group_href: String,
}

pub fn post_card(record: &PostRecord) -> PostCard {
    PostCard {
        id: record.id,
        body: record.body.clone(),
        author_username: record.author_username.clone(),
        author_href: profile_href(&record.author_username),
        detail_href: detail_href(record.id),
        published: record
            .created_at
            .format(&PUBLISHED_FORMAT)
            .unwrap_or_default(),
        iso_date: record.created_at.format(&Rfc3339).unwrap_or_default(),
        has_group: record.group_slug.is_some(),
        group_title: record.group_title.clone().unwrap_or_default(),
        group_href: record
            .group_slug
            .as_deref()
            .map(group_href)
            .unwrap_or_default(),
    }
}

#[derive(Clone)]
pub struct PaginationView {
    pub number: u32,
    pub total_pages: u32,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_href: String,
    pub next_href: String,
}

pub fn pagination_view<T>(base_path: &str, page: &Page<T>) -> PaginationView {
    PaginationView {
        number: page.number,
        total_pages: page.total_pages,
        has_previous: page.has_previous(),
        has_next: page.has_next(),
        previous_href: page_href(base_path, page.number.saturating_sub(1)),
        next_href: page_href(base_path, page.number + 1),
    }
}

fn page_href(base_path: &str, number: u32) -> String {
    format!("{base_path}?page={number}")
}

pub fn profile_href(username: &str) -> String {
    format!("/profile/{username}")
}

pub fn group_href(slug: &str) -> String {
    format!("/group/{slug}")
}

pub fn detail_href(post_id: i64) -> String {
    format!("/posts/{post_id}")
}

pub fn edit_href(post_id: i64) -> String {
    format!("/posts/{post_id}/edit")
}

/// The index, group and profile listings share this shape.
pub struct FeedView {
    pub heading: String,
    pub subheading: String,
    pub posts: Vec<PostCard>,
    pub pagination: PaginationView,
}

pub fn feed_view(
    heading: impl Into<String>,
    subheading: impl Into<String>,
    base_path: &str,
    page: &Page<PostRecord>,
) -> FeedView {
    FeedView {
        heading: heading.into(),
        subheading: subheading.into(),
        posts: page.items.iter().map(post_card).collect(),
        pagination: pagination_view(base_path, page),
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub view: LayoutContext<FeedView>,
}

pub struct GroupView {
    pub title: String,
    pub feed: FeedView,
}

pub fn group_view(group: &GroupRecord, page: &Page<PostRecord>) -> GroupView {
    GroupView {
        title: group.title.clone(),
        feed: feed_view(
            group.title.clone(),
            group.description.clone(),
            &group_href(&group.slug),
            page,
        ),
    }
}

#[derive(Template)]
#[template(path = "group.html")]
pub struct GroupTemplate {
    pub view: LayoutContext<GroupView>,
}

pub struct ProfileView {
    pub username: String,
    pub post_count: u64,
    pub feed: FeedView,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub view: LayoutContext<ProfileView>,
}

pub struct PostDetailView {
    pub post: PostCard,
    pub author_post_count: u64,
    pub can_edit: bool,
    pub edit_href: String,
}

#[derive(Template)]
#[template(path = "post_detail.html")]
pub struct PostDetailTemplate {
    pub view: LayoutContext<PostDetailView>,
}

#[derive(Clone)]
pub struct GroupOption {
    pub value: String,
    pub title: String,
    pub selected: bool,
}

/// Create and edit share one form template; `is_edit` switches the labels.
pub struct PostFormView {
    pub is_edit: bool,
    pub action: String,
    pub body_value: String,
    pub body_error: String,
    pub group_error: String,
    pub groups: Vec<GroupOption>,
}

pub fn group_options(groups: &[GroupRecord], selected: Option<i64>) -> Vec<GroupOption> {
    groups
        .iter()
        .map(|group| GroupOption {
            value: group.id.to_string(),
            title: group.title.clone(),
            selected: selected == Some(group.id),
        })
        .collect()
}

#[derive(Template)]
#[template(path = "post_form.html")]
pub struct PostFormTemplate {
    pub view: LayoutContext<PostFormView>,
}

pub struct LoginView {
    pub error: String,
    pub next: String,
    pub username_value: String,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub view: LayoutContext<LoginView>,
}

pub struct ErrorPageView {
    pub title: String,
    pub message: String,
}

impl ErrorPageView {
    pub fn not_found() -> Self {
        Self {
            title: "Page Not Found".to_string(),
            message: "The page you requested does not exist. Try returning to the homepage."
                .to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: LayoutContext<ErrorPageView>,
}
