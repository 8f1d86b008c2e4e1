//! Unauthenticated read surfaces: index, group and profile listings, post
//! detail, and the database health probe.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::application::error::AppError;
use crate::domain::entities::UserRecord;
use crate::presentation::views::{
    GroupTemplate, IndexTemplate, LayoutChrome, LayoutContext, PostDetailTemplate, PostDetailView,
    ProfileTemplate, ProfileView, edit_href, feed_view, group_view, post_card, profile_href,
    render_not_found_response, render_template_response,
};

use super::HttpState;
use super::auth::current_user;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct PageQuery {
    page: Option<String>,
}

/// NotFound renders the themed 404 page; everything else maps through
/// `AppError`'s own response conversion.
pub(super) fn error_response(err: AppError, chrome: LayoutChrome) -> Response {
    if err.is_not_found() {
        render_not_found_response(chrome)
    } else {
        err.into_response()
    }
}

pub(super) async fn visitor_chrome(state: &HttpState, jar: &CookieJar) -> LayoutChrome {
    // A broken session lookup must not take down a public page.
    let user = current_user(state, jar).await.ok().flatten();
    LayoutChrome::for_visitor(user.as_ref())
}

pub(super) async fn index(
    State(state): State<HttpState>,
    jar: CookieJar,
    Query(query): Query<PageQuery>,
) -> Response {
    let chrome = visitor_chrome(&state, &jar).await;

    match state.feed.index_page(query.page.as_deref()).await {
        Ok(page) => {
            let content = feed_view("Latest posts", "", "/", &page);
            let view = LayoutContext::new(chrome, content);
            render_template_response(IndexTemplate { view }, StatusCode::OK)
        }
        Err(err) => error_response(err, chrome),
    }
}

pub(super) async fn group_index(
    State(state): State<HttpState>,
    jar: CookieJar,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    let chrome = visitor_chrome(&state, &jar).await;

    match state.feed.group_page(&slug, query.page.as_deref()).await {
        Ok(feed) => {
            let content = group_view(&feed.group, &feed.page);
            let view = LayoutContext::new(chrome, content);
            render_template_response(GroupTemplate { view }, StatusCode::OK)
        }
        Err(err) => error_response(err, chrome),
    }
}

pub(super) async fn profile(
    State(state): State<HttpState>,
    jar: CookieJar,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    let chrome = visitor_chrome(&state, &jar).await;

    match state
        .feed
        .profile_page(&username, query.page.as_deref())
        .await
    {
        Ok(feed) => {
            let content = ProfileView {
                username: feed.author.username.clone(),
                post_count: feed.post_count,
                feed: feed_view("", "", &profile_href(&feed.author.username), &feed.page),
            };
            let view = LayoutContext::new(chrome, content);
            render_template_response(ProfileTemplate { view }, StatusCode::OK)
        }
        Err(err) => error_response(err, chrome),
    }
}

pub(super) async fn post_detail(
    State(state): State<HttpState>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Response {
    let visitor = current_user(&state, &jar).await.ok().flatten();
    let chrome = LayoutChrome::for_visitor(visitor.as_ref());

    match state.feed.post_detail(id).await {
        Ok(detail) => {
            let can_edit = is_author(visitor.as_ref(), detail.post.author_id);
            let content = PostDetailView {
                post: post_card(&detail.post),
                author_post_count: detail.author_post_count,
                can_edit,
                edit_href: edit_href(detail.post.id),
            };
            let view = LayoutContext::new(chrome, content);
            render_template_response(PostDetailTemplate { view }, StatusCode::OK)
        }
        Err(err) => error_response(err, chrome),
    }
}

fn is_author(visitor: Option<&UserRecord>, author_id: i64) -> bool {
    visitor.map(|user| user.id == author_id).unwrap_or(false)
}

pub(super) async fn db_health(State(state): State<HttpState>) -> Response {
    match state.db.health_check().await {
        Ok(()) => (StatusCode::OK, "ok").into_response(),
        Err(err) => {
            let status = StatusCode::SERVICE_UNAVAILABLE;
            let mut response = (status, "database unavailable").into_response();
            crate::application::error::ErrorReport::from_error(
                "infra::http::public::db_health",
                status,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

pub(super) async fn fallback(State(state): State<HttpState>, jar: CookieJar) -> Response {
    let chrome = visitor_chrome(&state, &jar).await;
    render_not_found_response(chrome)
}
