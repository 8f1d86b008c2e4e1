//! HTTP surface: router assembly, handlers and middleware.

mod auth;
pub mod middleware;
mod posts;
mod public;

pub use auth::SESSION_COOKIE;

use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post},
};

use crate::application::{
    accounts::AccountService, feed::FeedService, posts::PostService, repos::GroupsRepo,
};
use crate::infra::db::SqliteRepositories;

use middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct HttpState {
    pub feed: Arc<FeedService>,
    pub posts: Arc<PostService>,
    pub accounts: Arc<AccountService>,
    pub groups: Arc<dyn GroupsRepo>,
    pub db: Arc<SqliteRepositories>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(public::index))
        .route("/group/{slug}", get(public::group_index))
        .route("/profile/{username}", get(public::profile))
        .route("/posts/{id}", get(public::post_detail))
        .route("/create", get(posts::create_form).post(posts::create_submit))
        .route(
            "/posts/{id}/edit",
            get(posts::edit_form).post(posts::edit_submit),
        )
        .route("/auth/login", get(auth::login_form).post(auth::login_submit))
        .route("/auth/logout", post(auth::logout))
        .route("/_health/db", get(public::db_health))
        .fallback(public::fallback)
        .with_state(state)
        .layer(from_fn(log_responses))
        .layer(from_fn(set_request_context))
}
