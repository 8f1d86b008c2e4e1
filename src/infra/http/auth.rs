//! Login, logout and session resolution.
//!
//! A session is an HTTP-only cookie holding an opaque token that the
//! accounts service resolves against the store. Handlers that need a signed
//! in user redirect anonymous visitors to the login form with a `next`
//! parameter pointing back at the page they asked for.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use url::form_urlencoded;

use crate::application::error::AppError;
use crate::domain::entities::UserRecord;
use crate::presentation::views::{
    LayoutChrome, LayoutContext, LoginTemplate, LoginView, render_template_response,
};

use super::HttpState;

pub const SESSION_COOKIE: &str = "brezza_session";

const BAD_CREDENTIALS_MESSAGE: &str = "Username and password did not match.";

/// Resolve the visitor behind the request's session cookie, if any.
pub(super) async fn current_user(
    state: &HttpState,
    jar: &CookieJar,
) -> Result<Option<UserRecord>, AppError> {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Ok(None);
    };
    state.accounts.resolve_session(cookie.value()).await
}

/// Redirect an anonymous visitor to the login form, preserving the page
/// they tried to reach.
pub(super) fn login_redirect(next: &str) -> Response {
    let query: String = form_urlencoded::Serializer::new(String::new())
        .append_pair("next", next)
        .finish();
    Redirect::to(&format!("/auth/login?{query}")).into_response()
}

/// Only same-site paths are honoured as post-login destinations.
fn sanitize_next(next: &str) -> &str {
    if next.starts_with('/') && !next.starts_with("//") {
        next
    } else {
        "/"
    }
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .build()
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct LoginQuery {
    next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct LoginForm {
    username: String,
    password: String,
    next: String,
}

fn login_page(
    chrome: LayoutChrome,
    error: impl Into<String>,
    next: &str,
    username_value: impl Into<String>,
) -> Response {
    let view = LayoutContext::new(chrome, LoginView {
        error: error.into(),
        next: sanitize_next(next).to_string(),
        username_value: username_value.into(),
    });
    render_template_response(LoginTemplate { view }, StatusCode::OK)
}

pub(super) async fn login_form(
    State(state): State<HttpState>,
    jar: CookieJar,
    Query(query): Query<LoginQuery>,
) -> Response {
    let user = match current_user(&state, &jar).await {
        Ok(user) => user,
        Err(err) => return err.into_response(),
    };

    login_page(
        LayoutChrome::for_visitor(user.as_ref()),
        "",
        query.next.as_deref().unwrap_or("/"),
        "",
    )
}

pub(super) async fn login_submit(
    State(state): State<HttpState>,
    jar: CookieJar,
    axum::Form(form): axum::Form<LoginForm>,
) -> Response {
    let verified = match state
        .accounts
        .verify_credentials(&form.username, &form.password)
        .await
    {
        Ok(verified) => verified,
        Err(err) => return err.into_response(),
    };

    let Some(user) = verified else {
        return login_page(
            LayoutChrome::for_visitor(None),
            BAD_CREDENTIALS_MESSAGE,
            &form.next,
            form.username,
        );
    };

    let token = match state.accounts.open_session(user.id).await {
        Ok(token) => token,
        Err(err) => return err.into_response(),
    };

    let jar = jar.add(session_cookie(token.to_string()));
    (jar, Redirect::to(sanitize_next(&form.next))).into_response()
}

pub(super) async fn logout(State(state): State<HttpState>, jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Err(err) = state.accounts.close_session(cookie.value()).await {
            return err.into_response();
        }
    }

    let jar = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());
    (jar, Redirect::to("/")).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_must_be_a_same_site_path() {
        assert_eq!(sanitize_next("/posts/3"), "/posts/3");
        assert_eq!(sanitize_next("https://evil.example"), "/");
        assert_eq!(sanitize_next("//evil.example"), "/");
        assert_eq!(sanitize_next(""), "/");
    }
}
