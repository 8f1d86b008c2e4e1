//! Authenticated create and edit surfaces.
//!
//! Both require a session; anonymous visitors are redirected to the login
//! form with a `next` parameter. Editing is author-only: anyone else is
//! silently redirected to the post's detail view without a mutation, which
//! mirrors the product's long-standing behaviour.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::application::posts::{EditOutcome, SubmitOutcome};
use crate::domain::posts::{PostFormErrors, PostInput};
use crate::presentation::views::{
    LayoutChrome, LayoutContext, PostFormTemplate, PostFormView, detail_href, edit_href,
    group_options, profile_href, render_template_response,
};

use super::HttpState;
use super::auth::{current_user, login_redirect};
use super::public::error_response;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct PostFormBody {
    body: String,
    group: String,
}

impl PostFormBody {
    fn into_input(self) -> PostInput {
        PostInput {
            body: self.body,
            group: self.group,
        }
    }
}

/// Render the create/edit form, loading the group choices fresh each time.
async fn form_page(
    state: &HttpState,
    chrome: LayoutChrome,
    is_edit: bool,
    action: String,
    body_value: String,
    selected_group: Option<i64>,
    group_value: &str,
    errors: PostFormErrors,
) -> Response {
    let groups = match state.groups.list_groups().await {
        Ok(groups) => groups,
        Err(err) => return error_response(err.into(), chrome),
    };

    // After a rejected submit the selection comes from the raw field value,
    // not from a stored post.
    let selected = selected_group.or_else(|| group_value.trim().parse::<i64>().ok());

    let content = PostFormView {
        is_edit,
        action,
        body_value,
        body_error: errors.body.unwrap_or_default(),
        group_error: errors.group.unwrap_or_default(),
        groups: group_options(&groups, selected),
    };
    let view = LayoutContext::new(chrome, content);
    render_template_response(PostFormTemplate { view }, StatusCode::OK)
}

pub(super) async fn create_form(State(state): State<HttpState>, jar: CookieJar) -> Response {
    let user = match current_user(&state, &jar).await {
        Ok(Some(user)) => user,
        Ok(None) => return login_redirect("/create"),
        Err(err) => return err.into_response(),
    };

    let chrome = LayoutChrome::for_visitor(Some(&user));
    form_page(
        &state,
        chrome,
        false,
        "/create".to_string(),
        String::new(),
        None,
        "",
        PostFormErrors::default(),
    )
    .await
}

pub(super) async fn create_submit(
    State(state): State<HttpState>,
    jar: CookieJar,
    axum::Form(form): axum::Form<PostFormBody>,
) -> Response {
    let user = match current_user(&state, &jar).await {
        Ok(Some(user)) => user,
        Ok(None) => return login_redirect("/create"),
        Err(err) => return err.into_response(),
    };

    let chrome = LayoutChrome::for_visitor(Some(&user));
    let input = form.into_input();

    match state.posts.create(user.id, &input).await {
        Ok(SubmitOutcome::Saved(_)) => {
            Redirect::to(&profile_href(&user.username)).into_response()
        }
        Ok(SubmitOutcome::Rejected(errors)) => {
            form_page(
                &state,
                chrome,
                false,
                "/create".to_string(),
                input.body,
                None,
                &input.group,
                errors,
            )
            .await
        }
        Err(err) => error_response(err, chrome),
    }
}

pub(super) async fn edit_form(
    State(state): State<HttpState>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Response {
    let user = match current_user(&state, &jar).await {
        Ok(Some(user)) => user,
        Ok(None) => return login_redirect(&edit_href(id)),
        Err(err) => return err.into_response(),
    };

    let chrome = LayoutChrome::for_visitor(Some(&user));
    let post = match state.posts.find_post(id).await {
        Ok(post) => post,
        Err(err) => return error_response(err, chrome),
    };

    if post.author_id != user.id {
        return Redirect::to(&detail_href(id)).into_response();
    }

    form_page(
        &state,
        chrome,
        true,
        edit_href(id),
        post.body,
        post.group_id,
        "",
        PostFormErrors::default(),
    )
    .await
}

pub(super) async fn edit_submit(
    State(state): State<HttpState>,
    jar: CookieJar,
    Path(id): Path<i64>,
    axum::Form(form): axum::Form<PostFormBody>,
) -> Response {
    let user = match current_user(&state, &jar).await {
        Ok(Some(user)) => user,
        Ok(None) => return login_redirect(&edit_href(id)),
        Err(err) => return err.into_response(),
    };

    let chrome = LayoutChrome::for_visitor(Some(&user));
    let input = form.into_input();

    match state.posts.edit(id, user.id, &input).await {
        Ok(EditOutcome::Updated(_)) | Ok(EditOutcome::NotAuthor) => {
            Redirect::to(&detail_href(id)).into_response()
        }
        Ok(EditOutcome::Rejected(errors)) => {
            form_page(
                &state,
                chrome,
                true,
                edit_href(id),
                input.body,
                None,
                &input.group,
                errors,
            )
            .await
        }
        Err(err) => error_response(err, chrome),
    }
}
