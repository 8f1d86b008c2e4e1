use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use sqlx::SqlitePool;
use tower::ServiceExt;

use brezza::application::accounts::AccountService;
use brezza::application::feed::FeedService;
use brezza::application::pagination::{PAGE_SIZE, Slice};
use brezza::application::posts::PostService;
use brezza::application::repos::{
    GroupsRepo, NewGroup, NewPost, PostFilter, PostsRepo, PostsWriteRepo, SessionsRepo, UsersRepo,
};
use brezza::domain::entities::{GroupRecord, PostRecord, UserRecord};
use brezza::infra::db::SqliteRepositories;
use brezza::infra::http::{HttpState, SESSION_COOKIE, build_router};

fn build_state(pool: SqlitePool) -> HttpState {
    let repositories = Arc::new(SqliteRepositories::new(pool));

    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
    let posts_write_repo: Arc<dyn PostsWriteRepo> = repositories.clone();
    let groups_repo: Arc<dyn GroupsRepo> = repositories.clone();
    let users_repo: Arc<dyn UsersRepo> = repositories.clone();
    let sessions_repo: Arc<dyn SessionsRepo> = repositories.clone();

    HttpState {
        feed: Arc::new(FeedService::new(
            posts_repo.clone(),
            groups_repo.clone(),
            users_repo.clone(),
        )),
        posts: Arc::new(PostService::new(
            posts_repo,
            posts_write_repo,
            groups_repo.clone(),
        )),
        accounts: Arc::new(AccountService::new(users_repo, sessions_repo)),
        groups: groups_repo,
        db: repositories,
    }
}

fn build_app(pool: SqlitePool) -> (Router, HttpState) {
    let state = build_state(pool);
    (build_router(state.clone()), state)
}

/// Create a user plus an open session, returning the record and a cookie
/// header value for authenticated requests.
async fn signed_in_user(state: &HttpState, username: &str) -> (UserRecord, String) {
    let user = state
        .accounts
        .create_user(username, "correct horse")
        .await
        .expect("create user");
    let token = state
        .accounts
        .open_session(user.id)
        .await
        .expect("open session");
    (user, format!("{SESSION_COOKIE}={token}"))
}

async fn seed_post(state: &HttpState, author_id: i64, body: &str) -> PostRecord {
    state
        .db
        .create_post(NewPost {
            body: body.to_string(),
            author_id,
            group_id: None,
        })
        .await
        .expect("seed post")
}

async fn seed_group(state: &HttpState, title: &str, slug: &str) -> GroupRecord {
    state
        .groups
        .create_group(NewGroup {
            title: title.to_string(),
            slug: slug.to_string(),
            description: String::new(),
        })
        .await
        .expect("seed group")
}

async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    (status, String::from_utf8_lossy(&body).into_owned())
}

async fn post_form(
    app: &Router,
    uri: &str,
    cookie: Option<&str>,
    form: &str,
) -> axum::response::Response {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(builder.body(Body::from(form.to_string())).expect("request"))
        .await
        .expect("response")
}

fn location(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn count_posts_in(html: &str) -> usize {
    html.matches("<article class=\"post\">").count()
}

#[sqlx::test(migrations = "./migrations")]
async fn index_renders_empty_feed(pool: SqlitePool) {
    let (app, _) = build_app(pool);

    let (status, body) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Latest posts"));
    assert!(body.contains("No posts yet."));
}

#[sqlx::test(migrations = "./migrations")]
async fn created_post_shows_on_index_and_profile(pool: SqlitePool) {
    let (app, state) = build_app(pool);
    let (user, cookie) = signed_in_user(&state, "leo").await;

    let response = post_form(&app, "/create", Some(&cookie), "body=First+note&group=").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/profile/{}", user.username));

    let (status, body) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("First note"));

    let (status, body) = get(&app, "/profile/leo").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("First note"));
    assert_eq!(count_posts_in(&body), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn created_post_carries_the_submitted_group(pool: SqlitePool) {
    let (app, state) = build_app(pool);
    let (user, cookie) = signed_in_user(&state, "leo").await;
    let group = seed_group(&state, "Field notes", "field-notes").await;

    let form = format!("body=Field+report&group={}", group.id);
    let response = post_form(&app, "/create", Some(&cookie), &form).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/profile/{}", user.username));

    let stored = PostsRepo::list_posts(
        state.db.as_ref(),
        PostFilter::by_group(group.id),
        Slice {
            limit: PAGE_SIZE,
            offset: 0,
        },
    )
    .await
    .expect("list grouped posts");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].body, "Field report");
    assert_eq!(stored[0].group_id, Some(group.id));

    let (status, body) = get(&app, &format!("/posts/{}", stored[0].id)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("/group/field-notes"));
    assert!(body.contains("Field notes"));

    let (status, body) = get(&app, "/group/field-notes").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Field report"));
}

#[sqlx::test(migrations = "./migrations")]
async fn anonymous_create_redirects_to_login_without_saving(pool: SqlitePool) {
    let (app, state) = build_app(pool);

    let response = post_form(&app, "/create", None, "body=Sneaky&group=").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login?next=%2Fcreate");

    let total = PostsRepo::count_posts(state.db.as_ref(), Default::default())
        .await
        .expect("count posts");
    assert_eq!(total, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn anonymous_edit_redirects_to_login(pool: SqlitePool) {
    let (app, state) = build_app(pool);
    let (author, _) = signed_in_user(&state, "leo").await;
    let post = seed_post(&state, author.id, "Original").await;

    let uri = format!("/posts/{}/edit", post.id);
    let response = post_form(&app, &uri, None, "body=Hijacked&group=").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        format!("/auth/login?next=%2Fposts%2F{}%2Fedit", post.id)
    );

    let stored = PostsRepo::find_post(state.db.as_ref(), post.id)
        .await
        .expect("find post")
        .expect("post exists");
    assert_eq!(stored.body, "Original");
}

#[sqlx::test(migrations = "./migrations")]
async fn author_edits_post_in_place(pool: SqlitePool) {
    let (app, state) = build_app(pool);
    let (author, cookie) = signed_in_user(&state, "leo").await;
    let group = seed_group(&state, "Field notes", "field-notes").await;
    let post = seed_post(&state, author.id, "Original").await;

    let uri = format!("/posts/{}/edit", post.id);
    let form = format!("body=Rewritten&group={}", group.id);
    let response = post_form(&app, &uri, Some(&cookie), &form).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/posts/{}", post.id));

    let stored = PostsRepo::find_post(state.db.as_ref(), post.id)
        .await
        .expect("find post")
        .expect("post exists");
    assert_eq!(stored.body, "Rewritten");
    assert_eq!(stored.group_id, Some(group.id));

    let (status, body) = get(&app, &format!("/posts/{}", post.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Rewritten"));
    assert!(!body.contains("Original"));
    assert!(body.contains("/group/field-notes"));

    // The edit form now pre-selects the stored group.
    let request = Request::builder()
        .uri(&uri)
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    let form_body = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let form_html = String::from_utf8_lossy(&form_body);
    assert!(form_html.contains(&format!("value=\"{}\" selected", group.id)));

    let total = PostsRepo::count_posts(state.db.as_ref(), Default::default())
        .await
        .expect("count posts");
    assert_eq!(total, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn non_author_edit_redirects_without_change(pool: SqlitePool) {
    let (app, state) = build_app(pool);
    let (author, _) = signed_in_user(&state, "leo").await;
    let (_, intruder_cookie) = signed_in_user(&state, "mallory").await;
    let post = seed_post(&state, author.id, "Original").await;

    let uri = format!("/posts/{}/edit", post.id);
    let response = post_form(&app, &uri, Some(&intruder_cookie), "body=Defaced&group=").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/posts/{}", post.id));

    let stored = PostsRepo::find_post(state.db.as_ref(), post.id)
        .await
        .expect("find post")
        .expect("post exists");
    assert_eq!(stored.body, "Original");

    // The edit form itself also bounces non-authors back to the detail page.
    let request = Request::builder()
        .uri(uri)
        .header(header::COOKIE, &intruder_cookie)
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/posts/{}", post.id));
}

#[sqlx::test(migrations = "./migrations")]
async fn group_page_lists_only_grouped_posts(pool: SqlitePool) {
    let (app, state) = build_app(pool);
    let (author, _) = signed_in_user(&state, "leo").await;

    let group = state
        .groups
        .create_group(NewGroup {
            title: "Test group".to_string(),
            slug: "test-slug".to_string(),
            description: "For testing".to_string(),
        })
        .await
        .expect("create group");

    state
        .db
        .create_post(NewPost {
            body: "hello".to_string(),
            author_id: author.id,
            group_id: Some(group.id),
        })
        .await
        .expect("grouped post");
    seed_post(&state, author.id, "ungrouped note").await;

    let (status, body) = get(&app, "/group/test-slug").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Test group"));
    assert!(body.contains("hello"));
    assert!(!body.contains("ungrouped note"));
    assert_eq!(count_posts_in(&body), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn feed_paginates_ten_per_page_and_clamps(pool: SqlitePool) {
    let (app, state) = build_app(pool);
    let (author, _) = signed_in_user(&state, "leo").await;

    for n in 1..=13 {
        seed_post(&state, author.id, &format!("note number {n}")).await;
    }

    let (status, body) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(count_posts_in(&body), 10);
    assert!(body.contains("note number 13"));
    assert!(!body.contains(">note number 3<"));

    let (_, body) = get(&app, "/?page=2").await;
    assert_eq!(count_posts_in(&body), 3);
    assert!(body.contains("note number 1"));

    // Out-of-range pages clamp to the last page, garbage to the first.
    let (status, clamped) = get(&app, "/?page=99").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(count_posts_in(&clamped), 3);

    let (status, garbage) = get(&app, "/?page=banana").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(count_posts_in(&garbage), 10);
}

#[sqlx::test(migrations = "./migrations")]
async fn unknown_resources_render_404(pool: SqlitePool) {
    let (app, _) = build_app(pool);

    let (status, _) = get(&app, "/group/no-such-slug").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get(&app, "/profile/nobody").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get(&app, "/posts/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get(&app, "/definitely/not/a/route").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn login_issues_session_cookie_and_honours_next(pool: SqlitePool) {
    let (app, state) = build_app(pool);
    state
        .accounts
        .create_user("leo", "correct horse")
        .await
        .expect("create user");

    let response = post_form(
        &app,
        "/auth/login",
        None,
        "username=leo&password=correct+horse&next=%2Fcreate",
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/create");

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .expect("session cookie");
    assert!(set_cookie.starts_with(SESSION_COOKIE));
    assert!(set_cookie.contains("HttpOnly"));
}

#[sqlx::test(migrations = "./migrations")]
async fn login_rejects_bad_credentials(pool: SqlitePool) {
    let (app, state) = build_app(pool);
    state
        .accounts
        .create_user("leo", "correct horse")
        .await
        .expect("create user");

    let response = post_form(
        &app,
        "/auth/login",
        None,
        "username=leo&password=wrong&next=%2F",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!response.headers().contains_key(header::SET_COOKIE));

    let body = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let html = String::from_utf8_lossy(&body);
    assert!(html.contains("Username and password did not match."));
}

#[sqlx::test(migrations = "./migrations")]
async fn login_ignores_offsite_next_targets(pool: SqlitePool) {
    let (app, state) = build_app(pool);
    state
        .accounts
        .create_user("leo", "correct horse")
        .await
        .expect("create user");

    let response = post_form(
        &app,
        "/auth/login",
        None,
        "username=leo&password=correct+horse&next=https%3A%2F%2Fevil.example",
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}

#[sqlx::test(migrations = "./migrations")]
async fn blank_post_body_is_rejected_with_message(pool: SqlitePool) {
    let (app, state) = build_app(pool);
    let (_, cookie) = signed_in_user(&state, "leo").await;

    let response = post_form(&app, "/create", Some(&cookie), "body=+++&group=").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let html = String::from_utf8_lossy(&body);
    assert!(html.contains("Write something before publishing."));

    let total = PostsRepo::count_posts(state.db.as_ref(), Default::default())
        .await
        .expect("count posts");
    assert_eq!(total, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn unknown_group_choice_is_rejected(pool: SqlitePool) {
    let (app, state) = build_app(pool);
    let (_, cookie) = signed_in_user(&state, "leo").await;

    let response = post_form(&app, "/create", Some(&cookie), "body=Hi&group=424242").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let html = String::from_utf8_lossy(&body);
    assert!(html.contains("Choose one of the listed groups."));
}

#[sqlx::test(migrations = "./migrations")]
async fn logout_clears_the_session(pool: SqlitePool) {
    let (app, state) = build_app(pool);
    let (_, cookie) = signed_in_user(&state, "leo").await;

    let response = post_form(&app, "/auth/logout", Some(&cookie), "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    // The old token no longer resolves; creating now demands a login.
    let response = post_form(&app, "/create", Some(&cookie), "body=After&group=").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login?next=%2Fcreate");
}

#[sqlx::test(migrations = "./migrations")]
async fn detail_shows_edit_link_only_to_the_author(pool: SqlitePool) {
    let (app, state) = build_app(pool);
    let (author, author_cookie) = signed_in_user(&state, "leo").await;
    let (_, other_cookie) = signed_in_user(&state, "mallory").await;
    let post = seed_post(&state, author.id, "Original").await;

    let uri = format!("/posts/{}", post.id);
    let edit_marker = format!("/posts/{}/edit", post.id);

    let request = Request::builder()
        .uri(&uri)
        .header(header::COOKIE, &author_cookie)
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    let body = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    assert!(String::from_utf8_lossy(&body).contains(&edit_marker));

    let request = Request::builder()
        .uri(&uri)
        .header(header::COOKIE, &other_cookie)
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    let body = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    assert!(!String::from_utf8_lossy(&body).contains(&edit_marker));
}

#[sqlx::test(migrations = "./migrations")]
async fn db_health_endpoint_reports_ok(pool: SqlitePool) {
    let (app, _) = build_app(pool);

    let (status, body) = get(&app, "/_health/db").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}
