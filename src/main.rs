use std::{process, sync::Arc};

use brezza::{
    application::{
        accounts::AccountService,
        error::AppError,
        feed::FeedService,
        posts::PostService,
        repos::{GroupsRepo, NewGroup, PostsRepo, PostsWriteRepo, SessionsRepo, UsersRepo},
    },
    config,
    infra::{
        db::SqliteRepositories,
        error::InfraError,
        http::{self, HttpState},
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::AddUser(args) => run_add_user(settings, args).await,
        config::Command::AddGroup(args) => run_add_group(settings, args).await,
    }
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<SqliteRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = SqliteRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    SqliteRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(SqliteRepositories::new(pool)))
}

fn build_http_state(repositories: Arc<SqliteRepositories>) -> HttpState {
    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
    let posts_write_repo: Arc<dyn PostsWriteRepo> = repositories.clone();
    let groups_repo: Arc<dyn GroupsRepo> = repositories.clone();
    let users_repo: Arc<dyn UsersRepo> = repositories.clone();
    let sessions_repo: Arc<dyn SessionsRepo> = repositories.clone();

    let feed = Arc::new(FeedService::new(
        posts_repo.clone(),
        groups_repo.clone(),
        users_repo.clone(),
    ));
    let posts = Arc::new(PostService::new(
        posts_repo,
        posts_write_repo,
        groups_repo.clone(),
    ));
    let accounts = Arc::new(AccountService::new(users_repo, sessions_repo));

    HttpState {
        feed,
        posts,
        accounts,
        groups: groups_repo,
        db: repositories,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let state = build_http_state(repositories);
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "brezza::serve",
        addr = %settings.server.addr,
        "listening"
    );

    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn run_add_user(
    settings: config::Settings,
    args: config::AddUserArgs,
) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;

    let users_repo: Arc<dyn UsersRepo> = repositories.clone();
    let sessions_repo: Arc<dyn SessionsRepo> = repositories;
    let accounts = AccountService::new(users_repo, sessions_repo);

    let user = accounts.create_user(&args.username, &args.password).await?;
    info!(
        target = "brezza::cli",
        username = %user.username,
        "user created"
    );
    Ok(())
}

async fn run_add_group(
    settings: config::Settings,
    args: config::AddGroupArgs,
) -> Result<(), AppError> {
    let title = args.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::validation("group title must not be empty"));
    }

    let slug = slug::slugify(&title);
    if slug.is_empty() {
        return Err(AppError::validation(
            "group title must contain at least one sluggable character",
        ));
    }

    let repositories = init_repositories(&settings).await?;
    let groups_repo: Arc<dyn GroupsRepo> = repositories;

    let group = groups_repo
        .create_group(NewGroup {
            title,
            slug,
            description: args.description,
        })
        .await?;

    info!(
        target = "brezza::cli",
        slug = %group.slug,
        title = %group.title,
        "group created"
    );
    Ok(())
}
