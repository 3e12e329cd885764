use std::{process, sync::Arc};

use jotter::{
    application::{
        error::AppError,
        groups::{GroupService, NewGroup},
    },
    cache::{PageCache, PageCacheConfig},
    config,
    infra::{db::SqliteRepositories, error::InfraError, http, telemetry},
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
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
        config::Command::Migrate(_) => run_migrate(settings).await,
        config::Command::CreateGroup(args) => run_create_group(settings, args).await,
    }
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<SqliteRepositories>, AppError> {
    let pool = SqliteRepositories::connect(
        &settings.database.url,
        settings.database.max_connections.get(),
    )
    .await
    .map_err(InfraError::from)?;

    SqliteRepositories::run_migrations(&pool)
        .await
        .map_err(InfraError::from)?;

    Ok(Arc::new(SqliteRepositories::new(pool)))
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;

    let cache_config = PageCacheConfig::from(&settings.cache);
    let cache = cache_config
        .enabled
        .then(|| Arc::new(PageCache::new(cache_config)));

    let state = http::HttpState::from_repositories(repositories, cache);
    let router = http::build_router(state, &settings.session);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(InfraError::from)?;
    info!(
        target: "jotter::server",
        addr = %settings.server.addr,
        "listening"
    );

    let grace = settings.server.graceful_shutdown;
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal());

    // Bound the drain phase: stop waiting on lingering connections once the
    // grace period after the signal has elapsed.
    let served = tokio::select! {
        result = server.into_future() => result,
        () = async {
            shutdown_signal().await;
            tokio::time::sleep(grace).await;
        } => {
            warn!(
                target: "jotter::server",
                grace_seconds = grace.as_secs(),
                "graceful shutdown timed out"
            );
            Ok(())
        }
    };

    served.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
    info!(target: "jotter::server", "server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(target: "jotter::server", error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    init_repositories(&settings).await?;
    info!(
        target: "jotter::migrate",
        database = %settings.database.url,
        "migrations applied"
    );
    Ok(())
}

async fn run_create_group(
    settings: config::Settings,
    args: config::CreateGroupArgs,
) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let groups = GroupService::new(repositories);

    let group = groups
        .create_group(NewGroup {
            title: args.title,
            slug: args.slug,
            description: args.description,
        })
        .await?;

    println!("{}\t{}\t{}", group.id, group.slug, group.title);
    Ok(())
}
