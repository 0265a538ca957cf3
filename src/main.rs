//! Energy Dashboard - HTTP API for energy meter readings
//!
//! Serves login, preferences, units and the graphing endpoints over a SQLite
//! database of meters, groups and readings.

use std::env;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use tracing::info;

use energy_dashboard::{
    config::{self, LogFormat},
    create_router, db,
    models::UserRole,
    services, AppConfig, AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        print_help();
        return Ok(());
    }

    if args.iter().any(|arg| arg == "--version" || arg == "-V") {
        println!("Energy Dashboard {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Load configuration first (before logging, so we know log format)
    let config = AppConfig::load().context("Failed to load configuration")?;

    // The guard must outlive the program so file logs are flushed
    let _log_guard = init_logging(&config);

    ensure_data_directory(&config)?;

    info!("Initializing database connection");
    let db = db::init_pool(&config.database)
        .await
        .context("Failed to initialize database")?;

    if let Some(position) = args.iter().position(|arg| arg == "--create-user") {
        return create_user(&db, &args[position + 1..]).await;
    }

    services::redo_cik(&db)
        .await
        .context("Failed to compute derived conversions")?;

    let app = create_router(AppState::new(config.clone(), db));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address configuration")?;

    info!("Starting HTTP server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Server stopped");
    Ok(())
}

/// Handle `--create-user <username> <password> <role>`
async fn create_user(db: &db::DbPool, args: &[String]) -> Result<()> {
    let [username, password, role, ..] = args else {
        anyhow::bail!("Usage: energy-dashboard --create-user <username> <password> <role>");
    };
    let role: UserRole = role.parse().map_err(anyhow::Error::msg)?;

    let user = services::AuthService::new(db.clone())
        .create_user(username, password, role)
        .await?;

    info!(username = %user.username, role = %user.role, "User created");
    println!("Created user '{}' with role {}", user.username, user.role);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Initialize the logging/tracing infrastructure
fn init_logging(config: &AppConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use energy_dashboard::config::LogTarget;
    use tracing_subscriber::{prelude::*, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let log_config = &config.logging;

    match &log_config.target {
        LogTarget::Console => {
            let subscriber = tracing_subscriber::registry().with(env_filter);
            init_console_logging(subscriber, &log_config.format);
            None
        }
        LogTarget::File => {
            let (writer, guard) = create_file_writer(log_config);
            let subscriber = tracing_subscriber::registry().with(env_filter);
            init_file_logging(subscriber, &log_config.format, writer);
            Some(guard)
        }
        LogTarget::Both => {
            let (writer, guard) = create_file_writer(log_config);
            let subscriber = tracing_subscriber::registry().with(env_filter);
            let subscriber = subscriber.with(file_layer(&log_config.format, writer));
            init_console_logging(subscriber, &log_config.format);
            Some(guard)
        }
    }
}

/// Create a file writer with optional daily rotation
fn create_file_writer(
    log_config: &config::LoggingConfig,
) -> (
    tracing_appender::non_blocking::NonBlocking,
    tracing_appender::non_blocking::WorkerGuard,
) {
    if let Err(e) = std::fs::create_dir_all(&log_config.log_dir) {
        eprintln!(
            "Warning: Failed to create log directory {:?}: {}",
            log_config.log_dir, e
        );
    }

    let file_appender = if log_config.daily_rotation {
        tracing_appender::rolling::daily(&log_config.log_dir, &log_config.log_prefix)
    } else {
        tracing_appender::rolling::never(&log_config.log_dir, &log_config.log_prefix)
    };

    tracing_appender::non_blocking(file_appender)
}

type BoxedLayer<S> = Box<dyn tracing_subscriber::Layer<S> + Send + Sync + 'static>;

/// A formatting layer writing to `writer`
fn file_layer<S>(format: &LogFormat, writer: tracing_appender::non_blocking::NonBlocking) -> BoxedLayer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a> + Send + Sync + 'static,
{
    use tracing_subscriber::{fmt, Layer};

    match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_writer(writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .with_ansi(false)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_ansi(false)
            .with_writer(writer)
            .boxed(),
    }
}

/// Initialize console logging on top of `subscriber`
fn init_console_logging<S>(subscriber: S, format: &LogFormat)
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a> + Send + Sync + 'static,
{
    use tracing_subscriber::{fmt, prelude::*};

    match format {
        LogFormat::Json => {
            subscriber
                .with(fmt::layer().json().with_target(true))
                .init();
        }
        LogFormat::Compact => {
            subscriber
                .with(fmt::layer().compact().with_target(false))
                .init();
        }
        LogFormat::Pretty => {
            subscriber
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_thread_ids(false)
                        .with_file(false)
                        .with_line_number(false),
                )
                .init();
        }
    }
}

/// Initialize file-only logging
fn init_file_logging<S>(
    subscriber: S,
    format: &LogFormat,
    writer: tracing_appender::non_blocking::NonBlocking,
) where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a> + Send + Sync + 'static,
{
    use tracing_subscriber::prelude::*;

    subscriber.with(file_layer(format, writer)).init();
}

/// Ensure the directory of the SQLite database exists
fn ensure_data_directory(config: &AppConfig) -> Result<()> {
    if let Some(path) = config.database.url.strip_prefix("sqlite://") {
        let path = path.split('?').next().unwrap_or_default();
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).context("Failed to create data directory")?;
                info!("Created data directory: {:?}", parent);
            }
        }
    }
    Ok(())
}

fn print_help() {
    println!(
        r#"Energy Dashboard {}

USAGE:
    energy-dashboard [OPTIONS]

OPTIONS:
    -h, --help              Print this help message
    -V, --version           Print version information
    --create-user <USERNAME> <PASSWORD> <ROLE>
                            Create a user and exit. ROLE is one of
                            admin, csv, export or obvius.

ENVIRONMENT:
    ENERGY_DASHBOARD_CONFIG     Path to configuration file
    DATABASE_URL                Production database URL
    TEST_DATABASE_URL           Overrides database.test_url
    JWT_SECRET                  Secret used to sign tokens
    RUST_LOG                    Log filter

CONFIGURATION:
    The application looks for configuration files in the following order:
    1. Path specified by ENERGY_DASHBOARD_CONFIG
    2. ./config.yaml
    3. ./config/config.yaml
    4. /etc/energy-dashboard/config.yaml
    5. energy-dashboard/config.yaml in the user config directory"#,
        env!("CARGO_PKG_VERSION")
    );
}
