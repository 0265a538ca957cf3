//! Database layer
//!
//! This module handles:
//! - Opening the SQLite pool and applying migrations
//! - Dropping and recreating the schema of a test database
//! - Repositories for units, meters, groups, readings and preferences

pub mod meter_repository;
pub mod preferences_repository;
pub mod reading_repository;
pub mod unit_repository;

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::DatabaseConfig;

pub use meter_repository::{GroupRepository, MeterRepository};
pub use preferences_repository::PreferencesRepository;
pub use reading_repository::ReadingRepository;
pub use unit_repository::UnitRepository;

/// Database connection pool type
pub type DbPool = Pool<Sqlite>;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Database lifecycle errors
#[derive(Debug, Error)]
pub enum DbError {
    /// The reset target looks like the production database
    #[error("Refusing to reset '{0}': it is not a test database")]
    ProductionDatabase(String),

    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Open a pool on `url` and run migrations
pub async fn init_pool_with_url(url: &str, config: &DatabaseConfig) -> Result<DbPool> {
    let options = SqliteConnectOptions::from_str(url)
        .with_context(|| format!("Invalid database URL: {}", url))?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to connect to database: {}", url))?;

    MIGRATOR
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    Ok(pool)
}

/// Open the production pool
pub async fn init_pool(config: &DatabaseConfig) -> Result<DbPool> {
    init_pool_with_url(&config.url, config).await
}

/// Drop every table and re-run migrations, leaving an empty schema.
///
/// Fails with [`DbError::ProductionDatabase`] unless the pool is connected to
/// a test database distinct from `config.url`.
pub async fn reset_database(pool: &DbPool, config: &DatabaseConfig) -> Result<(), DbError> {
    let mut conn = pool.acquire().await?;

    let connected_file: String = sqlx::query_scalar(
        "SELECT file FROM pragma_database_list WHERE name = 'main'",
    )
    .fetch_one(&mut *conn)
    .await?;

    ensure_test_database(&connected_file, config)?;

    sqlx::query("PRAGMA foreign_keys = OFF")
        .execute(&mut *conn)
        .await?;

    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
    )
    .fetch_all(&mut *conn)
    .await?;

    for table in &tables {
        let statement = format!("DROP TABLE IF EXISTS \"{}\"", table.replace('"', "\"\""));
        sqlx::query(&statement).execute(&mut *conn).await?;
    }

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&mut *conn)
        .await?;

    MIGRATOR.run(&mut *conn).await?;

    info!(tables = tables.len(), "Test database reset");
    Ok(())
}

/// Check that `connected_file` may be wiped.
///
/// In-memory databases are always safe. A file database must carry `test` in
/// its file name and must not be the configured production database.
pub fn ensure_test_database(connected_file: &str, config: &DatabaseConfig) -> Result<(), DbError> {
    if connected_file.is_empty() {
        return Ok(());
    }

    let connected = canonical(Path::new(connected_file));
    let production = sqlite_url_path(&config.url).map(|p| canonical(&p));

    if production.as_ref() == Some(&connected) {
        warn!(file = %connected_file, "Reset requested on the production database");
        return Err(DbError::ProductionDatabase(connected_file.to_string()));
    }

    let is_test_file = connected
        .file_name()
        .map(|name| name.to_string_lossy().to_lowercase().contains("test"))
        .unwrap_or(false);

    if !is_test_file {
        warn!(file = %connected_file, "Reset requested on a non-test database");
        return Err(DbError::ProductionDatabase(connected_file.to_string()));
    }

    Ok(())
}

/// File path named by a `sqlite:` URL, if it names a file
fn sqlite_url_path(url: &str) -> Option<PathBuf> {
    let rest = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path == ":memory:" {
        None
    } else {
        Some(PathBuf::from(path))
    }
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
