//! Database repositories and versioned migrations.
//!
//! The pipeline assumes a fixed, fully-migrated schema: migrations run once at
//! startup via [`run_migrations`], and no query branches on column presence.

use std::str::FromStr;
use std::time::Duration;

use snapbin_core::AppError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

pub mod db;

pub use db::{AssetRepository, AuditRepository, ShortLinkRepository};

/// Embedded migration set, applied in order at startup.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Open (creating if missing) the SQLite database behind `database_url`.
pub async fn connect(database_url: &str) -> Result<SqlitePool, AppError> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5))
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), AppError> {
    MIGRATOR
        .run(pool)
        .await
        .map_err(|e| AppError::Internal(format!("Migration failed: {e}")))?;
    tracing::info!("Database migrations applied");
    Ok(())
}
