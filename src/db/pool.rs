//! SQLite connection pool
//!
//! Repositories reach the database through [`DatabasePool`], so tests can
//! hand them an in-memory pool and the server a file-backed one.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::DatabaseConfig;

/// Wait this long on a locked database before failing a write
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait]
pub trait DatabasePool: Send + Sync {
    /// Run a statement that returns no rows; yields the affected row count
    async fn execute(&self, query: &str) -> Result<u64>;

    /// Round-trip a trivial query
    async fn ping(&self) -> Result<()>;

    fn sqlite(&self) -> &SqlitePool;
}

/// Shared pool handle
pub type DynDatabasePool = Arc<dyn DatabasePool>;

pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Open a pool for `url`.
    ///
    /// Accepts `:memory:`, a `sqlite:` URL or a bare file path. Missing
    /// files and parent directories are created.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let in_memory = is_in_memory(url);
        let options = connect_options(url)?
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);
        let options = if in_memory {
            options
        } else {
            options.journal_mode(SqliteJournalMode::Wal)
        };

        // Each `:memory:` connection is its own database
        let max_connections = if in_memory { 1 } else { max_connections.max(1) };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open SQLite database {}", url))?;

        tracing::debug!(url, max_connections, "SQLite pool opened");
        Ok(Self { pool })
    }
}

fn is_in_memory(url: &str) -> bool {
    url == ":memory:" || url.starts_with("sqlite::memory:")
}

fn connect_options(url: &str) -> Result<SqliteConnectOptions> {
    if url == ":memory:" {
        return SqliteConnectOptions::from_str("sqlite::memory:").context("Invalid SQLite URL");
    }
    if is_in_memory(url) {
        return SqliteConnectOptions::from_str(url).context("Invalid SQLite URL");
    }

    let path = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:")).unwrap_or(url);
    let path = path.split('?').next().unwrap_or(path);
    ensure_parent_dir(Path::new(path))?;

    let options = if url.starts_with("sqlite:") {
        SqliteConnectOptions::from_str(url).with_context(|| format!("Invalid SQLite URL {}", url))?
    } else {
        SqliteConnectOptions::new().filename(path)
    };
    Ok(options.create_if_missing(true))
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory {}", parent.display())),
        _ => Ok(()),
    }
}

#[async_trait]
impl DatabasePool for SqliteDatabase {
    async fn execute(&self, query: &str) -> Result<u64> {
        let result = sqlx::query(query)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Query failed: {}", query))?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("Database ping failed")?;
        Ok(())
    }

    fn sqlite(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Open the configured database
pub async fn create_pool(config: &DatabaseConfig) -> Result<DynDatabasePool> {
    let db = SqliteDatabase::connect(&config.url, config.max_connections).await?;
    Ok(Arc::new(db))
}

/// Fresh in-memory database, one per call
pub async fn create_test_pool() -> Result<DynDatabasePool> {
    let db = SqliteDatabase::connect(":memory:", 1).await?;
    Ok(Arc::new(db))
}
