//! Database layer
//!
//! SQLite persistence for the HAY Property backend.
//!
//! # Usage
//!
//! ```ignore
//! use hay_property::config::DatabaseConfig;
//! use hay_property::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool, DatabasePool, DynDatabasePool, SqliteDatabase};
