//! Schema migrations
//!
//! Migrations are SQL strings compiled into the binary and applied in
//! version order. Each one runs in its own transaction and is recorded in
//! `_migrations`; a recorded version whose name no longer matches the
//! code is treated as a broken database rather than silently skipped.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::collections::HashMap;

use super::DynDatabasePool;

#[derive(Debug, Clone, Copy)]
pub struct Migration {
    /// Unique, ascending
    pub version: i64,
    pub name: &'static str,
    /// One or more `;`-separated statements
    pub up: &'static str,
}

/// Schema history, oldest first
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_users",
        up: r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(100) NOT NULL,
                email VARCHAR(255) NOT NULL UNIQUE,
                phone VARCHAR(32),
                password_hash VARCHAR(255) NOT NULL,
                avatar TEXT,
                status VARCHAR(20) NOT NULL DEFAULT 'active',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);
        "#,
    },
    Migration {
        version: 2,
        name: "create_admins",
        up: r#"
            CREATE TABLE IF NOT EXISTS admins (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(100) NOT NULL,
                email VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                role VARCHAR(20) NOT NULL DEFAULT 'admin',
                last_login_at TIMESTAMP,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
    },
    Migration {
        version: 3,
        name: "create_properties",
        up: r#"
            CREATE TABLE IF NOT EXISTS properties (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                slug VARCHAR(200) NOT NULL UNIQUE,
                title VARCHAR(200) NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                location VARCHAR(255) NOT NULL DEFAULT '',
                city VARCHAR(100) NOT NULL DEFAULT '',
                price INTEGER NOT NULL DEFAULT 0,
                property_type VARCHAR(20) NOT NULL,
                status VARCHAR(20) NOT NULL DEFAULT 'available',
                bedrooms INTEGER,
                bathrooms INTEGER,
                size_sqm REAL,
                features TEXT NOT NULL DEFAULT '[]',
                images TEXT NOT NULL DEFAULT '[]',
                is_featured INTEGER NOT NULL DEFAULT 0,
                is_published INTEGER NOT NULL DEFAULT 1,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                CHECK (price >= 0)
            );
            CREATE INDEX IF NOT EXISTS idx_properties_slug ON properties(slug);
            CREATE INDEX IF NOT EXISTS idx_properties_status ON properties(status);
            CREATE INDEX IF NOT EXISTS idx_properties_city ON properties(city);
            CREATE INDEX IF NOT EXISTS idx_properties_created_at ON properties(created_at);
        "#,
    },
    Migration {
        version: 4,
        name: "create_blog",
        up: r#"
            CREATE TABLE IF NOT EXISTS blog_categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(100) NOT NULL UNIQUE,
                slug VARCHAR(120) NOT NULL UNIQUE,
                description TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS blogs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                slug VARCHAR(200) NOT NULL UNIQUE,
                title VARCHAR(200) NOT NULL,
                excerpt TEXT,
                content TEXT NOT NULL,
                content_html TEXT NOT NULL,
                cover_image TEXT,
                category_id INTEGER,
                author_id INTEGER,
                tags TEXT NOT NULL DEFAULT '[]',
                status VARCHAR(20) NOT NULL DEFAULT 'draft',
                published_at TIMESTAMP,
                view_count INTEGER NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (category_id) REFERENCES blog_categories(id) ON DELETE SET NULL,
                FOREIGN KEY (author_id) REFERENCES admins(id) ON DELETE SET NULL
            );
            CREATE INDEX IF NOT EXISTS idx_blogs_slug ON blogs(slug);
            CREATE INDEX IF NOT EXISTS idx_blogs_status ON blogs(status);
            CREATE INDEX IF NOT EXISTS idx_blogs_category_id ON blogs(category_id);
            CREATE INDEX IF NOT EXISTS idx_blogs_published_at ON blogs(published_at);
        "#,
    },
    Migration {
        version: 5,
        name: "create_purchases",
        up: r#"
            CREATE TABLE IF NOT EXISTS purchases (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                property_id INTEGER NOT NULL,
                total_amount INTEGER NOT NULL DEFAULT 0,
                amount_paid INTEGER NOT NULL DEFAULT 0,
                status VARCHAR(20) NOT NULL DEFAULT 'pending',
                land_acquisition INTEGER NOT NULL DEFAULT 0,
                documentation INTEGER NOT NULL DEFAULT 0,
                foundation INTEGER NOT NULL DEFAULT 0,
                blockwork INTEGER NOT NULL DEFAULT 0,
                roofing INTEGER NOT NULL DEFAULT 0,
                mep INTEGER NOT NULL DEFAULT 0,
                finishing INTEGER NOT NULL DEFAULT 0,
                handover INTEGER NOT NULL DEFAULT 0,
                notes TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (property_id) REFERENCES properties(id) ON DELETE RESTRICT,
                CHECK (amount_paid >= 0),
                CHECK (total_amount >= 0)
            );
            CREATE INDEX IF NOT EXISTS idx_purchases_user_id ON purchases(user_id);
            CREATE INDEX IF NOT EXISTS idx_purchases_property_id ON purchases(property_id);
            CREATE INDEX IF NOT EXISTS idx_purchases_status ON purchases(status);
        "#,
    },
    Migration {
        version: 6,
        name: "create_wishlist",
        up: r#"
            CREATE TABLE IF NOT EXISTS wishlist_items (
                user_id INTEGER NOT NULL,
                property_id INTEGER NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (user_id, property_id),
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (property_id) REFERENCES properties(id) ON DELETE CASCADE
            );
        "#,
    },
    Migration {
        version: 7,
        name: "create_inquiries",
        up: r#"
            CREATE TABLE IF NOT EXISTS inquiries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                property_id INTEGER,
                name VARCHAR(100) NOT NULL,
                email VARCHAR(255) NOT NULL,
                phone VARCHAR(32),
                message TEXT NOT NULL,
                status VARCHAR(20) NOT NULL DEFAULT 'new',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (property_id) REFERENCES properties(id) ON DELETE SET NULL
            );
            CREATE INDEX IF NOT EXISTS idx_inquiries_status ON inquiries(status);
        "#,
    },
    Migration {
        version: 8,
        name: "create_newsletter_subscribers",
        up: r#"
            CREATE TABLE IF NOT EXISTS newsletter_subscribers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email VARCHAR(255) NOT NULL UNIQUE,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                unsubscribed_at TIMESTAMP
            );
        "#,
    },
    Migration {
        version: 9,
        name: "create_password_reset_tokens",
        up: r#"
            CREATE TABLE IF NOT EXISTS password_reset_tokens (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                token_hash VARCHAR(64) NOT NULL UNIQUE,
                expires_at TIMESTAMP NOT NULL,
                used_at TIMESTAMP,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_password_reset_tokens_user_id ON password_reset_tokens(user_id);
        "#,
    },
];

/// Apply every migration not yet recorded; returns how many ran
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    ensure_tracking_table(pool).await?;
    let applied = applied_versions(pool).await?;

    let mut count = 0;
    for migration in MIGRATIONS {
        match applied.get(&migration.version) {
            Some(name) if name == migration.name => continue,
            Some(name) => bail!(
                "Migration {} is recorded as '{}' but the binary expects '{}'",
                migration.version,
                name,
                migration.name
            ),
            None => {}
        }

        tracing::info!(version = migration.version, name = migration.name, "Applying migration");
        apply(pool, migration)
            .await
            .with_context(|| format!("Migration {} ({}) failed", migration.version, migration.name))?;
        count += 1;
    }

    if count > 0 {
        tracing::info!(count, "Database schema updated");
    }
    Ok(count)
}

/// Migrations defined in the binary but not yet applied
pub async fn pending_count(pool: &DynDatabasePool) -> Result<usize> {
    ensure_tracking_table(pool).await?;
    let applied = applied_versions(pool).await?;
    Ok(MIGRATIONS
        .iter()
        .filter(|m| !applied.contains_key(&m.version))
        .count())
}

async fn ensure_tracking_table(pool: &DynDatabasePool) -> Result<()> {
    pool.execute(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TIMESTAMP NOT NULL
        )",
    )
    .await?;
    Ok(())
}

async fn applied_versions(pool: &DynDatabasePool) -> Result<HashMap<i64, String>> {
    let rows: Vec<(i64, String)> = sqlx::query_as("SELECT version, name FROM _migrations")
        .fetch_all(pool.sqlite())
        .await
        .context("Failed to read _migrations")?;
    Ok(rows.into_iter().collect())
}

async fn apply(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    let mut tx = pool.sqlite().begin().await?;

    for statement in statements(migration.up) {
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Statement failed: {}", preview(statement)))?;
    }

    sqlx::query("INSERT INTO _migrations (version, name, applied_at) VALUES (?, ?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Non-empty statements of a migration, with comment-only chunks dropped
fn statements(sql: &str) -> impl Iterator<Item = &str> {
    sql.split(';').map(str::trim).filter(|chunk| {
        chunk
            .lines()
            .map(str::trim)
            .any(|line| !line.is_empty() && !line.starts_with("--"))
    })
}

/// First line of a statement, for error messages
fn preview(statement: &str) -> &str {
    statement.lines().next().unwrap_or(statement).trim()
}
