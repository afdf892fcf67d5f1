//! Integration tests for Velluto Motors.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests (no external services)
//! cargo test -p velluto-integration-tests
//!
//! # Database-backed tests (require PostgreSQL and ADMIN_DATABASE_URL)
//! cargo test -p velluto-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `config_store_sync` - Store bootstrap, merge, and subscription behavior
//! - `maintenance_gates` - Typed-confirmation protocol over maintenance ops
//! - `editor_flow` - Working-copy editing, commits, and image attachment
//! - `pg_remote` - Postgres-backed remote store (ignored without a database)

use secrecy::SecretString;
use sqlx::PgPool;

/// Connect to the test database named by `ADMIN_DATABASE_URL` or `DATABASE_URL`.
///
/// # Errors
///
/// Returns an error when neither variable is set or the pool cannot connect.
pub async fn test_pool() -> Result<PgPool, Box<dyn std::error::Error>> {
    let database_url = std::env::var("ADMIN_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| "ADMIN_DATABASE_URL or DATABASE_URL must be set")?;

    let pool = velluto_cms::db::create_pool(&database_url).await?;
    velluto_cms::db::MIGRATOR.run(&pool).await?;
    Ok(pool)
}
