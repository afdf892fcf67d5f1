//! Database pool and migrations.

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

/// Embedded migrations for the marketplace collections and the
/// site-config document row.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Create the connection pool.
///
/// # Errors
///
/// Returns `sqlx::Error` if the database cannot be reached.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url.expose_secret())
        .await
}
