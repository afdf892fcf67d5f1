//! CLI command implementations.

pub mod migrate;
pub mod purge;
pub mod seed;
pub mod show;

use secrecy::SecretString;
use sqlx::PgPool;

/// Connect to the admin database using `ADMIN_DATABASE_URL` or `DATABASE_URL`.
pub async fn connect() -> Result<PgPool, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("ADMIN_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| "ADMIN_DATABASE_URL or DATABASE_URL must be set")?;

    let pool = velluto_cms::db::create_pool(&database_url).await?;
    Ok(pool)
}
