//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! velluto-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `ADMIN_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

use tracing::info;

/// Run all pending database migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;

    info!("Running migrations...");
    velluto_cms::db::MIGRATOR.run(&pool).await?;
    info!("Migrations complete");

    Ok(())
}
