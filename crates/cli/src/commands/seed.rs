//! Seed the remote store with the default site configuration.
//!
//! Without `--force` this refuses to touch an existing document, mirroring
//! the store's own bootstrap behavior (first writer wins).

use serde_json::Value;
use tracing::info;

use velluto_core::SiteConfiguration;

/// Write the default document into the `site_config` row.
///
/// # Errors
///
/// Returns an error if the database is unreachable, or if a document
/// already exists and `force` is false.
pub async fn run(force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;

    let doc = serde_json::to_value(SiteConfiguration::default())?;

    let result = if force {
        sqlx::query(
            "INSERT INTO site_config (id, doc, updated_at) VALUES (1, $1, now())
             ON CONFLICT (id) DO UPDATE SET doc = EXCLUDED.doc, updated_at = now()",
        )
        .bind(&doc)
        .execute(&pool)
        .await?
    } else {
        sqlx::query(
            "INSERT INTO site_config (id, doc, updated_at) VALUES (1, $1, now())
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(&doc)
        .execute(&pool)
        .await?
    };

    if result.rows_affected() == 0 {
        return Err("site configuration already exists; pass --force to overwrite".into());
    }

    info!("Seeded default site configuration");
    print_summary(&doc);
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_summary(doc: &Value) {
    if let Some(name) = doc.get("siteName").and_then(Value::as_str) {
        println!("Seeded site configuration for {name}");
    }
}
