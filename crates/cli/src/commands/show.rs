//! Print the current site configuration document.

use serde_json::Value;

/// Fetch and pretty-print the stored document, or report its absence.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
#[allow(clippy::print_stdout)]
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;

    let row: Option<(Value,)> = sqlx::query_as("SELECT doc FROM site_config WHERE id = 1")
        .fetch_optional(&pool)
        .await?;

    match row {
        Some((doc,)) => println!("{}", serde_json::to_string_pretty(&doc)?),
        None => println!("No site configuration stored; run `velluto-cli seed` first."),
    }

    Ok(())
}
