//! Interactively run a gated bulk maintenance operation.
//!
//! Drives the same two-phase confirmation protocol as the admin API: a
//! yes/no acknowledgment of the warning, then the exact phrase typed back.
//! Anything other than an exact answer aborts without touching data.

use std::io::{BufRead, Write};
use std::sync::Arc;

use velluto_cms::{GateOutcome, GateState, PgMaintenance, PurgeKind, gate_for};

/// Run the confirmation flow for one purge kind.
///
/// # Errors
///
/// Returns an error for an unknown slug, unreadable input, or a failed
/// backend operation. Aborting the flow is not an error.
pub async fn run(kind: &str) -> Result<(), Box<dyn std::error::Error>> {
    let kind: PurgeKind = kind.parse()?;

    let pool = super::connect().await?;
    let ops = Arc::new(PgMaintenance::new(pool));
    let mut gate = gate_for(kind, ops);

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    let mut out = std::io::stdout();

    let prompt = gate.prompt().clone();
    writeln!(out, "{}", prompt.title)?;
    writeln!(out, "{}", prompt.warning_text)?;
    write!(out, "Proceed? [y/N] ")?;
    out.flush()?;

    let answer = lines.next().transpose()?.unwrap_or_default();
    if !answer.trim().eq_ignore_ascii_case("y") {
        gate.decline();
        writeln!(out, "Aborted; nothing was changed.")?;
        return Ok(());
    }
    gate.acknowledge();

    loop {
        write!(out, "Type {} to continue: ", prompt.required_phrase)?;
        out.flush()?;

        let Some(typed) = lines.next().transpose()? else {
            gate.decline();
            writeln!(out, "Aborted; nothing was changed.")?;
            return Ok(());
        };

        match gate.confirm(&typed).await {
            GateOutcome::Completed => {
                writeln!(out, "{} complete.", prompt.title)?;
                return Ok(());
            }
            GateOutcome::ActionFailed(failure) => {
                return Err(failure.into());
            }
            GateOutcome::Mismatch => {
                if let Some(message) = gate.validation_message() {
                    writeln!(out, "{message}")?;
                }
            }
            GateOutcome::NotAwaitingConfirmation => {
                debug_assert_eq!(gate.state(), GateState::Idle);
                writeln!(out, "Aborted; nothing was changed.")?;
                return Ok(());
            }
        }
    }
}
