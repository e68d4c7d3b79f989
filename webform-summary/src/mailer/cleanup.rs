//! Removing the temporary files of a run

use std::io::ErrorKind;

use tokio::fs;
use tracing::{debug, warn};

use super::batch::RecipientBatch;
use super::report::{Outcome, OutcomeKind};

/// Delete every file of `batch`
///
/// Files that are already gone are ignored, so cleaning up the same batch twice is safe.
/// Other failures are logged and returned as outcomes; none of them is fatal.
pub async fn cleanup(batch: &RecipientBatch) -> Vec<Outcome> {
    let mut outcomes = Vec::new();
    for (recipient, files) in batch.iter() {
        for entry in files {
            match fs::remove_file(&entry.path).await {
                Ok(()) => debug!(path = %entry.path.display(), "Removed export"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %entry.path.display(), error = %e, "Could not remove export");
                    outcomes.push(Outcome::file(
                        &entry.webform,
                        recipient,
                        OutcomeKind::CleanupFailed {
                            reason: e.to_string(),
                        },
                    ));
                }
            }
        }
    }
    outcomes
}
