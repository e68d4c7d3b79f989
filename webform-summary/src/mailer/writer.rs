//! Writing one export file per (webform, recipient) pair

use std::path::PathBuf;
use std::sync::Arc;

use tokio::{fs, task};
use tracing::warn;

use super::batch::FileEntry;
use super::report::{Outcome, OutcomeKind, RunReport};
use crate::export::{ExportOptions, SubmissionExporter};
use crate::model::{Submission, Webform};

/// Run the exporter on the blocking pool
async fn run_exporter(
    exporter: &Arc<dyn SubmissionExporter>,
    webform: &Webform,
    submissions: &Arc<[Submission]>,
    options: &ExportOptions,
) -> Result<PathBuf, String> {
    let exporter = Arc::clone(exporter);
    let webform = webform.clone();
    let submissions = Arc::clone(submissions);
    let options = options.clone();

    task::spawn_blocking(move || exporter.export(&webform, &submissions, &options))
        .await
        .map_err(|e| e.to_string())?
        .map_err(|e| e.to_string())
}

/// Export `submissions` and move the file to its per-recipient name
///
/// The exporter always writes `<webform>.csv`; the rename keeps exports of the same
/// webform for different recipients apart. Returns `None`, with an outcome recorded, when
/// no file could be produced. Whatever the exporter left behind is removed in that case.
pub(super) async fn write_file(
    exporter: &Arc<dyn SubmissionExporter>,
    webform: &Webform,
    submissions: &Arc<[Submission]>,
    options: &ExportOptions,
    recipient: &str,
    report: &mut RunReport,
) -> Option<FileEntry> {
    let written = match run_exporter(exporter, webform, submissions, options).await {
        Ok(path) => path,
        Err(reason) => {
            warn!(
                webform = %webform.id,
                recipient = %recipient,
                error = %reason,
                "Export failed"
            );
            let _ = fs::remove_file(options.temp_path(&webform.id)).await;
            report.push(Outcome::file(
                &webform.id,
                recipient,
                OutcomeKind::ExportFailed { reason },
            ));
            return None;
        }
    };

    if !fs::try_exists(&written).await.unwrap_or(false) {
        warn!(
            webform = %webform.id,
            recipient = %recipient,
            path = %written.display(),
            "Export file not found"
        );
        report.push(Outcome::file(&webform.id, recipient, OutcomeKind::ExportMissing));
        return None;
    }

    let target = options.recipient_path(&webform.id, recipient);
    if let Err(e) = fs::rename(&written, &target).await {
        warn!(
            webform = %webform.id,
            recipient = %recipient,
            error = %e,
            "Could not move export to its recipient file"
        );
        let _ = fs::remove_file(&written).await;
        report.push(Outcome::file(
            &webform.id,
            recipient,
            OutcomeKind::ExportFailed {
                reason: e.to_string(),
            },
        ));
        return None;
    }

    Some(FileEntry::new(
        webform.id.clone(),
        target,
        ExportOptions::file_name(&webform.id),
    ))
}
