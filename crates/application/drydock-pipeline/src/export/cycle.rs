use camino::Utf8Path;
use drydock_core::{mirror, DesignFile};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::export::remote::DataService;
use crate::export::{ExportError, ExportOptions, ItemOutcome};
use crate::io_utils;

/// Open → export → close for one design file.
///
/// Open, activate, and export failures are contained here: they are logged
/// and become [`ItemOutcome::Failed`] so the surrounding walk moves on to
/// the next item. Directory-creation failures propagate instead; there is
/// no mirrored destination left to continue with.
///
/// Once a handle exists there is no early return until the close attempt
/// has run, and a close failure is caught separately so it can never mask
/// the export outcome.
pub(crate) async fn process_file(
    service: &dyn DataService,
    file: &DesignFile,
    export_dir: &Utf8Path,
    options: &ExportOptions,
) -> Result<ItemOutcome, ExportError> {
    let format = options.format_tag();
    if !file.extension.eq_ignore_ascii_case(format) {
        debug!(file = %file.name, extension = %file.extension, "not an exportable format, ignoring");
        return Ok(ItemOutcome::Filtered);
    }

    let target = mirror::export_file_path(export_dir, &file.name, format);

    if options.skip_existing && io_utils::has_nonzero_size(&target) {
        info!(path = %target, "already exported, skipping");
        return Ok(ItemOutcome::Skipped);
    }

    io_utils::ensure_dir(export_dir)?;

    info!(file = %file.name, "opening");
    let handle = match service.open(file).await {
        Ok(handle) => handle,
        Err(e) => {
            error!(file = %file.name, error = %e, "open failed");
            return Ok(ItemOutcome::Failed);
        }
    };

    // The service binds the opened document to its active session
    // asynchronously; exporting too early can hit a stale session.
    sleep(options.stabilization_delay).await;

    let exported = match service.activate(&handle).await {
        Ok(()) => {
            sleep(options.stabilization_delay).await;
            service.export(&handle, &target, format).await
        }
        Err(e) => Err(e),
    };

    match &exported {
        Ok(outcome) => info!(path = %target, bytes = outcome.bytes_written, "exported"),
        Err(e) => error!(file = %file.name, error = %e, "export failed"),
    }

    match service.close(handle, false).await {
        Ok(()) => debug!(file = %file.name, "closed"),
        Err(e) => warn!(file = %file.name, error = %e, "could not close"),
    }
    // Let the service settle before the next open.
    sleep(options.stabilization_delay).await;

    Ok(match exported {
        Ok(outcome) => ItemOutcome::Exported {
            bytes: outcome.bytes_written,
        },
        Err(_) => ItemOutcome::Failed,
    })
}
