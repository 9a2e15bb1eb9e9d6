use std::sync::Arc;

use airbox_transfer::{FilePayload, SelectedFile, UploadCoordinator, UploadJob};
use anyhow::anyhow;

use crate::cli::{OutputFormat, UploadArgs};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::render_batch;
use crate::terminal::TerminalPresenter;

pub(crate) async fn handle_upload(
    ctx: &AppContext,
    args: UploadArgs,
    format: OutputFormat,
) -> CliResult<()> {
    if args.name.is_some() && args.files.len() > 1 {
        return Err(CliError::validation(
            "--name can only be used when uploading a single file",
        ));
    }

    let mut selection = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let file = SelectedFile::new(FilePayload::from_path(path).await?);
        selection.push(match &args.name {
            Some(base) => file.with_override(base.clone()),
            None => file,
        });
    }

    let mut coordinator = UploadCoordinator::new(
        Arc::clone(&ctx.transfer),
        Arc::clone(&ctx.notifier),
        Arc::new(TerminalPresenter),
        ctx.timeouts.upload,
    );
    coordinator.select(selection)?;
    let report = coordinator.run_batch().await?;

    let jobs: Vec<UploadJob> = coordinator.jobs().cloned().collect();
    render_batch(&jobs, &report, format)?;

    if report.all_succeeded() {
        Ok(())
    } else {
        Err(CliError::failure(anyhow!(
            "{} of {} uploads did not succeed",
            report.failed + report.timed_out,
            report.total()
        )))
    }
}
