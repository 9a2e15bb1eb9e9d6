//! Output renderers and formatting helpers for CLI commands.

use airbox_transfer::{BatchReport, EntryView, JobState, Preview, SavedFile, UploadJob};
use anyhow::anyhow;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

#[derive(Serialize)]
struct BatchOutput<'a> {
    jobs: &'a [UploadJob],
    report: &'a BatchReport,
}

pub(crate) fn render_batch(
    jobs: &[UploadJob],
    report: &BatchReport,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&BatchOutput { jobs, report }),
        OutputFormat::Table => {
            println!("{:<10} {:>10}  {:<32} DETAIL", "STATE", "SIZE", "NAME");
            for job in jobs {
                let (state, detail) = job_summary(job.state());
                println!(
                    "{:<10} {:>10}  {:<32} {}",
                    state,
                    format_bytes(job.size_bytes),
                    job.file_name,
                    detail
                );
            }
            println!(
                "{} succeeded, {} failed, {} timed out",
                report.succeeded, report.failed, report.timed_out
            );
            Ok(())
        }
    }
}

fn job_summary(state: &JobState) -> (&'static str, String) {
    match state {
        JobState::Pending => ("pending", String::new()),
        JobState::InProgress { percent } => ("uploading", percent.to_string()),
        JobState::Succeeded { message } => ("ok", message.clone()),
        JobState::Failed { failure } => ("failed", failure.message()),
    }
}

pub(crate) fn render_entries(entries: &[EntryView], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(entries),
        OutputFormat::Table => {
            if entries.is_empty() {
                println!("no files");
                return Ok(());
            }
            println!("{:<40} DOWNLOAD", "NAME");
            for entry in entries {
                println!("{:<40} {}", entry.name, entry.download_url);
            }
            Ok(())
        }
    }
}

pub(crate) fn render_saved(saved: &SavedFile, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(saved),
        OutputFormat::Table => {
            println!(
                "saved {} ({}) to {}",
                saved.name,
                format_bytes(saved.size_bytes),
                saved.path.display()
            );
            Ok(())
        }
    }
}

pub(crate) fn render_preview(preview: &Preview, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(preview),
        OutputFormat::Table => {
            println!("kind: {}", preview.kind.as_str());
            println!(
                "media type: {}",
                preview.media_type.as_deref().unwrap_or("unknown")
            );
            if let Some(text) = &preview.text {
                println!("---");
                println!("{text}");
            }
            Ok(())
        }
    }
}

pub(crate) fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes;
    let mut unit = 0;
    let mut remainder = 0;
    while value >= 1024 && unit < UNITS.len() - 1 {
        remainder = value % 1024;
        value /= 1024;
        unit += 1;
    }
    if unit == 0 {
        format!("{value} {}", UNITS[unit])
    } else {
        format!("{value}.{} {}", remainder * 10 / 1024, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airbox_transfer::{FailureKind, JobFailure};

    #[test]
    fn format_bytes_scales_units() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MiB");
    }

    #[test]
    fn job_summary_uses_failure_reason() {
        let (state, detail) = job_summary(&JobState::Failed {
            failure: JobFailure::Rejected {
                kind: FailureKind::Http { status: 500 },
                detail: "Internal Server Error".into(),
            },
        });
        assert_eq!(state, "failed");
        assert_eq!(detail, "Internal Server Error");

        let (state, detail) = job_summary(&JobState::Failed {
            failure: JobFailure::TimedOut,
        });
        assert_eq!(state, "failed");
        assert_eq!(detail, "upload timed out");
    }
}
