use airbox_transfer::{FilePayload, PreviewKind, preview};

use crate::cli::{OutputFormat, PreviewArgs};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::render_preview;

pub(crate) async fn handle_preview(
    ctx: &AppContext,
    args: PreviewArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let payload = FilePayload::from_path(&args.file).await?;
    let preview = preview::detect(&payload);
    let (message, severity) = preview.notification();
    ctx.notifier.notify(message, severity);

    if preview.kind == PreviewKind::Unsupported {
        return Err(CliError::validation(format!(
            "cannot preview {}: unsupported file type",
            payload.name
        )));
    }
    render_preview(&preview, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::context_with;
    use httpmock::MockServer;

    #[tokio::test]
    async fn text_files_render() {
        let server = MockServer::start_async().await;
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, "hello").expect("write");

        handle_preview(
            &context_with(&server, dir.path()),
            PreviewArgs { file },
            OutputFormat::Table,
        )
        .await
        .expect("text preview");
    }

    #[tokio::test]
    async fn unsupported_files_are_rejected() {
        let server = MockServer::start_async().await;
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("blob.xyz");
        std::fs::write(&file, [1_u8, 2, 3]).expect("write");

        let err = handle_preview(
            &context_with(&server, dir.path()),
            PreviewArgs { file },
            OutputFormat::Json,
        )
        .await
        .expect_err("unsupported");
        assert_eq!(err.exit_code(), 2);
        assert_eq!(
            err.display_message(),
            "cannot preview blob.xyz: unsupported file type"
        );
    }
}
