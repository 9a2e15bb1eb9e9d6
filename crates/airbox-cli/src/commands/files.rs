use std::sync::Arc;

use airbox_transfer::{
    AssumeYes, ConfirmationPrompt, DeleteResult, FileName, FileRegistryView, TransferOutcome,
};
use anyhow::anyhow;

use crate::cli::{GetArgs, OutputFormat, RemoveArgs};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{render_entries, render_saved};
use crate::terminal::StdinPrompt;

fn registry(ctx: &AppContext, prompt: Arc<dyn ConfirmationPrompt>) -> FileRegistryView {
    FileRegistryView::new(
        Arc::clone(&ctx.transfer),
        Arc::clone(&ctx.notifier),
        prompt,
        ctx.timeouts,
        ctx.base_url.clone(),
    )
}

fn unsuccessful<T>(action: &str, outcome: &TransferOutcome<T>) -> CliError {
    match outcome {
        TransferOutcome::TimedOut => CliError::failure(anyhow!("{action} timed out")),
        TransferOutcome::Failure(failure) => {
            CliError::failure(anyhow!("{action} failed: {}", failure.detail))
        }
        TransferOutcome::Success(_) => CliError::failure(anyhow!("{action} failed")),
    }
}

pub(crate) async fn handle_list(ctx: &AppContext, format: OutputFormat) -> CliResult<()> {
    let mut registry = registry(ctx, Arc::new(AssumeYes));
    let outcome = registry.refresh().await;
    if !outcome.is_success() {
        return Err(unsuccessful("listing files", &outcome));
    }
    render_entries(&registry.entry_views(), format)
}

pub(crate) async fn handle_remove(ctx: &AppContext, args: RemoveArgs) -> CliResult<()> {
    let name = FileName::new(args.name)?;
    let prompt: Arc<dyn ConfirmationPrompt> = if args.yes {
        Arc::new(AssumeYes)
    } else {
        Arc::new(StdinPrompt)
    };

    match registry(ctx, prompt).request_delete(&name).await {
        DeleteResult::Declined => {
            eprintln!("delete of '{name}' cancelled");
            Ok(())
        }
        DeleteResult::Completed(TransferOutcome::Success(_)) => Ok(()),
        DeleteResult::Completed(outcome) => Err(unsuccessful("deleting file", &outcome)),
    }
}

pub(crate) async fn handle_get(
    ctx: &AppContext,
    args: GetArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let name = FileName::new(args.name)?;
    match registry(ctx, Arc::new(AssumeYes))
        .request_download(&name)
        .await
    {
        TransferOutcome::Success(saved) => render_saved(&saved, format),
        outcome => Err(unsuccessful("downloading file", &outcome)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::context_with;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn list_renders_entries() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/files")
                .header("x-request-id", "cli-test");
            then.status(200).json_body(json!(["a.txt", "b.txt"]));
        });
        let dir = tempfile::tempdir().expect("tempdir");

        handle_list(&context_with(&server, dir.path()), OutputFormat::Table)
            .await
            .expect("list should succeed");
        mock.assert();
    }

    #[tokio::test]
    async fn list_failure_is_operational() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/files");
            then.status(500);
        });
        let dir = tempfile::tempdir().expect("tempdir");

        let err = handle_list(&context_with(&server, dir.path()), OutputFormat::Json)
            .await
            .expect_err("server error");
        assert_eq!(err.exit_code(), 3);
        assert_eq!(
            err.display_message(),
            "listing files failed: Internal Server Error"
        );
    }

    #[tokio::test]
    async fn confirmed_remove_issues_delete() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(DELETE).path("/api/delete/a.txt");
            then.status(200).json_body(json!({"message": "deleted"}));
        });
        let dir = tempfile::tempdir().expect("tempdir");
        let args = RemoveArgs {
            name: "a.txt".into(),
            yes: true,
        };

        handle_remove(&context_with(&server, dir.path()), args)
            .await
            .expect("delete should succeed");
        mock.assert();
    }

    #[tokio::test]
    async fn failed_remove_is_operational() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(DELETE).path("/api/delete/a.txt");
            then.status(404);
        });
        let dir = tempfile::tempdir().expect("tempdir");
        let args = RemoveArgs {
            name: "a.txt".into(),
            yes: true,
        };

        let err = handle_remove(&context_with(&server, dir.path()), args)
            .await
            .expect_err("not found");
        assert_eq!(err.exit_code(), 3);
    }

    #[tokio::test]
    async fn get_saves_into_download_dir() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/download/notes.txt");
            then.status(200).body("remember the milk");
        });
        let dir = tempfile::tempdir().expect("tempdir");
        let args = GetArgs {
            name: "notes.txt".into(),
            dir: None,
        };

        handle_get(&context_with(&server, dir.path()), args, OutputFormat::Table)
            .await
            .expect("download should succeed");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("notes.txt")).expect("saved file"),
            "remember the milk"
        );
    }

    #[tokio::test]
    async fn blank_name_is_a_validation_error() {
        let server = MockServer::start_async().await;
        let dir = tempfile::tempdir().expect("tempdir");
        let args = GetArgs {
            name: "  ".into(),
            dir: None,
        };

        let err = handle_get(&context_with(&server, dir.path()), args, OutputFormat::Table)
            .await
            .expect_err("blank name");
        assert_eq!(err.exit_code(), 2);
    }
}
