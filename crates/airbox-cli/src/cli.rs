//! Argument parsing and command dispatch.

use std::path::PathBuf;

use airbox_telemetry::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, command_span, init_logging};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::Instrument;
use uuid::Uuid;

use crate::client::{AppContext, CliResult, resolve_config};
use crate::commands::files::{handle_get, handle_list, handle_remove};
use crate::commands::preview::handle_preview;
use crate::commands::upload::handle_upload;

/// Parses CLI arguments, installs logging, and executes the requested
/// command. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let logging = LoggingConfig {
        level: &cli.log_level,
        format: cli.log_format.unwrap_or_else(LogFormat::infer),
        build_sha: option_env!("AIRBOX_BUILD_SHA").unwrap_or("dev"),
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: {err:#}");
    }

    let request_id = Uuid::new_v4().to_string();
    run_with(cli, &request_id).await
}

pub(crate) async fn run_with(cli: Cli, request_id: &str) -> i32 {
    let span = command_span(command_label(&cli.command), request_id);
    match execute(cli, request_id).instrument(span.clone()).await {
        Ok(()) => {
            span.in_scope(|| tracing::debug!("command succeeded"));
            0
        }
        Err(err) => {
            let message = err.display_message();
            span.in_scope(|| tracing::debug!(error = %message, "command failed"));
            eprintln!("error: {message}");
            err.exit_code()
        }
    }
}

async fn execute(cli: Cli, request_id: &str) -> CliResult<()> {
    let mut config = resolve_config(&cli)?;
    if let Command::Get(args) = &cli.command
        && let Some(dir) = &args.dir
    {
        config.download_dir.clone_from(dir);
    }
    let ctx = AppContext::from_config(&config, Some(request_id))?;

    match cli.command {
        Command::Upload(args) => handle_upload(&ctx, args, cli.output).await,
        Command::Ls => handle_list(&ctx, cli.output).await,
        Command::Rm(args) => handle_remove(&ctx, args).await,
        Command::Get(args) => handle_get(&ctx, args, cli.output).await,
        Command::Preview(args) => handle_preview(&ctx, args, cli.output).await,
    }
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Upload(_) => "upload",
        Command::Ls => "ls",
        Command::Rm(_) => "rm",
        Command::Get(_) => "get",
        Command::Preview(_) => "preview",
    }
}

fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    value.parse().map_err(|err| format!("{err:#}"))
}

#[derive(Parser)]
#[command(
    name = "airbox",
    version,
    about = "Upload, list, delete, and download files on an airbox server"
)]
pub(crate) struct Cli {
    /// Service base URL (defaults to http://127.0.0.1:5500/api).
    #[arg(long, global = true, env = "AIRBOX_API_URL")]
    pub(crate) api_url: Option<String>,
    /// JSON configuration file; flags override its values.
    #[arg(long, global = true, env = "AIRBOX_CONFIG")]
    pub(crate) config: Option<PathBuf>,
    /// Upload deadline in milliseconds.
    #[arg(long, global = true, env = "AIRBOX_UPLOAD_TIMEOUT_MS")]
    pub(crate) upload_timeout_ms: Option<u64>,
    /// Listing deadline in milliseconds.
    #[arg(long, global = true, env = "AIRBOX_LIST_TIMEOUT_MS")]
    pub(crate) list_timeout_ms: Option<u64>,
    /// Delete deadline in milliseconds.
    #[arg(long, global = true, env = "AIRBOX_DELETE_TIMEOUT_MS")]
    pub(crate) delete_timeout_ms: Option<u64>,
    /// Download deadline in milliseconds.
    #[arg(long, global = true, env = "AIRBOX_DOWNLOAD_TIMEOUT_MS")]
    pub(crate) download_timeout_ms: Option<u64>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    /// Log level or filter directive; `RUST_LOG` takes precedence.
    #[arg(long, global = true, env = "AIRBOX_LOG", default_value = DEFAULT_LOG_LEVEL)]
    pub(crate) log_level: String,
    /// Log output format (`pretty` or `json`).
    #[arg(long, global = true, value_parser = parse_log_format)]
    pub(crate) log_format: Option<LogFormat>,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Upload one or more files.
    Upload(UploadArgs),
    /// List remote files.
    Ls,
    /// Delete a remote file after confirmation.
    Rm(RemoveArgs),
    /// Download a remote file.
    Get(GetArgs),
    /// Classify a local file the way the upload form previews it.
    Preview(PreviewArgs),
}

#[derive(Args)]
pub(crate) struct UploadArgs {
    /// Files to upload, in order.
    #[arg(required = true)]
    pub(crate) files: Vec<PathBuf>,
    /// Upload a single file under this base name; the extension is kept.
    #[arg(long)]
    pub(crate) name: Option<String>,
}

#[derive(Args)]
pub(crate) struct RemoveArgs {
    /// Remote file name.
    pub(crate) name: String,
    /// Skip the confirmation prompt.
    #[arg(long, short = 'y')]
    pub(crate) yes: bool,
}

#[derive(Args)]
pub(crate) struct GetArgs {
    /// Remote file name.
    pub(crate) name: String,
    /// Directory to save into (defaults to the configured download directory).
    #[arg(long)]
    pub(crate) dir: Option<PathBuf>,
}

#[derive(Args)]
pub(crate) struct PreviewArgs {
    /// Local file to classify.
    pub(crate) file: PathBuf,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Table,
    Json,
}
