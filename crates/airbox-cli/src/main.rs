//! `airbox` binary entrypoint.

#[tokio::main(flavor = "current_thread")]
async fn main() {
    std::process::exit(airbox_cli::run().await);
}
