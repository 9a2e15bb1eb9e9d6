use std::path::Path;

use airbox_transfer::TransferConfig;
use httpmock::MockServer;

use crate::client::AppContext;

pub(crate) fn context_with(server: &MockServer, download_dir: &Path) -> AppContext {
    let config = TransferConfig {
        base_url: format!("{}/api", server.base_url()),
        download_dir: download_dir.to_path_buf(),
        upload_timeout_ms: 5_000,
        list_timeout_ms: 5_000,
        delete_timeout_ms: 5_000,
        download_timeout_ms: 5_000,
        ..TransferConfig::default()
    };
    AppContext::from_config(&config, Some("cli-test")).expect("context")
}
