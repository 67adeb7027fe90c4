//! Shared command setup: configuration, logging and the async runtime.

use std::path::{Path, PathBuf};

use terramesh::config::{config_file_path, ConfigFile};
use terramesh::logging::{init_logging, LoggingGuard};
use terramesh::provider::AsyncReqwestClient;
use tokio::runtime::Runtime;
use tracing::info;

use crate::error::CliError;

/// Everything a command needs before it can do real work.
pub struct CliRunner {
    config: ConfigFile,
    config_path: PathBuf,
    _logging: LoggingGuard,
}

impl CliRunner {
    /// Load the configuration and install logging.
    ///
    /// `--verbose` raises the level to `debug` unless `RUST_LOG` is set.
    pub fn new(config_path: Option<&Path>, verbose: bool) -> Result<Self, CliError> {
        let config_path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(config_file_path);
        let config = ConfigFile::load_from(&config_path)?;

        let level = if verbose {
            "debug"
        } else {
            config.logging.level.as_str()
        };
        let logging = init_logging(level, config.logging.directory.as_deref())?;

        Ok(Self {
            config,
            config_path,
            _logging: logging,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn log_startup(&self, command: &str) {
        info!(
            version = terramesh::VERSION,
            command,
            config = %self.config_path.display(),
            "terramesh starting"
        );
    }

    /// HTTP client honouring `[http] timeout_secs`.
    pub fn http_client(&self) -> Result<AsyncReqwestClient, CliError> {
        Ok(AsyncReqwestClient::with_timeout(self.config.http.timeout_secs)?)
    }

    pub fn runtime(&self) -> Result<Runtime, CliError> {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| CliError::Runtime(format!("Failed to start async runtime: {}", e)))
    }
}
