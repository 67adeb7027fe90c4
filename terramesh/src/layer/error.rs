use thiserror::Error;

use crate::config::ConfigError;
use crate::provider::ProviderError;

/// Fatal layer errors, raised before any tile is requested.
///
/// Per-tile failures never surface here; they are logged and counted.
#[derive(Debug, Error)]
pub enum LayerError {
    #[error("Invalid layer configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid URL template: {0}")]
    Template(#[from] ProviderError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
