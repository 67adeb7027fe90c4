//! CLI error type.

use std::fmt;

use terramesh::config::ConfigError;
use terramesh::coord::CoordError;
use terramesh::layer::LayerError;
use terramesh::logging::LoggingError;
use terramesh::mesh::DecodeError;
use terramesh::provider::ProviderError;

/// Errors surfaced to the user. Each maps to a non-zero exit.
#[derive(Debug)]
pub enum CliError {
    /// Configuration file or argument problem
    Config(String),
    /// Invalid command-line argument
    InvalidArgument(String),
    /// Layer rejected the resolved props
    Layer(LayerError),
    /// HTTP client setup or fetch failure
    Provider(ProviderError),
    /// Mesh decode failure (single-tile commands only)
    Decode(DecodeError),
    /// Logging could not be initialized
    Logging(LoggingError),
    /// Async runtime could not be created
    Runtime(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::Layer(e) => write!(f, "{}", e),
            CliError::Provider(e) => write!(f, "{}", e),
            CliError::Decode(e) => write!(f, "{}", e),
            CliError::Logging(e) => write!(f, "{}", e),
            CliError::Runtime(msg) => write!(f, "Runtime error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<CoordError> for CliError {
    fn from(e: CoordError) -> Self {
        CliError::InvalidArgument(e.to_string())
    }
}

impl From<LayerError> for CliError {
    fn from(e: LayerError) -> Self {
        CliError::Layer(e)
    }
}

impl From<ProviderError> for CliError {
    fn from(e: ProviderError) -> Self {
        CliError::Provider(e)
    }
}

impl From<DecodeError> for CliError {
    fn from(e: DecodeError) -> Self {
        CliError::Decode(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Runtime(e.to_string())
    }
}
