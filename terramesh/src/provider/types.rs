//! Provider error types.

use thiserror::Error;

/// Errors raised while fetching raster bytes.
///
/// Texture fetches that fail with any of these are swallowed by the loader;
/// elevation fetches surface them inside [`crate::mesh::DecodeError::Fetch`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Transport-level failure (connection, TLS, body read).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// URL template could not be used.
    #[error("Invalid URL template: {0}")]
    InvalidTemplate(String),
}
