//! Raster byte provider abstraction
//!
//! This module provides the byte-fetch capability the pipeline consumes for
//! elevation and texture rasters, plus the URL templates that address them.
//!
//! ```ignore
//! use terramesh::provider::{AsyncHttpClient, AsyncReqwestClient, UrlTemplate};
//!
//! let client = AsyncReqwestClient::new()?;
//! let template = UrlTemplate::new("https://tiles.example.com/{z}/{x}/{y}.png")?;
//! let bytes = client.get(&template.url_for(&tile)).await?;
//! ```

mod http;
mod template;
mod types;

pub use http::{AsyncHttpClient, AsyncReqwestClient, DEFAULT_TIMEOUT_SECS};
pub use template::{UrlTemplate, TEMPLATE_SEPARATOR};
pub use types::ProviderError;

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;
