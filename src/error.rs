//! Error types for the rotating-proxy-pool crate.
//!
//! Pool operations themselves never fail; these errors come from turning text into
//! proxy addresses and from loading proxy lists.

use std::path::PathBuf;
use thiserror::Error;

/// Error returned while parsing or loading proxy addresses.
#[derive(Debug, Error)]
pub enum ProxyPoolError {
    /// A line could not be parsed as a proxy URL.
    #[error("invalid proxy address {input:?}: {source}")]
    InvalidProxy {
        input: String,
        #[source]
        source: url::ParseError,
    },

    /// Fetching a proxy list over HTTP failed.
    #[error("failed to fetch proxy list: {0}")]
    Fetch(#[from] reqwest::Error),

    /// Reading a proxy list from disk failed.
    #[error("failed to read proxy list {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
