//! Outbound HTTP for fetching remote sources, guarded against requests to
//! internal destinations.

mod egress;
mod remote_fetcher;

pub use egress::{is_restricted, EgressPolicy};
pub use remote_fetcher::{FetchedObject, RemoteFetcher};

/// Errors from fetching a remote source
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Invalid source URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Unsupported URL scheme '{scheme}'")]
    UnsupportedScheme { scheme: String },

    #[error("Destination not permitted by egress policy: {host}")]
    BlockedDestination { host: String },

    #[error("Remote source returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
}
