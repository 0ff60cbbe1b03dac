use thiserror::Error;

/// Transport-level failure for a single GET.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("HTTP {0}")]
    Status(u16),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Transport(err.to_string())
    }
}

/// Failures of the index/collector stages. Everything except `EmptyIndex`
/// aborts the run before any output is written.
#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("failed to fetch sitemap {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("failed to parse sitemap {url}: {message}")]
    Parse { url: String, message: String },
    #[error("no property sitemaps found in {index_url}")]
    EmptyIndex { index_url: String },
    #[error("invalid sitemap pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Per-listing failure; recorded and skipped, never propagated.
#[derive(Debug, Error)]
pub enum ListingError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("page returned HTTP {0} without a removed-listing marker")]
    Status(u16),
}
