use super::MarketAsset;

/// Why a market listing could not be obtained. Always recoverable: callers
/// keep whatever snapshot they already had.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("{source_name} request failed: {error}")]
    Request {
        source_name: String,
        #[source]
        error: reqwest::Error,
    },
    #[error("{source_name} returned {status}: {body}")]
    Status {
        source_name: String,
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("{source_name} response could not be decoded: {error}")]
    Decode {
        source_name: String,
        #[source]
        error: serde_json::Error,
    },
    #[error("{0} is offline")]
    Offline(String),
}

/// A remote listing of the top-ranked assets with their current prices.
#[async_trait::async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch up to `limit` assets, highest market cap first.
    async fn fetch_markets(&self, limit: u32) -> Result<Vec<MarketAsset>, FeedError>;

    fn name(&self) -> &str;
}

/// Source used when network access is disabled. Every fetch fails with
/// [`FeedError::Offline`] so callers fall back to cached data.
pub struct NoopSource;

#[async_trait::async_trait]
impl MarketDataSource for NoopSource {
    async fn fetch_markets(&self, _limit: u32) -> Result<Vec<MarketAsset>, FeedError> {
        Err(FeedError::Offline(self.name().to_string()))
    }

    fn name(&self) -> &str {
        "noop"
    }
}
