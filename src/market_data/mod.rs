mod models;
mod provider;
pub mod providers;
mod service;

pub use models::{MarketAsset, PriceSnapshot};
pub use provider::{FeedError, MarketDataSource, NoopSource};
pub use service::{MarketDataService, DEFAULT_MARKET_LIMIT};
