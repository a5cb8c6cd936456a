//! CoinGecko market listing provider.
//!
//! Uses the free `/coins/markets` endpoint, which returns the top assets by
//! market cap together with their current price. No API key is required,
//! though rate limits apply.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::market_data::{FeedError, MarketAsset, MarketDataSource};

pub const COINGECKO_API_BASE: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko caps `per_page` at 250.
const MAX_PER_PAGE: u32 = 250;

/// One element of the `/coins/markets` response. Only the columns we keep
/// are declared; CoinGecko sends many more.
#[derive(Debug, Deserialize)]
struct CoinMarket {
    id: String,
    symbol: String,
    name: String,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    current_price: Option<Decimal>,
    #[serde(default)]
    market_cap: Option<Decimal>,
    #[serde(default)]
    market_cap_rank: Option<u32>,
    #[serde(default)]
    price_change_24h: Option<Decimal>,
    #[serde(default)]
    price_change_percentage_24h: Option<Decimal>,
}

impl CoinMarket {
    fn into_asset(self) -> Option<MarketAsset> {
        let Some(current_price) = self.current_price else {
            debug!(asset_id = %self.id, "dropping market entry without a current price");
            return None;
        };
        Some(MarketAsset {
            id: self.id,
            symbol: self.symbol,
            name: self.name,
            image: self.image.unwrap_or_default(),
            current_price,
            market_cap: self.market_cap,
            market_cap_rank: self.market_cap_rank,
            price_change_24h: self.price_change_24h,
            price_change_percentage_24h: self.price_change_percentage_24h,
        })
    }
}

/// CoinGecko market listing source.
pub struct CoinGeckoMarketSource {
    client: reqwest::Client,
    base_url: String,
    /// Quote currency for prices (e.g., "usd")
    quote_currency: String,
}

impl CoinGeckoMarketSource {
    /// Creates a provider quoting in USD.
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    /// Creates a provider with a custom reqwest client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: COINGECKO_API_BASE.to_string(),
            quote_currency: "usd".to_string(),
        }
    }

    /// Builds a client with a request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client))
    }

    /// Points the provider at another API root (mirrors, mock servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_quote_currency(mut self, currency: impl Into<String>) -> Self {
        self.quote_currency = currency.into().to_lowercase();
        self
    }

    pub fn quote_currency(&self) -> &str {
        &self.quote_currency
    }

    fn markets_url(&self, limit: u32) -> String {
        format!(
            "{}/coins/markets?vs_currency={}&order=market_cap_desc&per_page={}&page=1&sparkline=false&price_change_percentage=24h",
            self.base_url,
            self.quote_currency,
            limit.clamp(1, MAX_PER_PAGE)
        )
    }

    fn decode(&self, body: &str) -> Result<Vec<MarketAsset>, FeedError> {
        let markets: Vec<CoinMarket> =
            serde_json::from_str(body).map_err(|error| FeedError::Decode {
                source_name: self.name().to_string(),
                error,
            })?;
        Ok(markets
            .into_iter()
            .filter_map(CoinMarket::into_asset)
            .collect())
    }
}

impl Default for CoinGeckoMarketSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl MarketDataSource for CoinGeckoMarketSource {
    async fn fetch_markets(&self, limit: u32) -> Result<Vec<MarketAsset>, FeedError> {
        let url = self.markets_url(limit);
        debug!(url = %url, "fetching market listing");

        let request_error = |error| FeedError::Request {
            source_name: self.name().to_string(),
            error,
        };

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .header(
                "User-Agent",
                concat!("cryptofolio/", env!("CARGO_PKG_VERSION")),
            )
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::Status {
                source_name: self.name().to_string(),
                status,
                body,
            });
        }

        let body = response.text().await.map_err(request_error)?;
        self.decode(&body)
    }

    fn name(&self) -> &str {
        "coingecko"
    }
}
