use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One ranked entry of the market listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketAsset {
    /// Feed-specific asset id (e.g. `bitcoin`); the grouping key for holdings.
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub image: String,
    pub current_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap_rank: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_change_24h: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_change_percentage_24h: Option<Decimal>,
}

impl MarketAsset {
    /// Minimal entry with only the fields the portfolio needs.
    pub fn new(
        id: impl Into<String>,
        symbol: impl Into<String>,
        name: impl Into<String>,
        current_price: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            name: name.into(),
            image: String::new(),
            current_price,
            market_cap: None,
            market_cap_rank: None,
            price_change_24h: None,
            price_change_percentage_24h: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }
}

/// Point-in-time read of current market prices, in feed rank order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSnapshot {
    pub fetched_at: DateTime<Utc>,
    pub source: String,
    pub assets: Vec<MarketAsset>,
}

impl PriceSnapshot {
    pub fn new(source: impl Into<String>, fetched_at: DateTime<Utc>, assets: Vec<MarketAsset>) -> Self {
        Self {
            fetched_at,
            source: source.into(),
            assets,
        }
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Exact-match lookup by asset id.
    pub fn get(&self, asset_id: &str) -> Option<&MarketAsset> {
        self.assets.iter().find(|asset| asset.id == asset_id)
    }

    pub fn price_of(&self, asset_id: &str) -> Option<Decimal> {
        self.get(asset_id).map(|asset| asset.current_price)
    }

    /// Asset id to current price, for bulk refreshes.
    pub fn price_index(&self) -> HashMap<&str, Decimal> {
        self.assets
            .iter()
            .map(|asset| (asset.id.as_str(), asset.current_price))
            .collect()
    }

    /// Case-insensitive substring match on name or symbol. A blank query
    /// returns every asset.
    pub fn search(&self, query: &str) -> Vec<&MarketAsset> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.assets.iter().collect();
        }
        self.assets
            .iter()
            .filter(|asset| {
                asset.name.to_lowercase().contains(&needle)
                    || asset.symbol.to_lowercase().contains(&needle)
            })
            .collect()
    }
}
