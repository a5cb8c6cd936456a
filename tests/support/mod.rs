#![allow(dead_code)]

use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use cryptofolio::market_data::{FeedError, MarketAsset, MarketDataSource, PriceSnapshot};
use cryptofolio::models::{Id, Transaction};
use cryptofolio::storage::Storage;
use rust_decimal::Decimal;

pub fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn asset(id: &str, symbol: &str, price: &str) -> MarketAsset {
    let mut name = id.to_string();
    if let Some(first) = name.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    MarketAsset::new(id, symbol, name, d(price))
}

pub fn snapshot(assets: Vec<MarketAsset>) -> PriceSnapshot {
    PriceSnapshot::new("mock", Utc::now(), assets)
}

/// A stored purchase with a fixed date and no refresh timestamp.
pub fn tx(id: &str, asset_id: &str, quantity: &str, price: &str, current: &str) -> Transaction {
    Transaction {
        id: Id::from_string(id),
        asset_id: asset_id.to_string(),
        asset_symbol: asset_id.to_string(),
        asset_name: asset_id.to_string(),
        asset_image_ref: String::new(),
        quantity: d(quantity),
        purchase_unit_price: d(price),
        purchase_date: date("2024-01-01"),
        price_at_record_time: d(current),
        price_updated_at: None,
    }
}

/// Market source returning a configurable listing, or failing on demand.
#[derive(Default)]
pub struct MockMarketSource {
    assets: Mutex<Vec<MarketAsset>>,
    failing: Mutex<bool>,
    calls: AtomicUsize,
}

impl MockMarketSource {
    pub fn new(assets: Vec<MarketAsset>) -> Self {
        Self {
            assets: Mutex::new(assets),
            ..Default::default()
        }
    }

    pub fn set_assets(&self, assets: Vec<MarketAsset>) {
        *self.assets.lock().unwrap() = assets;
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataSource for MockMarketSource {
    async fn fetch_markets(&self, limit: u32) -> Result<Vec<MarketAsset>, FeedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if *self.failing.lock().unwrap() {
            return Err(FeedError::Offline(self.name().to_string()));
        }
        let assets = self.assets.lock().unwrap();
        Ok(assets.iter().take(limit as usize).cloned().collect())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Storage that can be read but rejects every write.
#[derive(Default)]
pub struct FailingStorage {
    contents: Option<String>,
}

impl FailingStorage {
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Some(contents.into()),
        }
    }
}

#[async_trait]
impl Storage for FailingStorage {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Ok(self.contents.clone())
    }

    async fn set(&self, key: &str, _value: &str) -> Result<()> {
        anyhow::bail!("disk full while writing {key}")
    }

    async fn remove(&self, _key: &str) -> Result<bool> {
        anyhow::bail!("storage is read-only")
    }
}

/// `/coins/markets` body for the given `(id, symbol, name, price)` rows.
pub fn coingecko_markets_body(rows: &[(&str, &str, &str, Option<f64>)]) -> String {
    let entries: Vec<serde_json::Value> = rows
        .iter()
        .enumerate()
        .map(|(i, (id, symbol, name, price))| {
            serde_json::json!({
                "id": id,
                "symbol": symbol,
                "name": name,
                "image": format!("https://assets.example/{id}.png"),
                "current_price": price,
                "market_cap": price.map(|p| p * 1_000_000.0),
                "market_cap_rank": i + 1,
                "price_change_24h": 1.5,
                "price_change_percentage_24h": -2.25,
                "total_volume": 123456
            })
        })
        .collect();
    serde_json::Value::Array(entries).to_string()
}
