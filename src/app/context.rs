use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::ResolvedConfig;
use crate::format::CurrencyStyle;
use crate::market_data::providers::CoinGeckoMarketSource;
use crate::market_data::{MarketDataService, MarketDataSource, NoopSource, PriceSnapshot};
use crate::models::{IdGenerator, UuidIdGenerator};
use crate::portfolio::TransactionStore;
use crate::storage::{JsonFileStorage, Storage, MARKET_SNAPSHOT_KEY};

/// A snapshot together with whether it came from the feed just now.
#[derive(Debug, Clone)]
pub struct MarketRead {
    pub snapshot: Arc<PriceSnapshot>,
    pub live: bool,
}

/// Everything a command needs: resolved config, storage, price feed.
pub struct AppContext {
    config: ResolvedConfig,
    storage: Arc<dyn Storage>,
    market: MarketDataService,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    style: CurrencyStyle,
}

impl AppContext {
    pub fn new(
        config: ResolvedConfig,
        storage: Arc<dyn Storage>,
        source: Arc<dyn MarketDataSource>,
    ) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let market = MarketDataService::new(source)
            .with_limit(config.market.per_page)
            .with_clock(clock.clone());
        let style = CurrencyStyle::from(&config.display);
        Self {
            config,
            storage,
            market,
            ids: Arc::new(UuidIdGenerator),
            clock,
            style,
        }
    }

    /// File-backed storage under the data directory and the configured
    /// CoinGecko feed, or no feed at all when `offline`.
    pub fn open(config: ResolvedConfig, offline: bool) -> Result<Self> {
        let storage: Arc<dyn Storage> = Arc::new(JsonFileStorage::new(&config.data_dir));
        let source: Arc<dyn MarketDataSource> = if offline {
            Arc::new(NoopSource)
        } else {
            Arc::new(
                CoinGeckoMarketSource::with_timeout(config.market.timeout())
                    .context("Failed to build HTTP client")?
                    .with_base_url(config.market.base_url.as_str())
                    .with_quote_currency(config.market.quote_currency.as_str()),
            )
        };
        Ok(Self::new(config, storage, source))
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.market = self.market.with_clock(clock.clone());
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    pub fn style(&self) -> &CurrencyStyle {
        &self.style
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub async fn open_store(&self) -> TransactionStore {
        TransactionStore::open(self.storage.clone())
            .await
            .with_id_generator(self.ids.clone())
    }

    /// Refresh from the feed, falling back to the cached snapshot when the
    /// feed is unreachable.
    pub async fn market_snapshot(&self) -> Result<MarketRead> {
        match self.market.refresh().await {
            Ok(snapshot) => {
                self.cache_snapshot(&snapshot).await;
                Ok(MarketRead {
                    snapshot,
                    live: true,
                })
            }
            Err(err) => {
                if let Some(cached) = self.cached_snapshot().await {
                    self.market.seed(cached);
                }
                match self.market.snapshot() {
                    Some(snapshot) => {
                        warn!(
                            fetched_at = %snapshot.fetched_at,
                            "using cached market snapshot"
                        );
                        Ok(MarketRead {
                            snapshot,
                            live: false,
                        })
                    }
                    None => Err(anyhow::Error::new(err)
                        .context("No market data: feed unavailable and nothing cached")),
                }
            }
        }
    }

    async fn cached_snapshot(&self) -> Option<PriceSnapshot> {
        let raw = match self.storage.get(MARKET_SNAPSHOT_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("no cached market snapshot");
                return None;
            }
            Err(err) => {
                warn!(error = %format!("{err:#}"), "failed to read cached market snapshot");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                warn!(error = %err, "ignoring corrupt cached market snapshot");
                None
            }
        }
    }

    async fn cache_snapshot(&self, snapshot: &PriceSnapshot) {
        let encoded = match serde_json::to_string(snapshot) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(error = %err, "failed to encode market snapshot");
                return;
            }
        };
        if let Err(err) = self.storage.set(MARKET_SNAPSHOT_KEY, &encoded).await {
            warn!(error = %format!("{err:#}"), "failed to cache market snapshot");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DisplayConfig, MarketConfig};
    use crate::market_data::MarketAsset;
    use crate::storage::MemoryStorage;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use std::path::PathBuf;

    fn config() -> ResolvedConfig {
        ResolvedConfig {
            config_path: PathBuf::from("/tmp/cryptofolio.toml"),
            data_dir: PathBuf::from("/tmp"),
            market: MarketConfig::default(),
            display: DisplayConfig::default(),
        }
    }

    #[tokio::test]
    async fn offline_falls_back_to_cached_snapshot() {
        let cached = PriceSnapshot::new(
            "coingecko",
            Utc::now(),
            vec![MarketAsset::new("bitcoin", "btc", "Bitcoin", Decimal::from(30000))],
        );
        let storage = Arc::new(MemoryStorage::with_entry(
            MARKET_SNAPSHOT_KEY,
            serde_json::to_string(&cached).unwrap(),
        ));
        let app = AppContext::new(config(), storage, Arc::new(NoopSource));

        let read = app.market_snapshot().await.unwrap();
        assert!(!read.live);
        assert_eq!(*read.snapshot, cached);
    }

    #[tokio::test]
    async fn offline_without_cache_is_an_error() {
        let app = AppContext::new(config(), Arc::new(MemoryStorage::new()), Arc::new(NoopSource));
        let err = app.market_snapshot().await.unwrap_err();
        assert!(err.to_string().contains("No market data"));
    }
}
