pub mod coingecko;

pub use coingecko::CoinGeckoMarketSource;
