mod json_file;
mod memory;
pub mod records;

pub use json_file::JsonFileStorage;
pub use memory::MemoryStorage;

use anyhow::Result;

/// Key holding the ordered transaction list.
pub const TRANSACTIONS_KEY: &str = "cryptoTransactions";

/// Key holding the last market snapshot, for offline valuation.
pub const MARKET_SNAPSHOT_KEY: &str = "marketSnapshot";

/// Durable string key-value store.
///
/// The store knows nothing about the values it holds; decoding and
/// validation happen in the caller.
#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Returns true if the key existed.
    async fn remove(&self, key: &str) -> Result<bool>;
}

/// Returns true if `key` can be used as a single file name.
pub fn is_safe_key(key: &str) -> bool {
    if key.is_empty() || key == "." || key == ".." {
        return false;
    }
    !key.chars().any(|c| c == '/' || c == '\\' || c == '\0')
}
