use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::market_data::providers::coingecko::COINGECKO_API_BASE;
use crate::market_data::DEFAULT_MARKET_LIMIT;

const CONFIG_FILE_NAME: &str = "cryptofolio.toml";

fn default_quote_currency() -> String {
    "usd".to_string()
}

fn default_currency_symbol() -> Option<String> {
    Some("$".to_string())
}

/// Price feed configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// CoinGecko-compatible API base URL.
    pub base_url: String,

    /// Currency every price is quoted in (e.g. "usd").
    #[serde(default = "default_quote_currency")]
    pub quote_currency: String,

    /// Number of top-ranked assets to fetch.
    pub per_page: u32,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            base_url: COINGECKO_API_BASE.to_string(),
            quote_currency: default_quote_currency(),
            per_page: DEFAULT_MARKET_LIMIT,
            timeout_secs: 15,
        }
    }
}

impl MarketConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Display/output formatting configuration.
///
/// Only affects the `*_display` strings; raw values are always emitted at
/// full precision.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Optional currency symbol (e.g. "$", "€") prefixed to money values.
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: Option<String>,

    /// When true, render money values with thousands separators.
    pub currency_grouping: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            currency_symbol: default_currency_symbol(),
            currency_grouping: true,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to data directory. If relative, resolved from config file location.
    /// If not specified, defaults to the config file's directory.
    pub data_dir: Option<PathBuf>,

    #[serde(default)]
    pub market: MarketConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load config from a file, or return default config if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// If `data_dir` is set and relative, it's resolved relative to `config_dir`.
    /// If `data_dir` is not set, returns `config_dir`.
    pub fn resolve_data_dir(&self, config_dir: &Path) -> PathBuf {
        match &self.data_dir {
            Some(data_dir) if data_dir.is_absolute() => data_dir.clone(),
            Some(data_dir) => config_dir.join(data_dir),
            None => config_dir.to_path_buf(),
        }
    }
}

/// Loaded configuration with resolved paths.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    pub config_path: PathBuf,
    pub data_dir: PathBuf,
    pub market: MarketConfig,
    pub display: DisplayConfig,
}

/// Returns the default config file path.
///
/// Resolution order:
/// 1. `./cryptofolio.toml` if it exists in current directory
/// 2. `<XDG data dir>/cryptofolio/cryptofolio.toml`
pub fn default_config_path() -> PathBuf {
    let local_config = PathBuf::from(CONFIG_FILE_NAME);
    if local_config.exists() {
        return local_config;
    }

    if let Some(data_dir) = dirs::data_dir() {
        return data_dir.join("cryptofolio").join(CONFIG_FILE_NAME);
    }

    local_config
}

impl ResolvedConfig {
    fn from_config(config: Config, config_path: PathBuf, config_dir: &Path) -> Self {
        Self {
            data_dir: config.resolve_data_dir(config_dir),
            config_path,
            market: config.market,
            display: config.display,
        }
    }

    /// Load and resolve config from a file path.
    ///
    /// The data directory is resolved relative to the config file's parent directory.
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_path = config_path
            .canonicalize()
            .with_context(|| format!("Config file not found: {}", config_path.display()))?;

        let config_dir = config_path
            .parent()
            .context("Config file has no parent directory")?
            .to_path_buf();

        let config = Config::load(&config_path)?;
        Ok(Self::from_config(config, config_path, &config_dir))
    }

    /// Load config, falling back to defaults if the file doesn't exist.
    ///
    /// A missing file still anchors the data directory at its intended
    /// parent directory.
    pub fn load_or_default(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            return Self::load(config_path);
        }

        let config_path = if config_path.is_relative() {
            std::env::current_dir()
                .context("Failed to get current directory")?
                .join(config_path)
        } else {
            config_path.to_path_buf()
        };

        let config_dir = config_path
            .parent()
            .context("Config path has no parent directory")?
            .to_path_buf();

        Ok(Self::from_config(Config::default(), config_path, &config_dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_default_data_dir_is_config_dir() {
        let config = Config::default();
        let config_dir = Path::new("/home/user/coins");
        assert_eq!(
            config.resolve_data_dir(config_dir),
            PathBuf::from("/home/user/coins")
        );
    }

    #[test]
    fn test_relative_and_absolute_data_dir() {
        let config_dir = Path::new("/home/user/coins");

        let relative = Config {
            data_dir: Some(PathBuf::from("data")),
            ..Default::default()
        };
        assert_eq!(
            relative.resolve_data_dir(config_dir),
            PathBuf::from("/home/user/coins/data")
        );

        let absolute = Config {
            data_dir: Some(PathBuf::from("/var/cryptofolio")),
            ..Default::default()
        };
        assert_eq!(
            absolute.resolve_data_dir(config_dir),
            PathBuf::from("/var/cryptofolio")
        );
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.market.base_url, COINGECKO_API_BASE);
        assert_eq!(config.market.quote_currency, "usd");
        assert_eq!(config.market.per_page, 50);
        assert_eq!(config.market.timeout(), Duration::from_secs(15));
        assert_eq!(config.display.currency_symbol.as_deref(), Some("$"));
        assert!(config.display.currency_grouping);
    }

    #[test]
    fn test_load_empty_config() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::File::create(&config_path)?;

        let config = Config::load(&config_path)?;
        assert_eq!(config.data_dir, None);
        assert_eq!(config.market.per_page, 50);

        Ok(())
    }

    #[test]
    fn test_load_market_config() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = std::fs::File::create(&config_path)?;
        writeln!(file, "[market]")?;
        writeln!(file, "base_url = \"http://127.0.0.1:9000/api/v3\"")?;
        writeln!(file, "quote_currency = \"eur\"")?;
        writeln!(file, "per_page = 10")?;

        let config = Config::load(&config_path)?;
        assert_eq!(config.market.base_url, "http://127.0.0.1:9000/api/v3");
        assert_eq!(config.market.quote_currency, "eur");
        assert_eq!(config.market.per_page, 10);
        assert_eq!(config.market.timeout_secs, 15);

        Ok(())
    }

    #[test]
    fn test_load_display_config() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = std::fs::File::create(&config_path)?;
        writeln!(file, "[display]")?;
        writeln!(file, "currency_symbol = \"€\"")?;
        writeln!(file, "currency_grouping = false")?;

        let config = Config::load(&config_path)?;
        assert_eq!(config.display.currency_symbol.as_deref(), Some("€"));
        assert!(!config.display.currency_grouping);

        Ok(())
    }

    #[test]
    fn test_invalid_config_is_an_error() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&config_path, "[market\nper_page = ")?;

        let err = Config::load(&config_path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));

        Ok(())
    }

    #[test]
    fn test_resolved_config_load_or_default_missing_file() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let resolved = ResolvedConfig::load_or_default(&config_path)?;
        assert_eq!(resolved.data_dir, dir.path());
        assert_eq!(resolved.market.quote_currency, "usd");

        Ok(())
    }

    #[test]
    fn test_resolved_config_resolves_relative_data_dir() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&config_path, "data_dir = \"./data\"\n")?;

        let resolved = ResolvedConfig::load(&config_path)?;
        assert_eq!(resolved.data_dir, dir.path().canonicalize()?.join("data"));

        Ok(())
    }
}
