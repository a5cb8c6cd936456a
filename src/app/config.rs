use std::path::Path;

use crate::config::ResolvedConfig;

pub fn config_output(config_path: &Path, config: &ResolvedConfig) -> serde_json::Value {
    serde_json::json!({
        "config_file": config_path.display().to_string(),
        "data_directory": config.data_dir.display().to_string(),
        "market": {
            "base_url": config.market.base_url,
            "quote_currency": config.market.quote_currency,
            "per_page": config.market.per_page,
            "timeout_secs": config.market.timeout_secs
        },
        "display": {
            "currency_symbol": config.display.currency_symbol,
            "currency_grouping": config.display.currency_grouping
        }
    })
}
