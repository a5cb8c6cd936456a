use rust_decimal::Decimal;
use serde::Serialize;

use crate::format::{format_percent, format_quantity, CurrencyStyle};
use crate::market_data::{MarketAsset, PriceSnapshot};
use crate::models::Transaction;
use crate::portfolio::{value_transaction, Holding, PortfolioSummary};

/// Canonical numeric string: full precision, no trailing zeros.
pub(crate) fn raw(value: Decimal) -> String {
    value.normalize().to_string()
}

/// JSON output for one market listing entry
#[derive(Debug, Serialize)]
pub struct MarketAssetOutput {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub image: String,
    pub current_price: String,
    pub current_price_display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap_display: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap_rank: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_change_percentage_24h: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_change_percentage_24h_display: Option<String>,
}

impl MarketAssetOutput {
    pub fn new(asset: &MarketAsset, style: &CurrencyStyle) -> Self {
        Self {
            id: asset.id.clone(),
            symbol: asset.symbol.to_uppercase(),
            name: asset.name.clone(),
            image: asset.image.clone(),
            current_price: raw(asset.current_price),
            current_price_display: style.currency(asset.current_price),
            market_cap: asset.market_cap.map(raw),
            market_cap_display: asset.market_cap.map(|cap| style.market_cap(cap)),
            market_cap_rank: asset.market_cap_rank,
            price_change_percentage_24h: asset.price_change_percentage_24h.map(raw),
            price_change_percentage_24h_display: asset
                .price_change_percentage_24h
                .map(format_percent),
        }
    }
}

/// Where the prices behind an output came from.
#[derive(Debug, Serialize)]
pub struct SnapshotInfo {
    pub source: String,
    pub fetched_at: String,
    /// False when the feed was unreachable and a cached snapshot was used.
    pub live: bool,
}

impl SnapshotInfo {
    pub fn new(snapshot: &PriceSnapshot, live: bool) -> Self {
        Self {
            source: snapshot.source.clone(),
            fetched_at: snapshot.fetched_at.to_rfc3339(),
            live,
        }
    }
}

/// JSON output for `market`
#[derive(Debug, Serialize)]
pub struct MarketOutput {
    pub snapshot: SnapshotInfo,
    pub count: usize,
    pub assets: Vec<MarketAssetOutput>,
}

/// JSON output for a stored purchase, valued at its last known price
#[derive(Debug, Serialize)]
pub struct TransactionOutput {
    pub id: String,
    pub asset_id: String,
    pub asset_symbol: String,
    pub asset_name: String,
    pub quantity: String,
    pub quantity_display: String,
    pub purchase_unit_price: String,
    pub purchase_unit_price_display: String,
    pub purchase_date: String,
    pub price_at_record_time: String,
    pub price_at_record_time_display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_updated_at: Option<String>,
    pub cost: String,
    pub cost_display: String,
    pub current_value: String,
    pub current_value_display: String,
    pub profit: String,
    pub profit_display: String,
    pub profit_percent: String,
    pub profit_percent_display: String,
}

impl TransactionOutput {
    pub fn new(tx: &Transaction, style: &CurrencyStyle) -> Self {
        let valuation = value_transaction(tx);
        Self {
            id: tx.id.to_string(),
            asset_id: tx.asset_id.clone(),
            asset_symbol: tx.asset_symbol.to_uppercase(),
            asset_name: tx.asset_name.clone(),
            quantity: raw(tx.quantity),
            quantity_display: format_quantity(tx.quantity),
            purchase_unit_price: raw(tx.purchase_unit_price),
            purchase_unit_price_display: style.currency(tx.purchase_unit_price),
            purchase_date: tx.purchase_date.to_string(),
            price_at_record_time: raw(tx.price_at_record_time),
            price_at_record_time_display: style.currency(tx.price_at_record_time),
            price_updated_at: tx.price_updated_at.map(|at| at.to_rfc3339()),
            cost: raw(valuation.cost),
            cost_display: style.currency(valuation.cost),
            current_value: raw(valuation.current_value),
            current_value_display: style.currency(valuation.current_value),
            profit: raw(valuation.profit),
            profit_display: style.currency(valuation.profit),
            profit_percent: raw(valuation.profit_percent),
            profit_percent_display: format_percent(valuation.profit_percent),
        }
    }
}

/// JSON output for `portfolio transactions`
#[derive(Debug, Serialize)]
pub struct TransactionsOutput {
    /// Prices the values are based on; null when no prices were available
    /// and the stored ones were used.
    pub snapshot: Option<SnapshotInfo>,
    pub transactions: Vec<TransactionOutput>,
}

/// JSON output for `portfolio holdings`
#[derive(Debug, Serialize)]
pub struct HoldingsOutput {
    pub snapshot: Option<SnapshotInfo>,
    pub holdings: Vec<HoldingOutput>,
}

/// JSON output for one holding
#[derive(Debug, Serialize)]
pub struct HoldingOutput {
    pub asset_id: String,
    pub asset_symbol: String,
    pub asset_name: String,
    pub asset_image_ref: String,
    pub transaction_ids: Vec<String>,
    pub total_quantity: String,
    pub total_quantity_display: String,
    pub total_investment: String,
    pub total_investment_display: String,
    pub average_purchase_price: String,
    pub average_purchase_price_display: String,
    pub current_unit_price: String,
    pub current_unit_price_display: String,
    pub current_value: String,
    pub current_value_display: String,
    pub profit: String,
    pub profit_display: String,
    pub profit_percent: String,
    pub profit_percent_display: String,
}

impl HoldingOutput {
    pub fn new(holding: &Holding, style: &CurrencyStyle) -> Self {
        Self {
            asset_id: holding.asset_id.clone(),
            asset_symbol: holding.asset_symbol.to_uppercase(),
            asset_name: holding.asset_name.clone(),
            asset_image_ref: holding.asset_image_ref.clone(),
            transaction_ids: holding
                .transaction_ids
                .iter()
                .map(ToString::to_string)
                .collect(),
            total_quantity: raw(holding.total_quantity),
            total_quantity_display: format_quantity(holding.total_quantity),
            total_investment: raw(holding.total_investment),
            total_investment_display: style.currency(holding.total_investment),
            average_purchase_price: raw(holding.average_purchase_price),
            average_purchase_price_display: style.currency(holding.average_purchase_price),
            current_unit_price: raw(holding.current_unit_price),
            current_unit_price_display: style.currency(holding.current_unit_price),
            current_value: raw(holding.current_value),
            current_value_display: style.currency(holding.current_value),
            profit: raw(holding.profit),
            profit_display: style.currency(holding.profit),
            profit_percent: raw(holding.profit_percent),
            profit_percent_display: format_percent(holding.profit_percent),
        }
    }
}

/// JSON output for `portfolio summary`
#[derive(Debug, Serialize)]
pub struct SummaryOutput {
    pub snapshot: Option<SnapshotInfo>,
    pub transaction_count: usize,
    pub holding_count: usize,
    pub total_investment: String,
    pub total_investment_display: String,
    pub total_current_value: String,
    pub total_current_value_display: String,
    pub total_profit: String,
    pub total_profit_display: String,
    pub total_profit_percent: String,
    pub total_profit_percent_display: String,
}

impl SummaryOutput {
    pub fn new(
        summary: &PortfolioSummary,
        transaction_count: usize,
        holding_count: usize,
        style: &CurrencyStyle,
    ) -> Self {
        Self {
            snapshot: None,
            transaction_count,
            holding_count,
            total_investment: raw(summary.total_investment),
            total_investment_display: style.currency(summary.total_investment),
            total_current_value: raw(summary.total_current_value),
            total_current_value_display: style.currency(summary.total_current_value),
            total_profit: raw(summary.total_profit),
            total_profit_display: style.currency(summary.total_profit),
            total_profit_percent: raw(summary.total_profit_percent),
            total_profit_percent_display: format_percent(summary.total_profit_percent),
        }
    }

    pub fn with_snapshot(mut self, snapshot: Option<SnapshotInfo>) -> Self {
        self.snapshot = snapshot;
        self
    }
}

/// JSON output for `portfolio refresh`
#[derive(Debug, Serialize)]
pub struct RefreshOutput {
    pub snapshot: SnapshotInfo,
    pub updated: usize,
    pub transaction_count: usize,
    pub saved: bool,
}
