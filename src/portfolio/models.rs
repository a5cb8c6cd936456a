use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::Id;

/// Aggregated position in one asset across all of its purchases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub asset_id: String,
    pub asset_symbol: String,
    pub asset_name: String,
    pub asset_image_ref: String,
    /// Member transactions, in input order.
    pub transaction_ids: Vec<Id>,
    pub total_quantity: Decimal,
    pub total_investment: Decimal,
    /// Latest known price for the asset.
    pub current_unit_price: Decimal,
    pub average_purchase_price: Decimal,
    pub current_value: Decimal,
    pub profit: Decimal,
    /// Zero when nothing was invested.
    pub profit_percent: Decimal,
}

/// Whole-portfolio totals, reduced over every transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub total_investment: Decimal,
    pub total_current_value: Decimal,
    pub total_profit: Decimal,
    pub total_profit_percent: Decimal,
}

/// Profit/loss of a single purchase at its last known price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionValuation {
    pub cost: Decimal,
    pub current_value: Decimal,
    pub profit: Decimal,
    pub profit_percent: Decimal,
}
