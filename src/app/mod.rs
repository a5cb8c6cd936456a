mod config;
mod context;
mod market;
mod portfolio;
mod types;

pub use config::config_output;
pub use context::{AppContext, MarketRead};
pub use market::list_market;
pub use portfolio::{
    add_transaction, list_transactions, portfolio_holdings, portfolio_summary, refresh_portfolio,
    remove_transaction, AddTransactionArgs,
};
pub use types::{
    HoldingOutput, HoldingsOutput, MarketAssetOutput, MarketOutput, RefreshOutput, SnapshotInfo,
    SummaryOutput, TransactionOutput, TransactionsOutput,
};
