mod aggregate;
mod models;
mod store;

pub use aggregate::{compute_holdings, compute_summary, profit_percent, value_transaction};
pub use models::{Holding, PortfolioSummary, TransactionValuation};
pub use store::{LoadReport, StoreError, TransactionStore};
