use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::warn;

use crate::models::{Id, TransactionDraft};
use crate::portfolio::{StoreError, TransactionStore};

use super::{
    AppContext, HoldingOutput, HoldingsOutput, RefreshOutput, SnapshotInfo, SummaryOutput,
    TransactionOutput, TransactionsOutput,
};

/// Arguments for recording a purchase.
#[derive(Debug, Clone)]
pub struct AddTransactionArgs {
    pub asset_id: String,
    pub quantity: Decimal,
    pub purchase_unit_price: Decimal,
    /// Defaults to today.
    pub purchase_date: Option<NaiveDate>,
}

pub async fn add_transaction(
    app: &AppContext,
    args: AddTransactionArgs,
) -> Result<serde_json::Value> {
    let read = app.market_snapshot().await?;
    let mut store = app.open_store().await;

    let purchase_date = args
        .purchase_date
        .unwrap_or_else(|| app.clock().today());
    let draft = TransactionDraft::new(
        args.asset_id,
        args.quantity,
        args.purchase_unit_price,
        purchase_date,
    );
    let tx = store
        .add(&draft, &read.snapshot)
        .await
        .context("Failed to add transaction")?;

    Ok(serde_json::json!({
        "success": true,
        "saved": store.is_saved(),
        "snapshot": SnapshotInfo::new(&read.snapshot, read.live),
        "transaction": TransactionOutput::new(&tx, app.style()),
    }))
}

pub async fn remove_transaction(app: &AppContext, id_str: &str) -> Result<serde_json::Value> {
    let mut store = app.open_store().await;
    let id = Id::from_string(id_str);

    match store.remove(&id).await {
        Ok(tx) => Ok(serde_json::json!({
            "success": true,
            "saved": store.is_saved(),
            "transaction": TransactionOutput::new(&tx, app.style()),
        })),
        Err(StoreError::NotFound(_)) => Ok(serde_json::json!({
            "success": false,
            "error": "Transaction not found",
            "id": id_str
        })),
        Err(err) => Err(err.into()),
    }
}

/// Open the store with prices brought up to date from the feed, or from the
/// cached snapshot when the feed is unreachable. With no prices available at
/// all the stored ones are used as they are.
async fn open_priced_store(app: &AppContext) -> (TransactionStore, Option<SnapshotInfo>) {
    let mut store = app.open_store().await;
    match app.market_snapshot().await {
        Ok(read) => {
            store.refresh_prices(&read.snapshot).await;
            (store, Some(SnapshotInfo::new(&read.snapshot, read.live)))
        }
        Err(err) => {
            warn!(error = %format!("{err:#}"), "valuing purchases at their stored prices");
            (store, None)
        }
    }
}

/// Stored purchases in insertion order, valued at current prices.
pub async fn list_transactions(app: &AppContext) -> Result<TransactionsOutput> {
    let (store, snapshot) = open_priced_store(app).await;
    Ok(TransactionsOutput {
        snapshot,
        transactions: store
            .transactions()
            .iter()
            .map(|tx| TransactionOutput::new(tx, app.style()))
            .collect(),
    })
}

pub async fn portfolio_holdings(app: &AppContext) -> Result<HoldingsOutput> {
    let (store, snapshot) = open_priced_store(app).await;
    Ok(HoldingsOutput {
        snapshot,
        holdings: store
            .holdings()
            .iter()
            .map(|holding| HoldingOutput::new(holding, app.style()))
            .collect(),
    })
}

pub async fn portfolio_summary(app: &AppContext) -> Result<SummaryOutput> {
    let (store, snapshot) = open_priced_store(app).await;
    let holdings = store.holdings();
    Ok(SummaryOutput::new(
        &store.summary(),
        store.len(),
        holdings.len(),
        app.style(),
    )
    .with_snapshot(snapshot))
}

/// Fetch prices and copy them onto the stored purchases.
pub async fn refresh_portfolio(app: &AppContext) -> Result<RefreshOutput> {
    let read = app.market_snapshot().await?;
    let mut store = app.open_store().await;
    let updated = store.refresh_prices(&read.snapshot).await;

    Ok(RefreshOutput {
        snapshot: SnapshotInfo::new(&read.snapshot, read.live),
        updated,
        transaction_count: store.len(),
        saved: store.is_saved(),
    })
}
