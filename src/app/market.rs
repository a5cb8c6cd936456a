use anyhow::Result;

use super::{AppContext, MarketAssetOutput, MarketOutput, SnapshotInfo};

/// Refresh the listing and return it, optionally filtered by name or symbol.
pub async fn list_market(app: &AppContext, search: Option<&str>) -> Result<MarketOutput> {
    let read = app.market_snapshot().await?;
    let assets: Vec<MarketAssetOutput> = read
        .snapshot
        .search(search.unwrap_or(""))
        .into_iter()
        .map(|asset| MarketAssetOutput::new(asset, app.style()))
        .collect();

    Ok(MarketOutput {
        snapshot: SnapshotInfo::new(&read.snapshot, read.live),
        count: assets.len(),
        assets,
    })
}
