use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::market_data::PriceSnapshot;
use crate::models::{Id, IdGenerator, Transaction, TransactionDraft, UuidIdGenerator, ValidationError};
use crate::storage::records::{decode_transactions, encode_transactions, RejectedRecord};
use crate::storage::{Storage, TRANSACTIONS_KEY};

use super::{compute_holdings, compute_summary, Holding, PortfolioSummary};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("transaction `{0}` not found")]
    NotFound(Id),
    #[error("transaction id `{0}` is already in use")]
    DuplicateId(Id),
    #[error("failed to persist transactions: {0:#}")]
    Persistence(anyhow::Error),
}

/// What happened when the stored list was read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    /// Records dropped because they failed validation.
    pub rejected: Vec<RejectedRecord>,
    /// Set when the whole document was unreadable and an empty list was
    /// used instead.
    pub failure: Option<String>,
}

/// Ordered, persisted list of purchase transactions.
///
/// Mutations take `&mut self`, so there is only ever one writer. Every
/// successful mutation writes the full list back to storage; a failed write
/// is logged and reported by [`is_saved`](Self::is_saved) but never rolls
/// back the in-memory change.
pub struct TransactionStore {
    storage: Arc<dyn Storage>,
    ids: Arc<dyn IdGenerator>,
    transactions: Vec<Transaction>,
    saved: bool,
    /// Set when storage could not be read. Writes are refused until a
    /// successful reload so the unread document is never replaced.
    unreadable: bool,
    load_report: LoadReport,
}

impl TransactionStore {
    /// An empty store that has not read `storage` yet.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            ids: Arc::new(UuidIdGenerator),
            transactions: Vec::new(),
            saved: true,
            unreadable: false,
            load_report: LoadReport::default(),
        }
    }

    /// Open the store and read whatever `storage` holds.
    pub async fn open(storage: Arc<dyn Storage>) -> Self {
        let mut store = Self::new(storage);
        store.reload().await;
        store
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Replace the in-memory list with the stored one.
    ///
    /// Never fails: an absent key yields an empty list, and an unreadable
    /// document yields an empty list plus a warning. When storage itself
    /// fails to answer, later saves are refused until a reload succeeds.
    pub async fn reload(&mut self) -> &LoadReport {
        let mut report = LoadReport::default();
        self.unreadable = false;
        self.transactions = match self.storage.get(TRANSACTIONS_KEY).await {
            Ok(None) => {
                debug!("no stored transactions");
                Vec::new()
            }
            Ok(Some(raw)) => match decode_transactions(&raw) {
                Ok(decoded) => {
                    for rejected in &decoded.rejected {
                        warn!(
                            index = rejected.index,
                            reason = %rejected.reason,
                            "skipping invalid stored transaction"
                        );
                    }
                    report.rejected = decoded.rejected;
                    decoded.transactions
                }
                Err(err) => {
                    warn!(error = %err, "stored transactions are corrupt; starting empty");
                    report.failure = Some(err.to_string());
                    Vec::new()
                }
            },
            Err(err) => {
                warn!(
                    error = %format!("{err:#}"),
                    "failed to read stored transactions; starting empty without saving"
                );
                report.failure = Some(format!("{err:#}"));
                self.unreadable = true;
                Vec::new()
            }
        };
        report.loaded = self.transactions.len();
        self.saved = report.failure.is_none() && report.rejected.is_empty();
        info!(loaded = report.loaded, rejected = report.rejected.len(), "loaded transactions");
        self.load_report = report;
        &self.load_report
    }

    pub fn load_report(&self) -> &LoadReport {
        &self.load_report
    }

    /// Transactions in insertion order.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn get(&self, id: &Id) -> Option<&Transaction> {
        self.transactions.iter().find(|tx| &tx.id == id)
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// False when the in-memory list has changes storage does not.
    pub fn is_saved(&self) -> bool {
        self.saved
    }

    pub fn holdings(&self) -> Vec<Holding> {
        compute_holdings(&self.transactions)
    }

    pub fn summary(&self) -> PortfolioSummary {
        compute_summary(&self.transactions)
    }

    /// Validate `draft`, complete it from the snapshot entry for its asset
    /// and append it.
    pub async fn add(
        &mut self,
        draft: &TransactionDraft,
        snapshot: &PriceSnapshot,
    ) -> Result<Transaction, StoreError> {
        let valid = draft.validate()?;
        let asset = snapshot
            .get(&valid.asset_id)
            .ok_or_else(|| ValidationError::UnknownAsset(valid.asset_id.clone()))?;

        let id = self.ids.new_id();
        if self.get(&id).is_some() {
            return Err(StoreError::DuplicateId(id));
        }

        let tx = Transaction {
            id,
            asset_id: asset.id.clone(),
            asset_symbol: asset.symbol.clone(),
            asset_name: asset.name.clone(),
            asset_image_ref: asset.image.clone(),
            quantity: valid.quantity,
            purchase_unit_price: valid.purchase_unit_price,
            purchase_date: valid.purchase_date,
            price_at_record_time: asset.current_price,
            price_updated_at: Some(snapshot.fetched_at),
        };

        info!(
            id = %tx.id,
            asset_id = %tx.asset_id,
            quantity = %tx.quantity,
            price = %tx.purchase_unit_price,
            "added transaction"
        );
        self.transactions.push(tx.clone());
        self.persist().await;
        Ok(tx)
    }

    /// Remove the transaction with `id`, leaving every other record as is.
    pub async fn remove(&mut self, id: &Id) -> Result<Transaction, StoreError> {
        let position = self
            .transactions
            .iter()
            .position(|tx| &tx.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        let removed = self.transactions.remove(position);
        info!(id = %removed.id, asset_id = %removed.asset_id, "removed transaction");
        self.persist().await;
        Ok(removed)
    }

    /// Copy snapshot prices onto matching transactions. Assets missing from
    /// the snapshot keep their last known price. Returns how many records
    /// changed.
    pub async fn refresh_prices(&mut self, snapshot: &PriceSnapshot) -> usize {
        let prices = snapshot.price_index();
        let mut changed = 0;
        for tx in &mut self.transactions {
            if let Some(price) = prices.get(tx.asset_id.as_str()) {
                if tx.apply_price(*price, snapshot.fetched_at) {
                    changed += 1;
                }
            }
        }

        if changed > 0 {
            info!(changed, source = %snapshot.source, "refreshed transaction prices");
            self.persist().await;
        } else {
            debug!(source = %snapshot.source, "no transaction prices changed");
        }
        changed
    }

    /// Write the full list to storage.
    pub async fn save(&mut self) -> Result<(), StoreError> {
        if self.unreadable {
            self.saved = false;
            return Err(StoreError::Persistence(anyhow::anyhow!(
                "stored transactions could not be read; refusing to overwrite them"
            )));
        }
        let encoded = encode_transactions(&self.transactions)
            .map_err(|e| StoreError::Persistence(e.into()))?;
        match self.storage.set(TRANSACTIONS_KEY, &encoded).await {
            Ok(()) => {
                self.saved = true;
                Ok(())
            }
            Err(err) => {
                self.saved = false;
                Err(StoreError::Persistence(err))
            }
        }
    }

    async fn persist(&mut self) {
        if let Err(err) = self.save().await {
            warn!(error = %err, "keeping unsaved transactions in memory");
        }
    }
}
