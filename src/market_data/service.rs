use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};

use super::{FeedError, MarketDataSource, PriceSnapshot};

/// Number of ranked assets requested per refresh.
pub const DEFAULT_MARKET_LIMIT: u32 = 50;

#[derive(Default)]
struct SnapshotSlot {
    /// Sequence number of the request whose response is installed.
    seq: u64,
    snapshot: Option<Arc<PriceSnapshot>>,
}

/// Owns the in-memory price snapshot and refreshes it from a source.
///
/// Refreshes may overlap. Each one is numbered when it starts, and a
/// response is installed only if no later-numbered response got there
/// first, so a slow stale request can never overwrite fresher prices.
/// A failed refresh leaves the current snapshot untouched.
pub struct MarketDataService {
    source: Arc<dyn MarketDataSource>,
    limit: u32,
    clock: Arc<dyn Clock>,
    requests: AtomicU64,
    current: Mutex<SnapshotSlot>,
}

impl MarketDataService {
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self {
            source,
            limit: DEFAULT_MARKET_LIMIT,
            clock: Arc::new(SystemClock),
            requests: AtomicU64::new(0),
            current: Mutex::new(SnapshotSlot::default()),
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// The slot only ever holds a whole snapshot, so a poisoned lock is
    /// still consistent.
    fn slot(&self) -> MutexGuard<'_, SnapshotSlot> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Install a previously cached snapshot. Ignored once any refresh has
    /// succeeded.
    pub fn seed(&self, snapshot: PriceSnapshot) {
        let mut slot = self.slot();
        if slot.seq == 0 {
            debug!(fetched_at = %snapshot.fetched_at, assets = snapshot.len(), "seeding cached snapshot");
            slot.snapshot = Some(Arc::new(snapshot));
        }
    }

    /// The most recent snapshot, if any.
    pub fn snapshot(&self) -> Option<Arc<PriceSnapshot>> {
        self.slot().snapshot.clone()
    }

    /// Fetch a new listing and install it.
    ///
    /// Returns the snapshot that is current after this call, which is a
    /// newer one than this request fetched if an overlapping refresh won.
    pub async fn refresh(&self) -> Result<Arc<PriceSnapshot>, FeedError> {
        let seq = self.requests.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(seq, source = self.source.name(), "refreshing market snapshot");

        let assets = match self.source.fetch_markets(self.limit).await {
            Ok(assets) => assets,
            Err(err) => {
                warn!(
                    seq,
                    source = self.source.name(),
                    error = %err,
                    "market refresh failed; keeping previous snapshot"
                );
                return Err(err);
            }
        };

        let fetched = Arc::new(PriceSnapshot::new(
            self.source.name(),
            self.clock.now(),
            assets,
        ));

        let mut slot = self.slot();
        if seq > slot.seq {
            info!(seq, assets = fetched.len(), "installed market snapshot");
            slot.seq = seq;
            slot.snapshot = Some(fetched.clone());
            Ok(fetched)
        } else {
            debug!(seq, installed = slot.seq, "discarding superseded market response");
            Ok(slot.snapshot.clone().unwrap_or(fetched))
        }
    }
}
