use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use crate::models::{Address, ChainId, MarketDatum};

/// Market data for one chain. `None` marks an address that was asked for but
/// could not be priced.
pub type ChainMarketData = HashMap<Address, Option<MarketDatum>>;

/// Immutable view of all market data. Chain buckets are shared, so cloning a
/// snapshot is cheap and never observes a bucket mid-write.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketDataSnapshot {
    version: u64,
    market_data: HashMap<ChainId, Arc<ChainMarketData>>,
}

impl MarketDataSnapshot {
    /// Incremented on every write.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn get(&self, chain_id: &str) -> Option<&ChainMarketData> {
        self.market_data.get(chain_id).map(|bucket| bucket.as_ref())
    }

    pub fn datum(&self, chain_id: &str, address: &str) -> Option<&MarketDatum> {
        self.get(chain_id)
            .and_then(|bucket| bucket.get(address))
            .and_then(|datum| datum.as_ref())
    }

    pub fn chain_ids(&self) -> impl Iterator<Item = &ChainId> {
        self.market_data.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.market_data.is_empty()
    }
}

/// Single-writer holder of the current snapshot.
pub struct MarketDataStore {
    sender: watch::Sender<Arc<MarketDataSnapshot>>,
}

impl Default for MarketDataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketDataStore {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(Arc::new(MarketDataSnapshot::default()));
        Self { sender }
    }

    pub fn snapshot(&self) -> Arc<MarketDataSnapshot> {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<MarketDataSnapshot>> {
        self.sender.subscribe()
    }

    /// Replaces the whole bucket for `chain_id`.
    pub fn replace_chain(&self, chain_id: &str, bucket: ChainMarketData) {
        self.replace_chain_if(chain_id, bucket, |_| true);
    }

    /// Replaces the bucket for `chain_id` only if `is_configured` still holds
    /// for it. The check runs under the store's write lock, so a concurrent
    /// [`retain_chains`](Self::retain_chains) cannot interleave with it.
    /// Returns whether the bucket was written.
    pub fn replace_chain_if<F>(
        &self,
        chain_id: &str,
        bucket: ChainMarketData,
        is_configured: F,
    ) -> bool
    where
        F: FnOnce(&str) -> bool,
    {
        let bucket = Arc::new(bucket);
        self.sender.send_if_modified(|snapshot| {
            if !is_configured(chain_id) {
                return false;
            }
            let snapshot = Arc::make_mut(snapshot);
            snapshot.market_data.insert(chain_id.to_owned(), bucket);
            snapshot.version += 1;
            true
        })
    }

    /// Drops buckets for chains not in `configured`. Returns the pruned chains.
    pub fn retain_chains(&self, configured: &HashSet<ChainId>) -> Vec<ChainId> {
        let mut stale = Vec::new();
        self.sender.send_if_modified(|snapshot| {
            stale = snapshot
                .chain_ids()
                .filter(|chain_id| !configured.contains(*chain_id))
                .cloned()
                .collect();
            if stale.is_empty() {
                return false;
            }
            let snapshot = Arc::make_mut(snapshot);
            for chain_id in &stale {
                snapshot.market_data.remove(chain_id);
            }
            snapshot.version += 1;
            true
        });
        stale
    }

    pub fn reset(&self) {
        self.sender.send_modify(|snapshot| {
            let version = snapshot.version + 1;
            *snapshot = Arc::new(MarketDataSnapshot {
                version,
                ..MarketDataSnapshot::default()
            });
        });
    }
}
