use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use log::{debug, info};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::controller::TokenRatesController;
use crate::models::ChainId;

/// One caller's interest in polling a set of chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PollingHandle(u64);

struct PollingLoop {
    handles: HashSet<PollingHandle>,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct Loops {
    next_handle: u64,
    by_key: HashMap<String, PollingLoop>,
}

/// Polling loops keyed by their sorted chain set, shared by every handle
/// asking for the same set.
#[derive(Default)]
pub(crate) struct PollingRegistry {
    loops: Mutex<Loops>,
}

impl PollingRegistry {
    pub(crate) fn active_loops(&self) -> usize {
        self.loops.lock().by_key.len()
    }
}

fn polling_key(chain_ids: &[ChainId]) -> (String, Vec<ChainId>) {
    let chain_ids = chain_ids.iter().sorted().dedup().cloned().collect_vec();
    (chain_ids.join(","), chain_ids)
}

impl TokenRatesController {
    /// Refreshes `chain_ids` now and then on every interval until the
    /// returned handle is stopped. Callers polling the same chain set share
    /// one loop.
    pub fn start_polling(&self, chain_ids: &[ChainId]) -> PollingHandle {
        let (key, chain_ids) = polling_key(chain_ids);
        let mut loops = self.inner.polling.loops.lock();
        let handle = PollingHandle(loops.next_handle);
        loops.next_handle += 1;

        if let Some(existing) = loops.by_key.get_mut(&key) {
            debug!("Joining polling loop for chains [{}]", key);
            existing.handles.insert(handle);
            return handle;
        }

        info!(
            "Polling chains [{}] every {:?}",
            key,
            self.inner.interval
        );
        let controller = self.clone();
        let period = self.inner.interval;
        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let requests = controller.requests_for(&chain_ids);
                controller.refresh_quietly(&requests).await;
            }
        });

        let mut handles = HashSet::new();
        handles.insert(handle);
        loops.by_key.insert(key, PollingLoop { handles, task });
        handle
    }

    /// Releases `handle`. The loop stops once no handle references it.
    pub fn stop_polling_by_handle(&self, handle: PollingHandle) {
        let mut loops = self.inner.polling.loops.lock();
        let key = loops
            .by_key
            .iter()
            .find(|(_, polling)| polling.handles.contains(&handle))
            .map(|(key, _)| key.clone());
        let key = match key {
            Some(key) => key,
            None => {
                debug!("Polling handle {:?} is not active", handle);
                return;
            }
        };

        let unused = loops
            .by_key
            .get_mut(&key)
            .map(|polling| {
                polling.handles.remove(&handle);
                polling.handles.is_empty()
            })
            .unwrap_or(false);
        if unused {
            if let Some(polling) = loops.by_key.remove(&key) {
                info!("Stopped polling chains [{}]", key);
                polling.task.abort();
            }
        }
    }

    pub fn stop_all_polling(&self) {
        let mut loops = self.inner.polling.loops.lock();
        for (key, polling) in loops.by_key.drain() {
            info!("Stopped polling chains [{}]", key);
            polling.task.abort();
        }
    }

    /// Number of distinct polling loops running.
    pub fn polling_loops(&self) -> usize {
        self.inner.polling.active_loops()
    }
}
