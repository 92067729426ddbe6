use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::{self, AbortHandle, BoxFuture, FutureExt, Shared};
use log::{debug, info, warn};
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::collaborators::{NetworkProvider, TokensProvider};
use crate::error::RefreshError;
use crate::fetch::fetch_market_data;
use crate::models::{Address, ChainId, NetworkState, TokensState, NATIVE_TOKEN_ADDRESS};
use crate::polling::PollingRegistry;
use crate::store::{MarketDataSnapshot, MarketDataStore};
use crate::{NamedPriceAPI, TOKEN_PRICES_BATCH_SIZE};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(180);

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRequest {
    pub chain_id: ChainId,
    pub native_currency: String,
}

impl UpdateRequest {
    pub fn new(chain_id: &str, native_currency: &str) -> Self {
        Self {
            chain_id: chain_id.to_owned(),
            native_currency: native_currency.to_owned(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub interval: Duration,
    pub batch_size: NonZeroUsize,
    pub disabled: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            batch_size: NonZeroUsize::new(TOKEN_PRICES_BATCH_SIZE)
                .unwrap_or(NonZeroUsize::MIN),
            disabled: false,
        }
    }
}

type PendingRefresh = Shared<BoxFuture<'static, Result<(), RefreshError>>>;

pub(crate) struct Inner {
    pub(crate) service: Arc<dyn NamedPriceAPI>,
    pub(crate) tokens: Arc<dyn TokensProvider>,
    pub(crate) network: Arc<dyn NetworkProvider>,
    pub(crate) store: MarketDataStore,
    pub(crate) polling: PollingRegistry,
    pub(crate) last_tokens: Mutex<TokensState>,
    pub(crate) last_network: Mutex<NetworkState>,
    pub(crate) interval: Duration,
    pub(crate) listeners: Mutex<Vec<AbortHandle>>,
    in_flight: Mutex<HashMap<ChainId, PendingRefresh>>,
    disabled: AtomicBool,
    batch_size: NonZeroUsize,
}

/// Keeps per-chain token market data fresh.
///
/// Cloning is cheap; clones share the same state, in-flight refreshes and
/// polling loops.
#[derive(Clone)]
pub struct TokenRatesController {
    pub(crate) inner: Arc<Inner>,
}

impl TokenRatesController {
    pub fn new(
        service: Arc<dyn NamedPriceAPI>,
        tokens: Arc<dyn TokensProvider>,
        network: Arc<dyn NetworkProvider>,
        config: ControllerConfig,
    ) -> Self {
        let last_tokens = Mutex::new(tokens.state());
        let last_network = Mutex::new(network.state());
        Self {
            inner: Arc::new(Inner {
                service,
                tokens,
                network,
                store: MarketDataStore::new(),
                polling: PollingRegistry::default(),
                last_tokens,
                last_network,
                interval: config.interval,
                listeners: Mutex::new(Vec::new()),
                in_flight: Mutex::new(HashMap::new()),
                disabled: AtomicBool::new(config.disabled),
                batch_size: config.batch_size,
            }),
        }
    }

    /// Refreshes the given chains now. Every chain runs to completion; the
    /// first failure, if any, is returned afterwards.
    pub async fn update_exchange_rates(
        &self,
        requests: &[UpdateRequest],
    ) -> Result<(), RefreshError> {
        if self.is_disabled() {
            debug!("Token rates disabled, skipping {} chains", requests.len());
            return Ok(());
        }
        let pending = requests
            .iter()
            .map(|request| self.refresh_chain(&request.chain_id, &request.native_currency));
        future::join_all(pending).await.into_iter().collect()
    }

    /// Joins the refresh already running for `chain_id`, or starts one.
    fn refresh_chain(&self, chain_id: &str, native_currency: &str) -> PendingRefresh {
        let mut in_flight = self.inner.in_flight.lock();
        if let Some(pending) = in_flight.get(chain_id) {
            debug!("Joining in-flight refresh for chain {}", chain_id);
            return pending.clone();
        }

        let inner = self.inner.clone();
        let chain = chain_id.to_owned();
        let currency = native_currency.to_owned();
        let task = tokio::spawn(async move {
            let _registration = InFlight {
                inner: inner.clone(),
                chain_id: chain.clone(),
            };
            inner.refresh(&chain, &currency).await
        });

        let chain = chain_id.to_owned();
        let pending = async move {
            task.await.unwrap_or_else(|error| {
                Err(RefreshError::Task {
                    chain_id: chain,
                    message: error.to_string(),
                })
            })
        }
        .boxed()
        .shared();
        in_flight.insert(chain_id.to_owned(), pending.clone());
        pending
    }

    pub fn enable(&self) {
        self.inner.disabled.store(false, Ordering::SeqCst);
    }

    pub fn disable(&self) {
        self.inner.disabled.store(true, Ordering::SeqCst);
    }

    pub fn is_disabled(&self) -> bool {
        self.inner.disabled.load(Ordering::SeqCst)
    }

    pub fn reset_state(&self) {
        self.inner.store.reset();
    }

    pub fn market_data(&self) -> Arc<MarketDataSnapshot> {
        self.inner.store.snapshot()
    }

    /// Receives every new snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<MarketDataSnapshot>> {
        self.inner.store.subscribe()
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// Stops every polling loop and every listener started by `listen`.
    /// Refreshes already running still complete.
    pub fn destroy(&self) {
        self.stop_all_polling();
        for listener in self.inner.listeners.lock().drain(..) {
            listener.abort();
        }
    }

    /// Requests for `chain_ids` using each chain's configured native
    /// currency. Unconfigured chains are skipped.
    pub(crate) fn requests_for(&self, chain_ids: &[ChainId]) -> Vec<UpdateRequest> {
        let network = self.inner.network.state();
        chain_ids
            .iter()
            .filter_map(|chain_id| match network.native_currency(chain_id) {
                Some(native_currency) => Some(UpdateRequest::new(chain_id, native_currency)),
                None => {
                    debug!("Chain {} is not configured", chain_id);
                    None
                }
            })
            .collect()
    }

    /// Refreshes `requests`, logging instead of returning a failure.
    pub(crate) async fn refresh_quietly(&self, requests: &[UpdateRequest]) {
        if let Err(error) = self.update_exchange_rates(requests).await {
            warn!(
                "Token rates refresh for chain {} failed: {}",
                error.chain_id(),
                error
            );
        }
    }
}

impl Inner {
    async fn refresh(&self, chain_id: &str, native_currency: &str) -> Result<(), RefreshError> {
        let addresses = self.token_addresses(chain_id);
        info!(
            "Fetching {} token rates on chain {} in {} from {}",
            addresses.len(),
            chain_id,
            native_currency,
            self.service.get_name()
        );

        let bucket = fetch_market_data(
            self.service.as_ref(),
            chain_id,
            &addresses,
            native_currency,
            self.batch_size,
        )
        .await
        .map_err(|error| {
            warn!(
                "Fetching token rates on chain {} failed: {:#}",
                chain_id, error
            );
            RefreshError::fetch(chain_id, error)
        })?;

        let network = &self.network;
        let stored = self.store.replace_chain_if(chain_id, bucket, |chain_id| {
            network.state().networks.contains_key(chain_id)
        });
        if !stored {
            debug!(
                "Discarding token rates for chain {}, no longer configured",
                chain_id
            );
        }
        Ok(())
    }

    /// The native coin plus every known token on `chain_id`, sorted.
    fn token_addresses(&self, chain_id: &str) -> Vec<Address> {
        let mut addresses = self.tokens.state().token_addresses(chain_id);
        addresses.insert(NATIVE_TOKEN_ADDRESS.to_owned());
        addresses.into_iter().collect()
    }
}

/// Clears a chain's in-flight entry when its refresh task ends, however it
/// ends.
struct InFlight {
    inner: Arc<Inner>,
    chain_id: ChainId,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.inner.in_flight.lock().remove(&self.chain_id);
    }
}
