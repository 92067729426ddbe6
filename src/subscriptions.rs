//! Reacting to token list and network configuration changes.

use std::collections::HashSet;
use std::future::Future;

use futures::future::{AbortHandle, Abortable};
use log::{debug, info};

use crate::controller::{TokenRatesController, UpdateRequest};
use crate::models::{ChainId, NetworkState, TokensState};

/// Listener tasks started by [`TokenRatesController::listen`]. Dropping it
/// unsubscribes too, as does [`TokenRatesController::destroy`].
pub struct Subscription {
    tasks: Vec<AbortHandle>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.abort();
    }

    fn abort(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.abort();
    }
}

impl TokenRatesController {
    /// Starts reacting to the tokens and network providers' change events.
    pub fn listen(&self) -> Subscription {
        let mut tokens = self.inner.tokens.subscribe();
        let controller = self.clone();
        let tokens_task = self.spawn_listener(async move {
            while tokens.changed().await.is_ok() {
                let state = tokens.borrow_and_update().clone();
                controller.handle_tokens_state_change(state).await;
            }
        });

        let mut network = self.inner.network.subscribe();
        let controller = self.clone();
        let network_task = self.spawn_listener(async move {
            while network.changed().await.is_ok() {
                let state = network.borrow_and_update().clone();
                controller.handle_network_state_change(state).await;
            }
        });

        Subscription {
            tasks: vec![tokens_task, network_task],
        }
    }

    fn spawn_listener<F>(&self, listener: F) -> AbortHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (handle, registration) = AbortHandle::new_pair();
        tokio::spawn(Abortable::new(listener, registration));
        self.inner.listeners.lock().push(handle.clone());
        handle
    }

    /// Refreshes the chains whose token address set changed. Metadata edits
    /// and reordering are not changes.
    pub async fn handle_tokens_state_change(&self, state: TokensState) {
        let changed = {
            let mut last = self.inner.last_tokens.lock();
            let changed = state.changed_chains(&last);
            *last = state;
            changed
        };
        if changed.is_empty() {
            return;
        }
        if self.is_disabled() {
            debug!("Token rates disabled, ignoring token changes");
            return;
        }
        debug!("Token addresses changed on chains {:?}", changed);
        let requests = self.requests_for(&changed);
        self.refresh_quietly(&requests).await;
    }

    /// Drops market data for chains no longer configured, and refreshes the
    /// selected chain when it or its native currency changed.
    pub async fn handle_network_state_change(&self, state: NetworkState) {
        let configured: HashSet<ChainId> = state.networks.keys().cloned().collect();
        let pruned = self.inner.store.retain_chains(&configured);
        if !pruned.is_empty() {
            info!("Removed token rates for chains {:?}", pruned);
        }

        let previous = std::mem::replace(&mut *self.inner.last_network.lock(), state.clone());
        let selection_changed = previous.selected_chain_id != state.selected_chain_id
            || previous.selected_native_currency() != state.selected_native_currency();
        if !selection_changed {
            return;
        }
        if self.is_disabled() {
            debug!("Token rates disabled, ignoring network change");
            return;
        }
        if let Some(native_currency) = state.selected_native_currency() {
            let request = UpdateRequest::new(&state.selected_chain_id, native_currency);
            self.refresh_quietly(&[request]).await;
        }
    }
}
