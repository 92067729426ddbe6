//! Sources of the token lists and network configuration the engine prices
//! against.

use tokio::sync::watch;

use crate::models::{NetworkState, TokensState};

/// Known tokens per chain and account.
pub trait TokensProvider: Send + Sync {
    fn state(&self) -> TokensState;

    /// Fires with the full new state whenever the token lists change.
    fn subscribe(&self) -> watch::Receiver<TokensState>;
}

/// Configured networks and the selected chain.
pub trait NetworkProvider: Send + Sync {
    fn state(&self) -> NetworkState;

    /// Fires with the full new state whenever the configuration changes.
    fn subscribe(&self) -> watch::Receiver<NetworkState>;
}

/// In-memory [`TokensProvider`].
pub struct TokensStore {
    sender: watch::Sender<TokensState>,
}

impl TokensStore {
    pub fn new(initial: TokensState) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    pub fn update(&self, state: TokensState) {
        self.sender.send_replace(state);
    }
}

impl TokensProvider for TokensStore {
    fn state(&self) -> TokensState {
        self.sender.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<TokensState> {
        self.sender.subscribe()
    }
}

/// In-memory [`NetworkProvider`].
pub struct NetworkStore {
    sender: watch::Sender<NetworkState>,
}

impl NetworkStore {
    pub fn new(initial: NetworkState) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    pub fn update(&self, state: NetworkState) {
        self.sender.send_replace(state);
    }
}

impl NetworkProvider for NetworkStore {
    fn state(&self) -> NetworkState {
        self.sender.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<NetworkState> {
        self.sender.subscribe()
    }
}
