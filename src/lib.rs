pub mod batch;
pub mod cache;
pub mod collaborators;
pub mod controller;
pub mod currency;
pub mod error;
pub mod exchange_rate;
pub mod fetch;
pub mod models;
pub mod polling;
pub mod settings;
pub mod spot_prices;
pub mod store;
pub mod subscriptions;

use std::collections::HashMap;

use anyhow::{bail, Result};
use async_trait::async_trait;

pub use controller::{TokenRatesController, UpdateRequest};
pub use error::RefreshError;
pub use models::{
    Address, ChainId, MarketDatum, NetworkConfiguration, NetworkState, Token, TokensState,
    NATIVE_TOKEN_ADDRESS,
};
pub use polling::PollingHandle;
pub use store::{ChainMarketData, MarketDataSnapshot};

/// Maximum number of token addresses sent in a single price request.
pub const TOKEN_PRICES_BATCH_SIZE: usize = 100;

/// Currency token prices are quoted in when the native currency is not supported.
pub const FALLBACK_CURRENCY: &str = "ETH";

/// Price source for token market data.
#[async_trait]
pub trait TokenPricesService {
    /// Market data for the given addresses, keyed by address. Addresses the
    /// source knows nothing about are simply absent from the result.
    async fn fetch_token_prices(
        &self,
        chain_id: &str,
        token_addresses: &[Address],
        currency: &str,
    ) -> Result<HashMap<Address, MarketDatum>>;

    fn validate_chain_id_supported(&self, chain_id: &str) -> bool;

    fn validate_currency_supported(&self, currency: &str) -> bool;

    /// How many `to` one unit of `from` is worth.
    async fn fetch_exchange_rate(&self, from: &str, to: &str) -> Result<f64> {
        bail!("Exchange rate {}/{} not supported", from, to)
    }
}

pub trait NamedAPI {
    fn get_name(&self) -> String;
}

pub trait NamedPriceAPI: NamedAPI + TokenPricesService + Send + Sync {}
impl<T: NamedAPI + TokenPricesService + Send + Sync> NamedPriceAPI for T {}
