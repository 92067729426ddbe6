#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use token_rates::collaborators::{NetworkStore, TokensStore};
use token_rates::controller::ControllerConfig;
use token_rates::models::AccountTokens;
use token_rates::{
    Address, MarketDatum, NamedAPI, NetworkConfiguration, NetworkState, Token, TokenPricesService,
    TokenRatesController, TokensState,
};

#[derive(Debug, Clone, PartialEq)]
pub struct PriceCall {
    pub chain_id: String,
    pub token_addresses: Vec<Address>,
    pub currency: String,
}

/// Price source handing out prices 0.001, 0.002, ... in request order.
pub struct MockPrices {
    pub calls: Mutex<Vec<PriceCall>>,
    pub exchange_rate_calls: Mutex<Vec<(String, String)>>,
    pub fail_with: Mutex<Option<String>>,
    pub failing_chains: HashSet<String>,
    pub unsupported_chains: HashSet<String>,
    pub supported_currencies: HashSet<String>,
    pub exchange_rate: Option<f64>,
    pub omitted: HashSet<Address>,
    pub delay: Duration,
    pub next_price: Mutex<u64>,
}

impl Default for MockPrices {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            exchange_rate_calls: Mutex::new(Vec::new()),
            fail_with: Mutex::new(None),
            failing_chains: HashSet::new(),
            unsupported_chains: HashSet::new(),
            supported_currencies: ["ETH", "USD"].iter().map(|c| c.to_string()).collect(),
            exchange_rate: None,
            omitted: HashSet::new(),
            delay: Duration::from_millis(0),
            next_price: Mutex::new(0),
        }
    }
}

impl MockPrices {
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn fail(&self, message: &str) {
        *self.fail_with.lock() = Some(message.to_owned());
    }

    pub fn recover(&self) {
        *self.fail_with.lock() = None;
    }
}

#[async_trait]
impl TokenPricesService for MockPrices {
    async fn fetch_token_prices(
        &self,
        chain_id: &str,
        token_addresses: &[Address],
        currency: &str,
    ) -> Result<HashMap<Address, MarketDatum>> {
        self.calls.lock().push(PriceCall {
            chain_id: chain_id.to_owned(),
            token_addresses: token_addresses.to_vec(),
            currency: currency.to_owned(),
        });
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(message) = self.fail_with.lock().clone() {
            return Err(anyhow!(message));
        }
        if self.failing_chains.contains(chain_id) {
            bail!("Failed to fetch");
        }
        let mut next_price = self.next_price.lock();
        Ok(token_addresses
            .iter()
            .filter(|address| !self.omitted.contains(*address))
            .map(|address| {
                *next_price += 1;
                let datum = MarketDatum {
                    token_address: address.clone(),
                    currency: currency.to_owned(),
                    price: *next_price as f64 / 1000.0,
                    market_cap: Some(1000.0),
                    ..MarketDatum::default()
                };
                (address.clone(), datum)
            })
            .collect())
    }

    fn validate_chain_id_supported(&self, chain_id: &str) -> bool {
        !self.unsupported_chains.contains(chain_id)
    }

    fn validate_currency_supported(&self, currency: &str) -> bool {
        self.supported_currencies.contains(&currency.to_uppercase())
    }

    async fn fetch_exchange_rate(&self, from: &str, to: &str) -> Result<f64> {
        self.exchange_rate_calls
            .lock()
            .push((from.to_owned(), to.to_owned()));
        self.exchange_rate
            .ok_or_else(|| anyhow!("No market for {}/{}", from, to))
    }
}

impl NamedAPI for MockPrices {
    fn get_name(&self) -> String {
        "Mock".to_owned()
    }
}

pub fn address(n: u64) -> Address {
    format!("0x{:040x}", n)
}

pub fn token(address: &str) -> Token {
    Token {
        address: address.to_owned(),
        symbol: "TKN".to_owned(),
        decimals: 18,
        name: None,
    }
}

/// Tokens on one chain, per account.
pub fn tokens_state(chain_id: &str, accounts: &[(&str, Vec<String>)]) -> TokensState {
    let account_tokens: AccountTokens = accounts
        .iter()
        .map(|(account, addresses)| {
            (
                account.to_string(),
                addresses.iter().map(|address| token(address)).collect(),
            )
        })
        .collect();
    let mut state = TokensState::default();
    state.all_tokens.insert(chain_id.to_owned(), account_tokens);
    state
}

pub fn network_state(selected_chain_id: &str, networks: &[(&str, &str)]) -> NetworkState {
    NetworkState {
        selected_chain_id: selected_chain_id.to_owned(),
        networks: networks
            .iter()
            .map(|(chain_id, native_currency)| {
                (
                    chain_id.to_string(),
                    NetworkConfiguration {
                        native_currency: native_currency.to_string(),
                        name: None,
                    },
                )
            })
            .collect(),
    }
}

pub struct Harness {
    pub controller: TokenRatesController,
    pub prices: Arc<MockPrices>,
    pub tokens: Arc<TokensStore>,
    pub network: Arc<NetworkStore>,
}

pub fn harness(prices: MockPrices, tokens: TokensState, network: NetworkState) -> Harness {
    harness_with_config(prices, tokens, network, ControllerConfig::default())
}

pub fn harness_with_config(
    prices: MockPrices,
    tokens: TokensState,
    network: NetworkState,
    config: ControllerConfig,
) -> Harness {
    let _ = env_logger::builder().is_test(true).try_init();
    let prices = Arc::new(prices);
    let tokens = Arc::new(TokensStore::new(tokens));
    let network = Arc::new(NetworkStore::new(network));
    let controller =
        TokenRatesController::new(prices.clone(), tokens.clone(), network.clone(), config);
    Harness {
        controller,
        prices,
        tokens,
        network,
    }
}

impl Harness {
    /// Publishes `state` and delivers the change event.
    pub async fn change_tokens(&self, state: TokensState) {
        self.tokens.update(state.clone());
        self.controller.handle_tokens_state_change(state).await;
    }

    pub async fn change_network(&self, state: NetworkState) {
        self.network.update(state.clone());
        self.controller.handle_network_state_change(state).await;
    }
}
