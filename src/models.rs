use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// Hex encoded chain id, e.g. `0x1`.
pub type ChainId = String;

/// Lower-cased hex token address.
pub type Address = String;

/// Address standing in for a chain's native coin.
pub const NATIVE_TOKEN_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

pub fn normalize_address(address: &str) -> Address {
    address.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketDatum {
    #[serde(default)]
    pub token_address: Address,
    #[serde(default)]
    pub currency: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_change_1d: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_percent_change_1d: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_percent_change_1h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_percent_change_7d: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_time_high: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_time_low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circulating_supply: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diluted_market_cap: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_1d: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_1d: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Token {
    pub address: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(default)]
    pub name: Option<String>,
}

/// Tokens held per account, keyed by account address.
pub type AccountTokens = HashMap<String, Vec<Token>>;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokensState {
    #[serde(default)]
    pub all_tokens: HashMap<ChainId, AccountTokens>,
    #[serde(default)]
    pub all_detected_tokens: HashMap<ChainId, AccountTokens>,
}

impl TokensState {
    /// Every token address known for `chain_id`, across all accounts and both
    /// the imported and detected lists. Normalized, so metadata changes and
    /// reordering produce the same set.
    pub fn token_addresses(&self, chain_id: &str) -> BTreeSet<Address> {
        [&self.all_tokens, &self.all_detected_tokens]
            .iter()
            .filter_map(|lists| lists.get(chain_id))
            .flat_map(|accounts| accounts.values())
            .flatten()
            .map(|token| normalize_address(&token.address))
            .collect()
    }

    pub fn chain_ids(&self) -> BTreeSet<ChainId> {
        self.all_tokens
            .keys()
            .chain(self.all_detected_tokens.keys())
            .cloned()
            .collect()
    }

    /// Chains whose address set differs between `self` and `previous`.
    pub fn changed_chains(&self, previous: &TokensState) -> Vec<ChainId> {
        self.chain_ids()
            .union(&previous.chain_ids())
            .filter(|chain_id| {
                self.token_addresses(chain_id) != previous.token_addresses(chain_id)
            })
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfiguration {
    pub native_currency: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkState {
    pub selected_chain_id: ChainId,
    #[serde(default)]
    pub networks: HashMap<ChainId, NetworkConfiguration>,
}

impl NetworkState {
    pub fn native_currency(&self, chain_id: &str) -> Option<&str> {
        self.networks
            .get(chain_id)
            .map(|network| network.native_currency.as_str())
    }

    pub fn selected_native_currency(&self) -> Option<&str> {
        self.native_currency(&self.selected_chain_id)
    }
}
