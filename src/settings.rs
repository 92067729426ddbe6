use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::controller::ControllerConfig;
use crate::models::{AccountTokens, ChainId, NetworkConfiguration, NetworkState, TokensState};
use crate::{exchange_rate, spot_prices, TOKEN_PRICES_BATCH_SIZE};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub interval_secs: u64,
    pub batch_size: usize,
    pub disabled: bool,
    pub price_api_url: String,
    pub exchange_rate_api_url: String,
    pub exchange_rate_max_age_secs: u64,
    pub selected_chain_id: ChainId,
    /// Native currency per configured chain.
    #[serde(default)]
    pub networks: HashMap<ChainId, String>,
    #[serde(default)]
    pub tokens: HashMap<ChainId, AccountTokens>,
}

impl Settings {
    /// Reads `token-rates.{toml,json}` if present, then `TOKEN_RATES_*`
    /// environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("token-rates")
    }

    pub fn load_from(file_stem: &str) -> Result<Self, ConfigError> {
        let mut s = Config::default();
        s.set_default("interval_secs", 180i64)?;
        s.set_default("batch_size", TOKEN_PRICES_BATCH_SIZE as i64)?;
        s.set_default("disabled", false)?;
        s.set_default("price_api_url", spot_prices::DEFAULT_BASE_URL)?;
        s.set_default("exchange_rate_api_url", exchange_rate::DEFAULT_BASE_URL)?;
        s.set_default("exchange_rate_max_age_secs", 60i64)?;
        s.set_default("selected_chain_id", "0x1")?;
        s.merge(File::with_name(file_stem).required(false))?;
        s.merge(Environment::with_prefix("TOKEN_RATES").separator("__"))?;
        s.try_into()
    }

    pub fn controller_config(&self) -> Result<ControllerConfig, ConfigError> {
        let batch_size = NonZeroUsize::new(self.batch_size)
            .ok_or_else(|| ConfigError::Message("batch_size must be positive".to_owned()))?;
        Ok(ControllerConfig {
            interval: Duration::from_secs(self.interval_secs),
            batch_size,
            disabled: self.disabled,
        })
    }

    pub fn exchange_rate_max_age(&self) -> Duration {
        Duration::from_secs(self.exchange_rate_max_age_secs)
    }

    pub fn network_state(&self) -> NetworkState {
        NetworkState {
            selected_chain_id: self.selected_chain_id.clone(),
            networks: self
                .networks
                .iter()
                .map(|(chain_id, native_currency)| {
                    let network = NetworkConfiguration {
                        native_currency: native_currency.clone(),
                        name: None,
                    };
                    (chain_id.clone(), network)
                })
                .collect(),
        }
    }

    pub fn tokens_state(&self) -> TokensState {
        TokensState {
            all_tokens: self.tokens.clone(),
            all_detected_tokens: HashMap::new(),
        }
    }
}
