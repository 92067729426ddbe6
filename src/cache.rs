use crate::models::{Address, MarketDatum};
use crate::{NamedAPI, TokenPricesService};
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

/// Remembers exchange rates for `max_cache_age`, so every chain priced
/// through the fallback currency in one cycle shares a single lookup.
pub struct ExchangeRateCache<T> {
    api: T,
    rate_cache: Mutex<HashMap<(String, String), CachedRate>>,
    max_cache_age: Duration,
}

struct CachedRate {
    rate: f64,
    fetched_at: Instant,
}

impl<T> ExchangeRateCache<T> {
    pub fn new(api: T, max_cache_age: Duration) -> Self {
        Self {
            api,
            rate_cache: Mutex::new(HashMap::new()),
            max_cache_age,
        }
    }

    pub fn api(&self) -> &T {
        &self.api
    }

    pub fn clear(&self) {
        self.rate_cache.lock().clear();
    }
}

#[async_trait]
impl<T: TokenPricesService + Send + Sync> TokenPricesService for ExchangeRateCache<T> {
    async fn fetch_token_prices(
        &self,
        chain_id: &str,
        token_addresses: &[Address],
        currency: &str,
    ) -> Result<HashMap<Address, MarketDatum>> {
        self.api
            .fetch_token_prices(chain_id, token_addresses, currency)
            .await
    }

    fn validate_chain_id_supported(&self, chain_id: &str) -> bool {
        self.api.validate_chain_id_supported(chain_id)
    }

    fn validate_currency_supported(&self, currency: &str) -> bool {
        self.api.validate_currency_supported(currency)
    }

    async fn fetch_exchange_rate(&self, from: &str, to: &str) -> Result<f64> {
        let key = (from.to_uppercase(), to.to_uppercase());
        {
            let cache = self.rate_cache.lock();
            if let Some(cached) = cache.get(&key) {
                if cached.fetched_at.elapsed() < self.max_cache_age {
                    return Ok(cached.rate);
                }
            }
        }
        let rate = self.api.fetch_exchange_rate(from, to).await?;
        self.rate_cache.lock().insert(
            key,
            CachedRate {
                rate,
                fetched_at: Instant::now(),
            },
        );
        Ok(rate)
    }
}

impl<T: NamedAPI> NamedAPI for ExchangeRateCache<T> {
    fn get_name(&self) -> String {
        self.api.get_name()
    }
}
