use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use itertools::join;
use log::{debug, info};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT},
    Client,
};

use crate::exchange_rate::ExchangeRateApi;
use crate::models::{normalize_address, Address, MarketDatum};
use crate::{NamedAPI, TokenPricesService};

pub const DEFAULT_BASE_URL: &str = "https://price.api.cx.metamask.io";

/// Chains the spot prices API quotes.
pub const SUPPORTED_CHAIN_IDS: &[&str] = &[
    "0x1", "0xa", "0x19", "0x38", "0x64", "0x89", "0xfa", "0x144", "0x505", "0x2105", "0xa4b1",
    "0xa86a", "0xe708", "0x504", "0x4e454152", "0x63564c40",
];

/// Currencies the spot prices API can denominate prices in.
pub const SUPPORTED_CURRENCIES: &[&str] = &[
    "btc", "eth", "ltc", "bch", "bnb", "eos", "xrp", "xlm", "link", "dot", "yfi", "usd", "aed",
    "ars", "aud", "bdt", "bhd", "bmd", "brl", "cad", "chf", "clp", "cny", "czk", "dkk", "eur",
    "gbp", "hkd", "huf", "idr", "ils", "inr", "jpy", "krw", "kwd", "lkr", "mmk", "mxn", "myr",
    "ngn", "nok", "nzd", "php", "pkr", "pln", "rub", "sar", "sek", "sgd", "thb", "try", "twd",
    "uah", "vef", "vnd", "zar", "xdr", "xag", "xau", "bits", "sats",
];

pub struct SpotPricesApi {
    client: Client,
    base_url: String,
    exchange_rates: ExchangeRateApi,
}

impl SpotPricesApi {
    pub fn build(base_url: &str, exchange_rates: ExchangeRateApi) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(Self {
            client: Client::builder().default_headers(headers).build()?,
            base_url: base_url.trim_end_matches('/').to_owned(),
            exchange_rates,
        })
    }
}

fn decimal_chain_id(chain_id: &str) -> Result<u64> {
    let digits = chain_id
        .strip_prefix("0x")
        .ok_or_else(|| anyhow!("Chain id {} is not hex", chain_id))?;
    u64::from_str_radix(digits, 16).with_context(|| format!("Parsing chain id {}", chain_id))
}

#[async_trait]
impl TokenPricesService for SpotPricesApi {
    async fn fetch_token_prices(
        &self,
        chain_id: &str,
        token_addresses: &[Address],
        currency: &str,
    ) -> Result<HashMap<Address, MarketDatum>> {
        let url = format!(
            "{}/v2/chains/{}/spot-prices",
            self.base_url,
            decimal_chain_id(chain_id)?
        );
        debug!("Spot prices called with {:?}", token_addresses);
        let res = self
            .client
            .get(&url)
            .query(&[
                ("tokenAddresses", join(token_addresses, ",").as_str()),
                ("vsCurrency", currency.to_lowercase().as_str()),
                ("includeMarketData", "true"),
            ])
            .send()
            .await?
            .error_for_status()?;
        let res: HashMap<String, Option<MarketDatum>> = res.json().await?;
        info!("Spot prices returned {} entries", res.len());
        Ok(res
            .into_iter()
            .filter_map(|(address, datum)| {
                let address = normalize_address(&address);
                datum.map(|mut datum| {
                    datum.token_address = address.clone();
                    if datum.currency.is_empty() {
                        datum.currency = currency.to_uppercase();
                    }
                    (address, datum)
                })
            })
            .collect())
    }

    fn validate_chain_id_supported(&self, chain_id: &str) -> bool {
        SUPPORTED_CHAIN_IDS
            .iter()
            .any(|supported| supported.eq_ignore_ascii_case(chain_id))
    }

    fn validate_currency_supported(&self, currency: &str) -> bool {
        SUPPORTED_CURRENCIES
            .iter()
            .any(|supported| supported.eq_ignore_ascii_case(currency))
    }

    async fn fetch_exchange_rate(&self, from: &str, to: &str) -> Result<f64> {
        self.exchange_rates.get_rate(from, to).await
    }
}

impl NamedAPI for SpotPricesApi {
    fn get_name(&self) -> String {
        "SpotPrices".to_owned()
    }
}
