use anyhow::{anyhow, bail, Result};
use log::info;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT},
    Client,
};
use serde_json::Value;

pub const DEFAULT_BASE_URL: &str = "https://min-api.cryptocompare.com";

/// Currency to currency conversion rates.
pub struct ExchangeRateApi {
    client: Client,
    base_url: String,
}

impl ExchangeRateApi {
    pub fn build(base_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(Self {
            client: Client::builder().default_headers(headers).build()?,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// How many `to` one `from` buys.
    pub async fn get_rate(&self, from: &str, to: &str) -> Result<f64> {
        let from = from.to_uppercase();
        let to = to.to_uppercase();
        let res = self
            .client
            .get(&format!("{}/data/price", self.base_url))
            .query(&[("fsym", from.as_str()), ("tsyms", to.as_str())])
            .send()
            .await?
            .error_for_status()?;
        let res: Value = res.json().await?;
        info!("Exchange rate response {:?}", res);
        parse_rate(&res, &to).ok_or_else(|| anyhow!("Cannot parse {}/{} exchange rate", from, to))?
    }
}

fn parse_rate(res: &Value, to: &str) -> Option<Result<f64>> {
    if res["Response"].as_str() == Some("Error") {
        let message = res["Message"].as_str().unwrap_or("unknown error");
        return Some(Err(anyhow!("Exchange rate unavailable: {}", message)));
    }
    res[to].as_f64().map(|rate| {
        if rate <= 0.0 {
            bail!("Exchange rate to {} is {}", to, rate)
        }
        Ok(rate)
    })
}
