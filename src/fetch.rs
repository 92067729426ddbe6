use std::collections::HashMap;
use std::num::NonZeroUsize;

use anyhow::Result;
use futures::future;
use log::debug;

use crate::batch::{batch_count, batches};
use crate::currency::{resolve_currency, CurrencyResolution};
use crate::models::{normalize_address, Address, MarketDatum};
use crate::store::ChainMarketData;
use crate::TokenPricesService;

/// Market data for `token_addresses` on `chain_id`, denominated in
/// `native_currency`.
///
/// Declared incompatibilities (unsupported chain, no usable currency) map
/// every address to `None`. A failing price request fails the whole call and
/// nothing is returned for any batch.
pub async fn fetch_market_data<S>(
    service: &S,
    chain_id: &str,
    token_addresses: &[Address],
    native_currency: &str,
    batch_size: NonZeroUsize,
) -> Result<ChainMarketData>
where
    S: TokenPricesService + Send + Sync + ?Sized,
{
    if !service.validate_chain_id_supported(chain_id) {
        debug!("Chain {} is not supported by the price source", chain_id);
        return Ok(unpriced(token_addresses));
    }

    let resolution = resolve_currency(service, native_currency).await;
    let currency = match resolution.quote_currency() {
        Some(currency) => currency,
        None => return Ok(unpriced(token_addresses)),
    };

    debug!(
        "Requesting {} prices on chain {} in {} batches of up to {}",
        token_addresses.len(),
        chain_id,
        batch_count(token_addresses.len(), batch_size),
        batch_size
    );
    let pending = batches(token_addresses, batch_size)
        .map(|batch| service.fetch_token_prices(chain_id, batch, currency));
    let results = future::join_all(pending).await;

    let mut prices = HashMap::new();
    for result in results {
        prices.extend(
            result?
                .into_iter()
                .map(|(address, datum)| (normalize_address(&address), datum)),
        );
    }

    Ok(token_addresses
        .iter()
        .map(|address| {
            let datum = prices
                .remove(&normalize_address(address))
                .map(|datum| convert(datum, &resolution, native_currency));
            (address.clone(), datum)
        })
        .collect())
}

fn unpriced(token_addresses: &[Address]) -> ChainMarketData {
    token_addresses
        .iter()
        .map(|address| (address.clone(), None))
        .collect()
}

fn convert(
    mut datum: MarketDatum,
    resolution: &CurrencyResolution,
    native_currency: &str,
) -> MarketDatum {
    if let CurrencyResolution::Fallback { factor, .. } = resolution {
        datum.price *= factor;
        datum.currency = native_currency.to_owned();
    }
    datum
}
