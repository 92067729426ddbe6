use log::{debug, warn};

use crate::{TokenPricesService, FALLBACK_CURRENCY};

/// How prices for a requested native currency are obtained.
#[derive(Debug, Clone, PartialEq)]
pub enum CurrencyResolution {
    /// Quote directly in the requested currency.
    Direct(String),
    /// Quote in `base`, then multiply prices by `factor`.
    Fallback { base: String, factor: f64 },
    /// No way to price in the requested currency this cycle.
    Unavailable,
}

impl CurrencyResolution {
    /// Currency to send to the price source, if any.
    pub fn quote_currency(&self) -> Option<&str> {
        match self {
            Self::Direct(currency) => Some(currency),
            Self::Fallback { base, .. } => Some(base),
            Self::Unavailable => None,
        }
    }
}

pub async fn resolve_currency<S>(service: &S, native_currency: &str) -> CurrencyResolution
where
    S: TokenPricesService + Send + Sync + ?Sized,
{
    if service.validate_currency_supported(native_currency) {
        return CurrencyResolution::Direct(native_currency.to_owned());
    }
    match service
        .fetch_exchange_rate(FALLBACK_CURRENCY, native_currency)
        .await
    {
        Ok(rate) if rate.is_finite() && rate > 0.0 => {
            debug!(
                "Pricing {} through {} at rate {}",
                native_currency, FALLBACK_CURRENCY, rate
            );
            CurrencyResolution::Fallback {
                base: FALLBACK_CURRENCY.to_owned(),
                factor: rate,
            }
        }
        Ok(rate) => {
            warn!(
                "Unusable {}/{} rate {}",
                FALLBACK_CURRENCY, native_currency, rate
            );
            CurrencyResolution::Unavailable
        }
        Err(error) => {
            warn!(
                "No {}/{} rate available: {:#}",
                FALLBACK_CURRENCY, native_currency, error
            );
            CurrencyResolution::Unavailable
        }
    }
}
