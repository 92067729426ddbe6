use anyhow::{Context, Result};
use itertools::Itertools;
use std::sync::Arc;
use token_rates::{
    cache::ExchangeRateCache,
    collaborators::{NetworkStore, TokensStore},
    exchange_rate::ExchangeRateApi,
    settings::Settings,
    spot_prices::SpotPricesApi,
    TokenRatesController,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();
    log::info!("Starting token-rates...");

    let settings = Settings::load().context("Loading settings")?;
    let exchange_rates = ExchangeRateApi::build(&settings.exchange_rate_api_url)
        .context("Building exchange rate client")?;
    let prices = SpotPricesApi::build(&settings.price_api_url, exchange_rates)
        .context("Building spot prices client")?;
    let service = Arc::new(ExchangeRateCache::new(
        prices,
        settings.exchange_rate_max_age(),
    ));

    let tokens = Arc::new(TokensStore::new(settings.tokens_state()));
    let network = Arc::new(NetworkStore::new(settings.network_state()));
    let controller = TokenRatesController::new(
        service,
        tokens,
        network,
        settings.controller_config().context("Reading controller settings")?,
    );
    let _subscription = controller.listen();

    let chain_ids = settings.networks.keys().cloned().sorted().collect_vec();
    let handle = controller.start_polling(&chain_ids);

    let mut updates = controller.subscribe();
    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                let json = serde_json::to_string(snapshot.as_ref())
                    .context("Serializing market data")?;
                log::info!("Market data v{}: {}", snapshot.version(), json);
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("Waiting for Ctrl-C")?;
                break;
            }
        }
    }

    log::info!("Stopping token-rates...");
    controller.stop_polling_by_handle(handle);
    controller.destroy();
    Ok(())
}
