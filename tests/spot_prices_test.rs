use token_rates::{
    exchange_rate::{self, ExchangeRateApi},
    spot_prices::{self, SpotPricesApi},
    TokenPricesService, NATIVE_TOKEN_ADDRESS,
};

fn api() -> SpotPricesApi {
    let rates = ExchangeRateApi::build(exchange_rate::DEFAULT_BASE_URL).unwrap();
    SpotPricesApi::build(spot_prices::DEFAULT_BASE_URL, rates).unwrap()
}

#[test]
fn test_supported_chains_and_currencies() {
    let api = api();
    assert!(api.validate_chain_id_supported("0x1"));
    assert!(api.validate_chain_id_supported("0xA4B1"));
    assert!(!api.validate_chain_id_supported("0x3e7"));
    assert!(api.validate_currency_supported("USD"));
    assert!(api.validate_currency_supported("eth"));
    assert!(!api.validate_currency_supported("MATIC"));
}

#[tokio::test]
#[ignore]
async fn test_spot_prices() {
    let _ = env_logger::builder().is_test(true).try_init();
    let prices = api()
        .fetch_token_prices("0x1", &[NATIVE_TOKEN_ADDRESS.to_owned()], "usd")
        .await
        .map_err(|e| {
            eprintln!("{:?}", e);
            e
        })
        .unwrap();
    assert!(prices[NATIVE_TOKEN_ADDRESS].price > 0.0);
}

#[tokio::test]
#[ignore]
async fn test_exchange_rate() {
    let _ = env_logger::builder().is_test(true).try_init();
    let rate = api().fetch_exchange_rate("ETH", "USD").await.unwrap();
    assert!(rate > 0.0);
}
