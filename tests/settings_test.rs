use std::time::Duration;

use token_rates::settings::Settings;

#[test]
fn test_defaults_without_config_file() {
    let settings = Settings::load_from("does-not-exist").unwrap();
    assert_eq!(settings.batch_size, 100);
    assert_eq!(settings.selected_chain_id, "0x1");

    let config = settings.controller_config().unwrap();
    assert_eq!(config.interval, Duration::from_secs(180));
    assert_eq!(config.batch_size.get(), 100);
    assert!(!config.disabled);
    assert_eq!(settings.exchange_rate_max_age(), Duration::from_secs(60));
}

#[test]
fn test_zero_batch_size_is_rejected() {
    let mut settings = Settings::load_from("does-not-exist").unwrap();
    settings.batch_size = 0;
    assert!(settings.controller_config().is_err());
}

#[test]
fn test_static_states_come_from_settings() {
    let settings: Settings = serde_json::from_value(serde_json::json!({
        "interval_secs": 60,
        "batch_size": 50,
        "disabled": false,
        "price_api_url": "http://localhost",
        "exchange_rate_api_url": "http://localhost",
        "exchange_rate_max_age_secs": 10,
        "selected_chain_id": "0x89",
        "networks": { "0x89": "MATIC" },
        "tokens": { "0x89": { "0xaccount": [
            { "address": "0xABC", "symbol": "ABC", "decimals": 18 }
        ] } }
    }))
    .unwrap();

    let network = settings.network_state();
    assert_eq!(network.selected_native_currency(), Some("MATIC"));
    let tokens = settings.tokens_state();
    assert_eq!(
        tokens.token_addresses("0x89").into_iter().collect::<Vec<_>>(),
        vec!["0xabc".to_owned()]
    );
}
