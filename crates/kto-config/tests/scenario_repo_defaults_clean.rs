use kto_config::{load_layered_yaml, report_unused_keys, UnusedKeyPolicy};

/// The shipped defaults must load, validate, and use only consumed keys.
#[test]
fn repo_defaults_are_clean() {
    let base = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("config/defaults/base.yaml");
    let base_s = base.to_string_lossy().to_string();

    let loaded = load_layered_yaml(&[base_s.as_str()]).unwrap();
    report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail).unwrap();

    let cfg = loaded.app_config().unwrap();
    assert_eq!(cfg.ledger.base_currency, "EUR");
    assert_eq!(cfg.query.macros.len(), 2);
    assert_eq!(cfg.quotes.api_key_env.as_deref(), Some("KTO_QUOTES_API_KEY"));
}
