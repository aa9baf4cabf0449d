//! Tests for loading configuration from disk

use paylink::config::{ENV_SIGNING_SECRET, PaylinkConfig};
use paylink::mint::LinkMinter;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(yaml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_full_file() {
    let file = write_config(
        r#"
server:
  bind_addr: "0.0.0.0:9100"
minter:
  public_origin: "https://billing.acme.test"
  token_ttl_days: 3
client:
  functions_url: "https://fn.acme.test/functions/v1"
  payment_provider_origin: "https://accept.provider.test"
  link_refresh_margin_secs: 120
backend:
  url: "https://db.acme.test"
  anon_key: "anon"
"#,
    );

    let config = PaylinkConfig::from_yaml_file(file.path().to_str().unwrap()).unwrap();

    assert_eq!(config.server.bind_addr, "0.0.0.0:9100");
    assert_eq!(config.minter.token_ttl_days, 3);
    assert_eq!(config.client.link_refresh_margin_secs, 120);
    assert_eq!(config.backend.anon_key.as_deref(), Some("anon"));

    let minter = LinkMinter::from_config(&config.minter).unwrap();
    assert_eq!(minter.ttl(), chrono::Duration::days(3));
    assert_eq!(
        minter.resolve_origin(Some("https://ignored.test")).unwrap(),
        "https://billing.acme.test"
    );
}

#[test]
fn test_empty_file_is_all_defaults() {
    let file = write_config("{}\n");
    let config = PaylinkConfig::from_yaml_file(file.path().to_str().unwrap()).unwrap();
    assert_eq!(config, PaylinkConfig::default());
}

#[test]
fn test_missing_file_names_the_path() {
    let err = PaylinkConfig::from_yaml_file("/nonexistent/paylink.yaml").unwrap_err();
    assert!(format!("{:#}", err).contains("/nonexistent/paylink.yaml"));
}

#[test]
fn test_invalid_url_rejected_on_load() {
    let file = write_config("client:\n  functions_url: \"fn.acme.test\"\n");
    let err = PaylinkConfig::from_yaml_file(file.path().to_str().unwrap()).unwrap_err();
    assert!(format!("{:#}", err).contains("client.functions_url"));
}

#[test]
fn test_oversized_ttl_rejected_on_load() {
    let file = write_config("minter:\n  token_ttl_days: 1000000000\n");
    let err = PaylinkConfig::from_yaml_file(file.path().to_str().unwrap()).unwrap_err();
    assert!(format!("{:#}", err).contains("minter.token_ttl_days must be between 1 and 3650"));
}

#[test]
fn test_negative_refresh_margin_rejected_on_load() {
    let file = write_config("client:\n  link_refresh_margin_secs: -5\n");
    let err = PaylinkConfig::from_yaml_file(file.path().to_str().unwrap()).unwrap_err();
    assert!(format!("{:#}", err).contains("client.link_refresh_margin_secs"));
}

#[test]
fn test_secret_override_changes_tokens() {
    let file = write_config("minter:\n  public_origin: \"https://billing.acme.test\"\n");
    let base = PaylinkConfig::from_yaml_file(file.path().to_str().unwrap()).unwrap();
    let keyed = base
        .clone()
        .apply_overrides(|key| (key == ENV_SIGNING_SECRET).then(|| "s3cret".to_string()))
        .unwrap();

    let invoice = {
        let mut invoice = paylink::core::Invoice::draft("INV-1", uuid::Uuid::new_v4(), 10.0);
        invoice.status = paylink::core::InvoiceStatus::Sent;
        invoice
    };
    let now = chrono::Utc::now();

    let plain = LinkMinter::from_config(&base.minter).unwrap().mint(&invoice, None, now).unwrap();
    let signed = LinkMinter::from_config(&keyed.minter).unwrap().mint(&invoice, None, now).unwrap();
    assert_ne!(plain.url, signed.url);
    assert_eq!(plain.expires_at, signed.expires_at);
}
