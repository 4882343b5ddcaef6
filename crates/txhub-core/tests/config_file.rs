//! Configuration loading from TOML files and environment overrides

use std::io::Write;
use std::time::Duration;
use txhub_core::{EndpointProfile, FormConfig, HubError, TEST_ENDPOINT};

#[test]
fn test_load_partial_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
profile = "test"
show_preview = true
refresh_delay_ms = 0
"#
    )
    .unwrap();

    let config = FormConfig::load(file.path()).unwrap();
    assert_eq!(config.profile, EndpointProfile::Test);
    assert!(config.show_preview);
    assert!(config.auto_fetch);
    assert_eq!(config.refresh_delay(), None);
    assert_eq!(config.id_param, "transactionId");
    assert_eq!(config.endpoint_url().unwrap().as_str(), TEST_ENDPOINT);
}

#[test]
fn test_env_overrides_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("txhub.toml");
    std::fs::write(&path, "refresh_delay_ms = 250\n").unwrap();

    let config = FormConfig::load(&path)
        .unwrap()
        .apply_vars(|key| match key {
            "TXHUB_ENDPOINT" => Some("http://127.0.0.1:8080/hook".into()),
            "TXHUB_ID_PARAM" => Some("tx".into()),
            _ => None,
        })
        .unwrap();

    assert_eq!(config.refresh_delay(), Some(Duration::from_millis(250)));
    assert_eq!(config.endpoint_url().unwrap().as_str(), "http://127.0.0.1:8080/hook");
    assert_eq!(config.id_param, "tx");
}

#[test]
fn test_bad_files_are_config_errors() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        FormConfig::load(dir.path().join("missing.toml")),
        Err(HubError::Config(_))
    ));

    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "profile = [").unwrap();
    assert!(matches!(FormConfig::load(&path), Err(HubError::Config(_))));
}
