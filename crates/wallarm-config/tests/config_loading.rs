use std::{env, fs};

use wallarm_config::{ConfigError, load_config, load_config_with_env};

const TOKEN: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789+/";

#[test]
fn file_then_env_overrides_and_validation() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("config.toml");

    let toml_content = format!(
        r#"
api_host = "https://audit.api.wallarm.com"
api_token = "{TOKEN}"
client_id = 1001
retries = 2
min_backoff = 1
max_backoff = 3
"#
    );
    fs::write(&path, toml_content).expect("write toml");

    // 1) File parses, unset keys keep their defaults
    let cfg = load_config(path.to_str()).expect("should parse config");
    assert_eq!(cfg.api_host, "https://audit.api.wallarm.com");
    assert_eq!(cfg.client_id, Some(1001));
    assert_eq!(cfg.retries, 2);
    assert!(!cfg.api_client_logging);
    assert!(cfg.credentials().is_ok());

    // 2) Env override wins over the file
    unsafe {
        env::set_var("WALLARM_API_RETRIES", "6");
        env::set_var("WALLARM_API_CLIENT_LOGGING", "true");
    }
    let cfg_env = load_config(path.to_str()).expect("should parse config with env overrides");
    assert_eq!(cfg_env.retries, 6);
    assert!(cfg_env.api_client_logging);
    unsafe {
        env::remove_var("WALLARM_API_RETRIES");
        env::remove_var("WALLARM_API_CLIENT_LOGGING");
    }

    // 3) Invalid values fail validation
    let bad = load_config_with_env(path.to_str(), |name| {
        (name == "WALLARM_API_MIN_BACKOFF").then(|| "10".to_string())
    });
    assert!(matches!(bad, Err(ConfigError::Invalid(_))));

    let conflicting = load_config_with_env(path.to_str(), |name| {
        (name == "WALLARM_API_UUID").then(|| "1b2c3d4e-0000-4000-8000-000000000000".to_string())
    });
    assert!(matches!(conflicting, Err(ConfigError::Invalid(_))));
}

#[test]
fn explicit_missing_file_is_an_error() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("absent.toml");
    let err = load_config_with_env(path.to_str(), |_| None).unwrap_err();
    assert!(matches!(err, ConfigError::Build(_)));
}

#[test]
fn written_config_round_trips() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("config.toml");
    let cfg = wallarm_config::ProviderConfig {
        api_uuid: Some("1b2c3d4e-0000-4000-8000-000000000000".into()),
        api_secret: Some("secret".into()),
        client_id: Some(5),
        ..Default::default()
    };
    fs::write(&path, toml::to_string(&cfg).expect("serialize")).expect("write toml");

    let loaded = load_config_with_env(path.to_str(), |_| None).expect("load");
    assert_eq!(loaded, cfg);
}
