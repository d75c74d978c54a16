//! Provider configuration: API endpoint, credentials, client id and retry
//! tuning, read from an optional TOML file and the `WALLARM_*` environment.

mod error;

use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use wallarm_api::{Credentials, DEFAULT_API_HOST, RetryPolicy};

pub use error::ConfigError;

pub type Result<T> = std::result::Result<T, ConfigError>;

/// API tokens are 64 base64 characters.
static TOKEN_REGEX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^[A-Za-z0-9+/]{64}$").expect("Invalid API token regex")
});

/// Environment variable feeding each configuration key.
pub const ENV_VARS: &[(&str, &str)] = &[
    ("WALLARM_API_HOST", "api_host"),
    ("WALLARM_API_TOKEN", "api_token"),
    ("WALLARM_API_UUID", "api_uuid"),
    ("WALLARM_API_SECRET", "api_secret"),
    ("WALLARM_API_CLIENT_ID", "client_id"),
    ("WALLARM_API_RETRIES", "retries"),
    ("WALLARM_API_MIN_BACKOFF", "min_backoff"),
    ("WALLARM_API_MAX_BACKOFF", "max_backoff"),
    ("WALLARM_API_CLIENT_LOGGING", "api_client_logging"),
    ("WALLARM_IGNORE_EXISTING_RESOURCES", "ignore_existing"),
];

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderConfig {
    #[serde(default = "default_api_host")]
    pub api_host: String,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default)]
    pub api_uuid: Option<String>,
    #[serde(default)]
    pub api_secret: Option<String>,
    /// Default client for every operation; looked up from the user when unset.
    #[serde(default)]
    pub client_id: Option<i64>,
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Seconds.
    #[serde(default = "default_min_backoff")]
    pub min_backoff: u64,
    /// Seconds.
    #[serde(default = "default_max_backoff")]
    pub max_backoff: u64,
    #[serde(default)]
    pub api_client_logging: bool,
    #[serde(default)]
    pub ignore_existing: bool,
}

fn default_api_host() -> String {
    DEFAULT_API_HOST.to_string()
}

fn default_retries() -> u32 {
    3
}

fn default_min_backoff() -> u64 {
    1
}

fn default_max_backoff() -> u64 {
    5
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_host: default_api_host(),
            api_token: None,
            api_uuid: None,
            api_secret: None,
            client_id: None,
            retries: default_retries(),
            min_backoff: default_min_backoff(),
            max_backoff: default_max_backoff(),
            api_client_logging: false,
            ignore_existing: false,
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redacted = self.redacted();
        f.debug_struct("ProviderConfig")
            .field("api_host", &redacted.api_host)
            .field("api_token", &redacted.api_token)
            .field("api_uuid", &redacted.api_uuid)
            .field("api_secret", &redacted.api_secret)
            .field("client_id", &redacted.client_id)
            .field("retries", &redacted.retries)
            .field("min_backoff", &redacted.min_backoff)
            .field("max_backoff", &redacted.max_backoff)
            .field("api_client_logging", &redacted.api_client_logging)
            .field("ignore_existing", &redacted.ignore_existing)
            .finish()
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.api_host)
            .map_err(|e| ConfigError::invalid(format!("api_host {:?}: {e}", self.api_host)))?;
        if url.scheme() != "https" {
            return Err(ConfigError::invalid(format!(
                "api_host must be an https URL, got {:?}",
                self.api_host
            )));
        }

        if let Some(token) = present(&self.api_token) {
            if !TOKEN_REGEX.is_match(token) {
                return Err(ConfigError::invalid(
                    "api_token must be 64 base64 characters",
                ));
            }
            if present(&self.api_uuid).is_some() || present(&self.api_secret).is_some() {
                return Err(ConfigError::invalid(
                    "api_token conflicts with api_uuid and api_secret",
                ));
            }
        }

        if let Some(raw) = present(&self.api_uuid) {
            uuid::Uuid::parse_str(raw)
                .map_err(|e| ConfigError::invalid(format!("api_uuid {raw:?}: {e}")))?;
        }

        if self.client_id.is_some_and(|id| id <= 0) {
            return Err(ConfigError::invalid("client_id must be > 0"));
        }

        if self.min_backoff > self.max_backoff {
            return Err(ConfigError::invalid(
                "min_backoff must be <= max_backoff",
            ));
        }
        Ok(())
    }

    pub fn credentials(&self) -> Result<Credentials> {
        Credentials::from_parts(
            self.api_token.as_deref(),
            self.api_uuid.as_deref(),
            self.api_secret.as_deref(),
        )
        .map_err(|_| ConfigError::MissingCredentials)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.retries,
            min_backoff: Duration::from_secs(self.min_backoff),
            max_backoff: Duration::from_secs(self.max_backoff),
        }
    }

    /// Copy with secrets masked, for display.
    pub fn redacted(&self) -> Self {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "***".to_string());
        Self {
            api_token: mask(&self.api_token),
            api_secret: mask(&self.api_secret),
            ..self.clone()
        }
    }
}

/// `~/.wallarm/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".wallarm").join("config.toml"))
}

/// Load configuration from `path` (or the default path when it exists) and
/// the process environment, then validate it.
pub fn load_config(path: Option<&str>) -> Result<ProviderConfig> {
    load_config_with_env(path, |name| std::env::var(name).ok())
}

/// Like [`load_config`] with an explicit environment lookup.
pub fn load_config_with_env<F>(path: Option<&str>, env: F) -> Result<ProviderConfig>
where
    F: Fn(&str) -> Option<String>,
{
    use config::{Config, File, FileFormat};

    let mut builder = Config::builder();
    match path {
        Some(p) => {
            // An explicit path must exist.
            builder = builder.add_source(File::new(p, FileFormat::Toml).required(true));
        }
        None => {
            if let Some(default_path) = default_config_path().filter(|p| p.exists()) {
                tracing::debug!(path = %default_path.display(), "using default config file");
                builder = builder.add_source(File::from(default_path).format(FileFormat::Toml));
            }
        }
    }

    for (var, key) in ENV_VARS {
        let value = env(var).filter(|v| !v.is_empty());
        builder = builder.set_override_option(*key, value)?;
    }

    let merged: ProviderConfig = builder.build()?.try_deserialize()?;
    merged.validate()?;
    Ok(merged)
}
