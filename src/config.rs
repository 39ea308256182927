use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

const DEFAULT_FILE: &str = "dmarc-summary";
const ENV_PREFIX: &str = "DMARC_SUMMARY";

/// Client settings, layered from defaults, an optional file and the
/// environment (`DMARC_SUMMARY__BASE_URL` and so on).
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Root of the report server, e.g. `https://dmarc.example.com/`.
    pub base_url: String,
    /// Script serving both the options and the report modes.
    pub endpoint: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Extra headers sent with every request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost/".to_string(),
            endpoint: "summary.php".to_string(),
            timeout_secs: 30,
            user_agent: concat!("dmarc-summary/", env!("CARGO_PKG_VERSION")).to_string(),
            headers: BTreeMap::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Configuration file error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

impl Config {
    /// Load configuration; an explicit path must exist, the default file may not.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigLoadError> {
        let defaults = Config::default();
        let mut builder = ::config::Config::builder()
            .set_default("base_url", defaults.base_url)?
            .set_default("endpoint", defaults.endpoint)?
            .set_default("timeout_secs", defaults.timeout_secs as i64)?
            .set_default("user_agent", defaults.user_agent)?;

        builder = match path {
            Some(path) => builder.add_source(::config::File::from(path).required(true)),
            None => builder.add_source(::config::File::with_name(DEFAULT_FILE).required(false)),
        };
        builder = builder.add_source(::config::Environment::with_prefix(ENV_PREFIX).separator("__"));

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigLoadError::Validation("endpoint must not be empty".into()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigLoadError::Validation(
                "timeout_secs must be greater than 0".into(),
            ));
        }
        url::Url::parse(&self.base_url)
            .map_err(|e| ConfigLoadError::Validation(format!("base_url: {}", e)))?;
        Ok(())
    }
}
