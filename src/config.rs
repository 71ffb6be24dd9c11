use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_USER_AGENT: &str = concat!("nominatim-gateway/", env!("CARGO_PKG_VERSION"));

/// Settings for one upstream Nominatim target.
///
/// Every field has a default, so a TOML file only needs to name what it
/// overrides.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GeocoderConfig {
    pub base_url: String,
    /// Sent as the User-Agent header; the public instance requires a real contact.
    pub user_agent: String,
    /// Passed as the `email` parameter on every request when set.
    pub email: Option<String>,
    pub min_interval_secs: f64,
    pub cache_ttl_secs: u64,
    pub cache_max_entries: usize,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_delay_secs: f64,
    pub max_backoff_secs: f64,
    /// Hard cap on per-request result limits.
    pub max_limit: u32,
    /// Maximum number of queries in a batch or route.
    pub batch_max: usize,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            email: None,
            min_interval_secs: 1.0,
            cache_ttl_secs: 3600,
            cache_max_entries: 1000,
            timeout_secs: 30,
            max_retries: 3,
            retry_base_delay_secs: 2.0,
            max_backoff_secs: 30.0,
            max_limit: 10,
            batch_max: 50,
        }
    }
}

impl GeocoderConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: GeocoderConfig =
            toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    pub fn min_interval(&self) -> Duration {
        secs(self.min_interval_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        secs(self.retry_base_delay_secs)
    }

    pub fn max_backoff(&self) -> Duration {
        secs(self.max_backoff_secs)
    }
}

// Negative or NaN values from a config file collapse to zero.
fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}
