//! The configuration structs used to build the AppConfig, and their impls.
use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;
use strum_macros::AsRefStr;

use crate::config::{ConfigError, ConfigResult};

// ###################################
// ->   STRUCTS
// ###################################
#[derive(AsRefStr, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Local,
    Production,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AppConfig {
    /// Not read from the config files, set from `APP_ENVIRONMENT`.
    #[serde(skip)]
    pub environment: Environment,
    pub net_config: NetConfig,
    pub guard_config: GuardConfig,
    pub cors_config: CorsConfig,
    pub provider_config: ProviderConfig,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NetConfig {
    pub host: [u8; 4],
    pub app_port: u16,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct GuardConfig {
    pub rate_limit_max: usize,
    pub rate_limit_window_secs: u64,
    pub max_body_bytes: usize,
    pub honeypot_delay_min_millis: u64,
    pub honeypot_delay_max_millis: u64,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CorsConfig {
    /// Production origins, always allowed.
    pub allowed_origins: Vec<String>,
    /// Only allowed outside of production.
    #[serde(default)]
    pub dev_origins: Vec<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ProviderConfig {
    pub url: String,
    pub timeout_millis: u64,
    pub api_key: Option<SecretString>,
    pub form_id: Option<String>,
}

// ###################################
// ->   IMPLs
// ###################################
impl AppConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        let guard = &self.guard_config;
        if guard.rate_limit_max == 0 || guard.rate_limit_window_secs == 0 {
            return Err(ConfigError::InvalidRateLimit {
                max: guard.rate_limit_max,
                window_secs: guard.rate_limit_window_secs,
            });
        }
        if guard.honeypot_delay_min_millis > guard.honeypot_delay_max_millis {
            return Err(ConfigError::InvalidHoneypotRange {
                min: guard.honeypot_delay_min_millis,
                max: guard.honeypot_delay_max_millis,
            });
        }
        reqwest::Url::parse(&self.provider_config.url)
            .map_err(|er| ConfigError::InvalidProviderUrl(er.to_string()))?;

        Ok(())
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            rate_limit_max: 5,
            rate_limit_window_secs: 60,
            max_body_bytes: 1024,
            honeypot_delay_min_millis: 200,
            honeypot_delay_max_millis: 600,
        }
    }
}

impl GuardConfig {
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_millis)
    }
}

// ###################################
// ->   TRY FROMs
// ###################################
impl TryFrom<String> for Environment {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            _ => Err(Self::Error::StringToEnvironmentFail(value)),
        }
    }
}
