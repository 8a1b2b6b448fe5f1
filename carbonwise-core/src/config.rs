//! Configuration system for Carbonwise.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment -> CLI args.
//! Configuration is loaded from `~/.config/carbonwise/config.toml` and/or
//! `.carbonwise/config.toml` in the workspace directory.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Production CodeCarbon API endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://api.codecarbon.io";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CarbonwiseConfig {
    pub api: ApiConfig,
    pub tracker: TrackerConfig,
}

/// Remote API access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// File written by `codecarbon login`; relative paths resolve against
    /// the process working directory.
    pub credentials_path: PathBuf,
    /// Project API token. Takes precedence over the credentials file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: 20,
            credentials_path: PathBuf::from("credentials.json"),
            api_token: None,
        }
    }
}

/// Local tracking sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub project_name: String,
    /// Default interval between power samples when a caller gives none.
    pub measure_power_secs: u64,
    /// Assumed average power draw of the host, in watts.
    pub power_watts: f64,
    /// Grid carbon intensity, in kg CO2e per kWh.
    pub carbon_intensity_kg_per_kwh: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            project_name: "mcp-codecarbon-tracking".to_string(),
            measure_power_secs: 15,
            power_watts: 45.0,
            carbon_intensity_kg_per_kwh: 0.475,
        }
    }
}

impl CarbonwiseConfig {
    /// Reject values that would make the client or tracker misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "api.base_url must not be empty".into(),
            });
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                message: "api.timeout_secs must be greater than zero".into(),
            });
        }
        if self.tracker.measure_power_secs == 0 {
            return Err(ConfigError::Invalid {
                message: "tracker.measure_power_secs must be greater than zero".into(),
            });
        }
        if !(self.tracker.power_watts >= 0.0 && self.tracker.carbon_intensity_kg_per_kwh >= 0.0) {
            return Err(ConfigError::Invalid {
                message: "tracker.power_watts and tracker.carbon_intensity_kg_per_kwh must be non-negative".into(),
            });
        }
        Ok(())
    }

    /// Render the effective configuration as TOML, with the API token masked.
    pub fn to_redacted_toml(&self) -> Result<String, ConfigError> {
        let mut shown = self.clone();
        if shown.api.api_token.is_some() {
            shown.api.api_token = Some("********".into());
        }
        toml::to_string_pretty(&shown).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
    }
}

fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "carbonwise", "carbonwise")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `CARBONWISE_`)
/// 3. Workspace-local config (`.carbonwise/config.toml`)
/// 4. User config (`~/.config/carbonwise/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&CarbonwiseConfig>,
) -> Result<CarbonwiseConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(CarbonwiseConfig::default()));

    if let Some(user_config) = user_config_path() {
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(".carbonwise").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // CARBONWISE_API__BASE_URL, CARBONWISE_TRACKER__POWER_WATTS, ...
    figment = figment.merge(Env::prefixed("CARBONWISE_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    figment.extract().map_err(Box::new)
}
