use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "config/blueon.json";

const DEFAULT_API_BASE: &str = "http://localhost:3000";
const DEFAULT_WS_URL: &str = "ws://localhost:3000/ws";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_ws_url() -> String {
    DEFAULT_WS_URL.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            ws_url: default_ws_url(),
        }
    }
}

/// Load the config file, falling back to defaults when it is missing or
/// unparsable. `BLUEON_API_BASE` / `BLUEON_WS_URL` override either value.
pub fn load_config(path: &str) -> AppConfig {
    let path = Path::new(path);
    let mut config = match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to parse config file {}: {err}", path.display());
                AppConfig::default()
            }
        },
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            AppConfig::default()
        }
    };

    if let Ok(base) = std::env::var("BLUEON_API_BASE") {
        config.api_base = base;
    }
    if let Ok(url) = std::env::var("BLUEON_WS_URL") {
        config.ws_url = url;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_in_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"api_base":"https://blueon.example"}"#).unwrap();
        assert_eq!(config.api_base, "https://blueon.example");
        assert_eq!(config.ws_url, DEFAULT_WS_URL);
    }
}
