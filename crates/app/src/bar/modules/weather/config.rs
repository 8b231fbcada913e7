//! Weather module configuration.

use serde::{Deserialize, Serialize};

/// Unit system of the weather display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

/// Weather module configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub enabled: bool,
    /// OpenWeatherMap API key. Falls back to `OWM_API_KEY` when empty.
    pub api_key: String,
    /// Seconds between fetches.
    pub interval_secs: u64,
    pub units: Units,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: String::new(),
            interval_secs: 600,
            units: Units::Metric,
        }
    }
}

impl WeatherConfig {
    /// The configured key, else `OWM_API_KEY`.
    pub fn resolve_api_key(&self) -> Option<String> {
        if !self.api_key.is_empty() {
            return Some(self.api_key.clone());
        }
        std::env::var("OWM_API_KEY").ok().filter(|key| !key.is_empty())
    }
}
