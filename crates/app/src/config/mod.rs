//! Application configuration, stored as TOML.

mod persistence;
mod theme;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use crate::bar::modules::{
    ClockConfig, KubeConfig, MediaConfig, NetworkConfig, SysInfoConfig, TimezoneConfig,
    WeatherConfig,
};
pub use theme::{Theme, ThemeConfig};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub theme: ThemeConfig,
    pub clock: ClockConfig,
    pub timezones: Vec<TimezoneConfig>,
    pub media: MediaConfig,
    pub sysinfo: SysInfoConfig,
    pub network: NetworkConfig,
    pub weather: WeatherConfig,
    pub kube: KubeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: ThemeConfig::default(),
            clock: ClockConfig::default(),
            timezones: TimezoneConfig::defaults(),
            media: MediaConfig::default(),
            sysinfo: SysInfoConfig::default(),
            network: NetworkConfig::default(),
            weather: WeatherConfig::default(),
            kube: KubeConfig::default(),
        }
    }
}

impl Config {
    /// Load `path`, or the default location when `None`.
    ///
    /// A missing file is created with the defaults. An unreadable one is
    /// reported and replaced by the defaults for this run.
    pub fn load(path: Option<&Path>) -> Config {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match persistence::default_config_path() {
                Ok(path) => path,
                Err(err) => {
                    tracing::warn!("{}, using defaults", err);
                    return Config::default();
                }
            },
        };

        match persistence::load(&path) {
            Ok(config) => {
                tracing::info!("Loaded config from {}", path.display());
                config
            }
            Err(err) => {
                tracing::warn!("Failed to load config, using defaults: {:#}", err);
                Config::default()
            }
        }
    }

    /// The effective configuration as TOML.
    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roundtrips_through_toml() {
        let encoded = Config::default().to_toml().unwrap();
        let decoded: Config = toml::from_str(&encoded).unwrap();
        assert_eq!(decoded.timezones, TimezoneConfig::defaults());
        assert_eq!(decoded.media.budget, 70);
        assert!(!decoded.kube.enabled);
    }

    #[test]
    fn test_empty_file_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.clock.time_format, "%H:%M:%S");
        assert_eq!(config.timezones.len(), 5);
    }

    #[test]
    fn test_sections_override_defaults() {
        let config: Config = toml::from_str(
            r##"
            timezones = [{ label = "Home", zone = "Europe/Berlin" }]

            [weather]
            units = "imperial"
            interval_secs = 900

            [theme]
            bad = "#FF0000"
            "##,
        )
        .unwrap();
        assert_eq!(config.timezones.len(), 1);
        assert_eq!(config.weather.interval_secs, 900);
        assert_eq!(
            config.weather.units,
            crate::bar::modules::weather::Units::Imperial
        );
        assert_eq!(config.theme.bad, "#FF0000");
        assert_eq!(config.theme.good, ThemeConfig::default().good);
    }
}
