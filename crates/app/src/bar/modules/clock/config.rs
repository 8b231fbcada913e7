//! Clock module configuration.

use serde::{Deserialize, Serialize};

/// Clock module configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// `strftime` format of the date segment.
    pub date_format: String,
    /// `strftime` format of the time segment.
    pub time_format: String,
    /// Command spawned by a left click on the date, empty to disable.
    pub calendar_command: Vec<String>,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            date_format: "%a %b %-d".into(),
            time_format: "%H:%M:%S".into(),
            calendar_command: vec!["gsimplecal".into()],
        }
    }
}

/// One clock of the timezones mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimezoneConfig {
    pub label: String,
    /// IANA zone name, e.g. `Europe/Copenhagen`.
    pub zone: String,
}

impl TimezoneConfig {
    fn new(label: &str, zone: &str) -> Self {
        Self {
            label: label.into(),
            zone: zone.into(),
        }
    }

    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("Los Angeles", "America/Los_Angeles"),
            Self::new("New York", "America/New_York"),
            Self::new("UTC", "Etc/UTC"),
            Self::new("Copenhagen", "Europe/Copenhagen"),
            Self::new("Tokyo", "Asia/Tokyo"),
        ]
    }
}
