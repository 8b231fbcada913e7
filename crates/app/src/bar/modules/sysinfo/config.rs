//! SysInfo module configuration.

use serde::{Deserialize, Serialize};

/// SysInfo module configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SysInfoConfig {
    /// Seconds between samples.
    pub interval_secs: u64,
    /// Also show the home filesystem when it is not on the root device.
    pub show_home_disk: bool,
}

impl Default for SysInfoConfig {
    fn default() -> Self {
        Self {
            interval_secs: 2,
            show_home_disk: true,
        }
    }
}
