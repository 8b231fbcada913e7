//! Network module configuration.

use serde::{Deserialize, Serialize};

/// Network module configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Seconds between counter and SSID polls.
    pub interval_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self { interval_secs: 2 }
    }
}
