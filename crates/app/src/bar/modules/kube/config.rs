//! Kubernetes context module configuration.

use serde::{Deserialize, Serialize};

/// Kubernetes context module configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KubeConfig {
    /// Off by default: without `kubectl` every poll would fail.
    pub enabled: bool,
    pub interval_secs: u64,
    /// Deadline of each `kubectl` call.
    pub timeout_secs: u64,
    /// Widest context shown; longer names keep their end.
    pub max_width: usize,
}

impl Default for KubeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: 1,
            timeout_secs: 2,
            max_width: 40,
        }
    }
}
