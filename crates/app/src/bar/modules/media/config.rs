//! Media module configuration.

use serde::{Deserialize, Serialize};

/// Media module configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Width of `artist - title`, in graphemes.
    pub budget: usize,
    /// Width the artist may always use.
    pub primary_cap: usize,
    /// Seconds between volume samples.
    pub volume_interval_secs: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            budget: 70,
            primary_cap: 35,
            volume_interval_secs: 1,
        }
    }
}
