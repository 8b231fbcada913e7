//! Data sources for the bar: D-Bus subscribers, pollers and one-off fetches.
//!
//! Subscribers keep their latest state in a `futures_signals` `Mutable` and
//! update it from background tasks. Bar modules turn those signals into
//! segments.

pub mod audio;
pub mod command;
pub mod mpris;
pub mod network;
pub mod sysinfo;
pub mod upower;
pub mod weather;

use std::time::Duration;

use tracing::warn;

pub use audio::{AudioData, AudioSubscriber};
pub use mpris::{MprisData, MprisPlayerData, MprisSubscriber, PlaybackStatus, TrackMetadata};
pub use network::{NetworkData, NetworkSubscriber};
pub use self::sysinfo::{DiskInfo, MemoryInfo, SysInfoData, SysInfoSubscriber};
pub use upower::{BatteryData, BatteryState, UPowerData, UPowerSubscriber, WarningLevel};
pub use weather::{Condition, Weather, WeatherClient};

/// Polling intervals of the polled services.
#[derive(Debug, Clone, Copy)]
pub struct Intervals {
    pub sysinfo: Duration,
    pub network: Duration,
    pub audio: Duration,
}

/// Shared services container, initialized once at startup.
///
/// Bus-backed services are optional: a machine without UPower or a session
/// bus still gets a bar, just without those modules.
#[derive(Debug, Clone)]
pub struct Services {
    pub upower: Option<UPowerSubscriber>,
    pub mpris: Option<MprisSubscriber>,
    pub sysinfo: SysInfoSubscriber,
    pub network: NetworkSubscriber,
    pub audio: AudioSubscriber,
}

impl Services {
    pub async fn new(intervals: Intervals) -> Self {
        let upower = UPowerSubscriber::new()
            .await
            .inspect_err(|e| warn!("UPower unavailable: {}", e))
            .ok();
        let mpris = MprisSubscriber::new()
            .await
            .inspect_err(|e| warn!("MPRIS unavailable: {}", e))
            .ok();
        let sysinfo = SysInfoSubscriber::new(intervals.sysinfo);
        let network = NetworkSubscriber::new(intervals.network).await;
        let audio = AudioSubscriber::new(intervals.audio);

        Self {
            upower,
            mpris,
            sysinfo,
            network,
            audio,
        }
    }
}
