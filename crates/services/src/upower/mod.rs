//! UPower service for battery monitoring.
//!
//! The subscriber reads the composite display device once at startup and
//! then refetches it whenever UPower reports a property change.

pub mod dbus;

use std::time::Duration;

use anyhow::Result;
use futures_signals::signal::{Mutable, MutableSignalCloned};
use futures_util::StreamExt;
use futures_util::stream::select_all;
use tracing::{debug, error, info, warn};
use zbus::Connection;

pub use dbus::{BatteryState, WarningLevel};
use dbus::{DeviceProxy, UPowerProxy};

/// Battery data from UPower.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatteryData {
    /// Charge percentage (0-100).
    pub percentage: f64,
    pub state: BatteryState,
    pub time_to_empty: Option<Duration>,
    pub time_to_full: Option<Duration>,
    /// Energy now, in Wh.
    pub energy: f64,
    /// Energy when full, in Wh.
    pub energy_full: f64,
    /// Unsigned rate in W.
    pub energy_rate: f64,
    pub warning_level: WarningLevel,
}

impl BatteryData {
    pub fn is_charging(&self) -> bool {
        matches!(
            self.state,
            BatteryState::Charging | BatteryState::PendingCharge
        )
    }

    pub fn is_discharging(&self) -> bool {
        matches!(
            self.state,
            BatteryState::Discharging | BatteryState::PendingDischarge | BatteryState::Empty
        )
    }

    /// Whole-number charge, clamped to 0-100.
    pub fn remaining_pct(&self) -> u8 {
        self.percentage.round().clamp(0.0, 100.0) as u8
    }

    /// Time until full while charging, until empty otherwise.
    pub fn remaining_time(&self) -> Duration {
        let time = if self.is_charging() {
            self.time_to_full
        } else {
            self.time_to_empty
        };
        time.unwrap_or_default()
    }

    /// Power in W, negative while discharging.
    pub fn signed_power(&self) -> f64 {
        if self.is_discharging() {
            -self.energy_rate
        } else {
            self.energy_rate
        }
    }
}

/// Complete UPower service data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UPowerData {
    /// Battery data, `None` without a battery.
    pub battery: Option<BatteryData>,
    pub on_battery: bool,
}

impl UPowerData {
    async fn fetch(conn: &Connection) -> Result<Self> {
        let upower = UPowerProxy::new(conn).await?;
        let device = display_device(conn, &upower).await?;

        let battery = if device.is_present().await.unwrap_or(false) {
            Some(fetch_battery_data(&device).await)
        } else {
            None
        };
        let on_battery = upower.on_battery().await.unwrap_or(false);

        Ok(Self {
            battery,
            on_battery,
        })
    }
}

fn seconds(value: i64) -> Option<Duration> {
    (value > 0).then(|| Duration::from_secs(value as u64))
}

async fn display_device(
    conn: &Connection,
    upower: &UPowerProxy<'_>,
) -> Result<DeviceProxy<'static>> {
    let device = upower.get_display_device().await?;
    Ok(DeviceProxy::builder(conn)
        .path(device.inner().path().to_owned())?
        .build()
        .await?)
}

async fn fetch_battery_data(device: &DeviceProxy<'_>) -> BatteryData {
    BatteryData {
        percentage: device.percentage().await.unwrap_or(0.0),
        state: device.state().await.unwrap_or_default(),
        time_to_empty: device.time_to_empty().await.ok().and_then(seconds),
        time_to_full: device.time_to_full().await.ok().and_then(seconds),
        energy: device.energy().await.unwrap_or(0.0),
        energy_full: device.energy_full().await.unwrap_or(0.0),
        energy_rate: device.energy_rate().await.unwrap_or(0.0),
        warning_level: device.warning_level().await.unwrap_or_default(),
    }
}

/// Event-driven UPower subscriber.
#[derive(Debug, Clone)]
pub struct UPowerSubscriber {
    data: Mutable<UPowerData>,
    conn: Connection,
}

impl UPowerSubscriber {
    /// Connect to the system bus and start monitoring.
    pub async fn new() -> Result<Self> {
        let conn = Connection::system().await?;

        let data = match UPowerData::fetch(&conn).await {
            Ok(data) => data,
            Err(e) => {
                error!("Failed to initialize UPower data: {}", e);
                UPowerData::default()
            }
        };

        let subscriber = Self {
            data: Mutable::new(data),
            conn,
        };

        let task = subscriber.clone();
        tokio::spawn(async move {
            if let Err(e) = task.run().await {
                error!("UPower subscriber error: {}", e);
            }
        });

        Ok(subscriber)
    }

    pub fn subscribe(&self) -> MutableSignalCloned<UPowerData> {
        self.data.signal_cloned()
    }

    pub fn get(&self) -> UPowerData {
        self.data.get_cloned()
    }

    async fn refresh(&self) {
        match UPowerData::fetch(&self.conn).await {
            Ok(data) => {
                self.data.set_neq(data);
            }
            Err(e) => warn!("Failed to refresh UPower data: {}", e),
        }
    }

    async fn run(&self) -> Result<()> {
        info!("UPower subscriber started");

        let upower = UPowerProxy::new(&self.conn).await?;
        let device = display_device(&self.conn, &upower).await?;

        let mut changes = select_all(vec![
            device.receive_percentage_changed().await.map(|_| "percentage").boxed(),
            device.receive_state_changed().await.map(|_| "state").boxed(),
            device
                .receive_time_to_empty_changed()
                .await
                .map(|_| "time-to-empty")
                .boxed(),
            device
                .receive_time_to_full_changed()
                .await
                .map(|_| "time-to-full")
                .boxed(),
            device.receive_energy_changed().await.map(|_| "energy").boxed(),
            device
                .receive_energy_rate_changed()
                .await
                .map(|_| "energy-rate")
                .boxed(),
            device
                .receive_is_present_changed()
                .await
                .map(|_| "present")
                .boxed(),
            upower
                .receive_on_battery_changed()
                .await
                .map(|_| "on-battery")
                .boxed(),
        ]);

        while let Some(property) = changes.next().await {
            debug!("UPower {} changed", property);
            self.refresh().await;
        }

        warn!("UPower event stream ended unexpectedly");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn battery(state: BatteryState) -> BatteryData {
        BatteryData {
            percentage: 42.6,
            state,
            time_to_empty: Some(Duration::from_secs(3 * 3600 + 25 * 60)),
            time_to_full: Some(Duration::from_secs(40 * 60)),
            energy: 21.3,
            energy_full: 50.0,
            energy_rate: 7.25,
            warning_level: WarningLevel::None,
        }
    }

    #[test]
    fn test_remaining_time_follows_state() {
        assert_eq!(
            battery(BatteryState::Discharging).remaining_time(),
            Duration::from_secs(3 * 3600 + 25 * 60)
        );
        assert_eq!(
            battery(BatteryState::Charging).remaining_time(),
            Duration::from_secs(40 * 60)
        );
    }

    #[test]
    fn test_signed_power() {
        assert_eq!(battery(BatteryState::Discharging).signed_power(), -7.25);
        assert_eq!(battery(BatteryState::Charging).signed_power(), 7.25);
    }

    #[test]
    fn test_remaining_pct_rounds_and_clamps() {
        assert_eq!(battery(BatteryState::Charging).remaining_pct(), 43);
        let mut over = battery(BatteryState::FullyCharged);
        over.percentage = 100.4;
        assert_eq!(over.remaining_pct(), 100);
    }

    #[test]
    fn test_seconds_ignores_unknown() {
        assert_eq!(seconds(0), None);
        assert_eq!(seconds(-1), None);
        assert_eq!(seconds(90), Some(Duration::from_secs(90)));
    }
}
