//! D-Bus proxy definitions for the UPower daemon.

use zbus::proxy;
use zbus::zvariant::OwnedValue;

/// Battery charging/discharging state from UPower.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, OwnedValue)]
#[repr(u32)]
pub enum BatteryState {
    #[default]
    Unknown = 0,
    Charging = 1,
    Discharging = 2,
    Empty = 3,
    FullyCharged = 4,
    PendingCharge = 5,
    PendingDischarge = 6,
}

/// Warning level from UPower.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, OwnedValue)]
#[repr(u32)]
pub enum WarningLevel {
    #[default]
    Unknown = 0,
    None = 1,
    Discharging = 2,
    Low = 3,
    Critical = 4,
    Action = 5,
}

#[proxy(
    interface = "org.freedesktop.UPower.Device",
    default_service = "org.freedesktop.UPower",
    assume_defaults = false
)]
pub trait Device {
    #[zbus(property)]
    fn is_present(&self) -> zbus::Result<bool>;

    #[zbus(property)]
    fn percentage(&self) -> zbus::Result<f64>;

    #[zbus(property)]
    fn state(&self) -> zbus::Result<BatteryState>;

    /// Seconds until empty, 0 when unknown.
    #[zbus(property)]
    fn time_to_empty(&self) -> zbus::Result<i64>;

    /// Seconds until full, 0 when unknown.
    #[zbus(property)]
    fn time_to_full(&self) -> zbus::Result<i64>;

    /// Energy available in Wh.
    #[zbus(property)]
    fn energy(&self) -> zbus::Result<f64>;

    /// Energy when full in Wh.
    #[zbus(property)]
    fn energy_full(&self) -> zbus::Result<f64>;

    /// Charge or discharge rate in W, always positive.
    #[zbus(property)]
    fn energy_rate(&self) -> zbus::Result<f64>;

    #[zbus(property)]
    fn warning_level(&self) -> zbus::Result<WarningLevel>;
}

#[proxy(interface = "org.freedesktop.UPower", assume_defaults = true)]
pub trait UPower {
    /// The composite battery of the system.
    #[zbus(object = "Device")]
    fn get_display_device(&self);

    #[zbus(property)]
    fn on_battery(&self) -> zbus::Result<bool>;
}
