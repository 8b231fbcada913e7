//! D-Bus proxy for the MPRIS player interface.

use std::collections::HashMap;

use zbus::proxy;
use zbus::zvariant::OwnedValue;

/// `org.mpris.MediaPlayer2.Player`. Every player lives under its own bus
/// name, so proxies are built with an explicit destination.
#[proxy(
    interface = "org.mpris.MediaPlayer2.Player",
    default_path = "/org/mpris/MediaPlayer2",
    assume_defaults = false
)]
pub trait MprisPlayer {
    /// Emitted when the position jumps instead of advancing with playback.
    #[zbus(signal)]
    fn seeked(&self, position: i64) -> zbus::Result<()>;

    #[zbus(property)]
    fn metadata(&self) -> zbus::Result<HashMap<String, OwnedValue>>;

    #[zbus(property)]
    fn playback_status(&self) -> zbus::Result<String>;

    /// Position in microseconds. Players do not signal changes.
    #[zbus(property(emits_changed_signal = "false"))]
    fn position(&self) -> zbus::Result<i64>;
}
