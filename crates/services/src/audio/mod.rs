//! Audio service: volume and mute state of the default sink.
//!
//! Polls `wpctl` (WirePlumber) and publishes the state whenever it changed.
//! `None` means no sink could be read, e.g. WirePlumber is not running.

use std::time::Duration;

use futures_signals::signal::{Mutable, MutableSignalCloned};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::command;

const DEFAULT_SINK: &str = "@DEFAULT_AUDIO_SINK@";
const WPCTL_TIMEOUT: Duration = Duration::from_secs(2);

/// Volume of the default sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AudioData {
    /// Volume as a percentage; may exceed 100 when boosted.
    pub volume: u8,
    pub muted: bool,
}

/// Parse `wpctl get-volume` output: `Volume: 0.50` or `Volume: 0.50 [MUTED]`.
pub fn parse_volume(output: &str) -> Option<AudioData> {
    let mut words = output.split_whitespace();
    if words.next()? != "Volume:" {
        return None;
    }
    let volume = words.next()?.parse::<f32>().ok()?;
    Some(AudioData {
        volume: (volume * 100.0).round().clamp(0.0, 255.0) as u8,
        muted: output.contains("[MUTED]"),
    })
}

/// Polling audio subscriber.
#[derive(Debug, Clone)]
pub struct AudioSubscriber {
    data: Mutable<Option<AudioData>>,
}

impl AudioSubscriber {
    /// Start polling every `interval`.
    pub fn new(interval: Duration) -> Self {
        let data = Mutable::new(None);
        tokio::spawn(run_listener(data.clone(), interval));
        info!("Audio subscriber started");
        Self { data }
    }

    pub fn subscribe(&self) -> MutableSignalCloned<Option<AudioData>> {
        self.data.signal_cloned()
    }

    pub fn get(&self) -> Option<AudioData> {
        self.data.get()
    }
}

async fn fetch_audio_data() -> Option<AudioData> {
    match command::run("wpctl", &["get-volume", DEFAULT_SINK], WPCTL_TIMEOUT).await {
        Ok(output) => parse_volume(&output),
        Err(e) => {
            debug!("No sink volume: {:#}", e);
            None
        }
    }
}

async fn run_listener(data: Mutable<Option<AudioData>>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let new_data = fetch_audio_data().await;
        if *data.lock_ref() != new_data {
            debug!("Audio state changed: {:?}", new_data);
            data.set(new_data);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_volume() {
        assert_eq!(
            parse_volume("Volume: 0.50"),
            Some(AudioData {
                volume: 50,
                muted: false,
            })
        );
        assert_eq!(
            parse_volume("Volume: 0.35 [MUTED]\n"),
            Some(AudioData {
                volume: 35,
                muted: true,
            })
        );
        assert_eq!(parse_volume("Volume: 1.20").map(|a| a.volume), Some(120));
    }

    #[test]
    fn test_parse_volume_rejects_garbage() {
        assert_eq!(parse_volume(""), None);
        assert_eq!(parse_volume("Volume:"), None);
        assert_eq!(parse_volume("Volume: loud"), None);
        assert_eq!(parse_volume("Object not found"), None);
    }
}
