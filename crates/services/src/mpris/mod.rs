//! MPRIS media player service for playback state.
//!
//! Position is not signalled by players, so every snapshot records when it
//! was taken; [`MprisPlayerData::position_at`] extrapolates from there while
//! playing.

mod dbus;

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use dbus::MprisPlayerProxy;
use futures_signals::signal::{Mutable, MutableSignalCloned};
use futures_util::StreamExt;
use futures_util::future::join_all;
use futures_util::stream::select_all;
use tracing::{debug, error, info, trace, warn};
use zbus::{Connection, fdo::DBusProxy, zvariant::OwnedValue};

const MPRIS_PLAYER_SERVICE_PREFIX: &str = "org.mpris.MediaPlayer2.";
const EVENT_DEBOUNCE_MS: u64 = 200;

#[derive(Debug, Clone)]
enum MprisEvent {
    TopologyChanged,
    Changed(String),
}

/// Current playback state reported by MPRIS.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Playing,
    Paused,
    #[default]
    Stopped,
}

impl From<&str> for PlaybackStatus {
    fn from(value: &str) -> Self {
        match value {
            "Playing" => Self::Playing,
            "Paused" => Self::Paused,
            _ => Self::Stopped,
        }
    }
}

/// Track metadata used for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackMetadata {
    pub artist: String,
    pub title: String,
    pub length: Option<Duration>,
}

impl From<&HashMap<String, OwnedValue>> for TrackMetadata {
    fn from(value: &HashMap<String, OwnedValue>) -> Self {
        let artist = value
            .get("xesam:artist")
            .and_then(|v| Vec::<String>::try_from(v.clone()).ok())
            .map(|artists| artists.join(", "))
            .unwrap_or_default();
        let title = value
            .get("xesam:title")
            .and_then(|v| String::try_from(v.clone()).ok())
            .unwrap_or_default();
        let length = value
            .get("mpris:length")
            .and_then(|v| {
                i64::try_from(v.clone())
                    .ok()
                    .or_else(|| u64::try_from(v.clone()).ok().map(|n| n as i64))
            })
            .and_then(microseconds);

        Self {
            artist,
            title,
            length,
        }
    }
}

fn microseconds(us: i64) -> Option<Duration> {
    (us > 0).then(|| Duration::from_micros(us as u64))
}

/// Per-player snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct MprisPlayerData {
    pub service: String,
    pub track: TrackMetadata,
    pub state: PlaybackStatus,
    /// Position when the snapshot was taken.
    pub position: Duration,
    pub fetched_at: Instant,
}

impl MprisPlayerData {
    /// Playback position at `now`, advancing while playing and never past
    /// the track length.
    pub fn position_at(&self, now: Instant) -> Duration {
        let position = match self.state {
            PlaybackStatus::Playing => {
                self.position + now.saturating_duration_since(self.fetched_at)
            }
            _ => self.position,
        };
        match self.track.length {
            Some(length) => position.min(length),
            None => position,
        }
    }
}

/// Complete MPRIS service state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MprisData {
    pub players: Vec<MprisPlayerData>,
}

impl MprisData {
    /// The player worth showing: the first playing one, else the first
    /// paused one.
    pub fn active(&self) -> Option<&MprisPlayerData> {
        self.players
            .iter()
            .find(|p| p.state == PlaybackStatus::Playing)
            .or_else(|| {
                self.players
                    .iter()
                    .find(|p| p.state == PlaybackStatus::Paused)
            })
    }
}

/// Reactive MPRIS subscriber.
#[derive(Debug, Clone)]
pub struct MprisSubscriber {
    data: Mutable<MprisData>,
}

impl MprisSubscriber {
    /// Connect to the session bus and start monitoring player changes.
    pub async fn new() -> anyhow::Result<Self> {
        let conn = Connection::session().await?;
        let initial_data = fetch_mpris_data(&conn).await.unwrap_or_default();
        let data = Mutable::new(initial_data);

        let listener = data.clone();
        tokio::spawn(async move {
            if let Err(e) = run_listener(listener, conn).await {
                error!("MPRIS listener error: {}", e);
            }
        });

        Ok(Self { data })
    }

    pub fn subscribe(&self) -> MutableSignalCloned<MprisData> {
        self.data.signal_cloned()
    }

    pub fn get(&self) -> MprisData {
        self.data.get_cloned()
    }
}

async fn player_proxy(conn: &Connection, service: &str) -> Option<MprisPlayerProxy<'static>> {
    let builder = match MprisPlayerProxy::builder(conn).destination(service.to_string()) {
        Ok(builder) => builder,
        Err(err) => {
            debug!("Invalid MPRIS destination {}: {}", service, err);
            return None;
        }
    };
    match builder.build().await {
        Ok(proxy) => Some(proxy),
        Err(err) => {
            debug!("Failed to build MPRIS proxy for {}: {}", service, err);
            None
        }
    }
}

async fn fetch_player(service: &str, proxy: &MprisPlayerProxy<'_>) -> MprisPlayerData {
    let track = proxy
        .metadata()
        .await
        .map(|raw| TrackMetadata::from(&raw))
        .unwrap_or_default();
    let state = proxy
        .playback_status()
        .await
        .map(|s| PlaybackStatus::from(s.as_str()))
        .unwrap_or_default();
    let position = proxy
        .position()
        .await
        .ok()
        .and_then(microseconds)
        .unwrap_or_default();

    MprisPlayerData {
        service: service.to_string(),
        track,
        state,
        position,
        fetched_at: Instant::now(),
    }
}

/// Fetch current data from all available players.
async fn fetch_mpris_data(conn: &Connection) -> anyhow::Result<MprisData> {
    let dbus = DBusProxy::new(conn).await?;
    let names: Vec<String> = dbus
        .list_names()
        .await?
        .iter()
        .filter(|name| name.as_str().starts_with(MPRIS_PLAYER_SERVICE_PREFIX))
        .map(|name| name.to_string())
        .collect();

    let players = join_all(names.iter().map(|name| async move {
        let proxy = player_proxy(conn, name).await?;
        Some(fetch_player(name, &proxy).await)
    }))
    .await
    .into_iter()
    .flatten()
    .collect();

    Ok(MprisData { players })
}

/// Run the MPRIS event listener loop.
///
/// The outer loop rebuilds per-player streams whenever a player appears or
/// disappears; the inner loop refetches players that reported changes.
async fn run_listener(data: Mutable<MprisData>, conn: Connection) -> anyhow::Result<()> {
    info!("MPRIS subscriber started");

    loop {
        let current = match fetch_mpris_data(&conn).await {
            Ok(value) => value,
            Err(err) => {
                error!("Failed to fetch MPRIS data: {}", err);
                tokio::time::sleep(Duration::from_secs(2)).await;
                continue;
            }
        };
        data.set_neq(current.clone());

        let dbus = DBusProxy::new(&conn).await?;
        let mut streams = vec![
            dbus.receive_name_owner_changed()
                .await?
                .filter_map(|signal| async move {
                    let args = signal.args().ok()?;
                    args.name
                        .as_str()
                        .starts_with(MPRIS_PLAYER_SERVICE_PREFIX)
                        .then_some(MprisEvent::TopologyChanged)
                })
                .boxed(),
        ];

        let mut proxies = HashMap::new();
        for player in &current.players {
            let Some(proxy) = player_proxy(&conn, &player.service).await else {
                continue;
            };

            let service = player.service.clone();
            streams.push(
                proxy
                    .receive_metadata_changed()
                    .await
                    .map(move |_| MprisEvent::Changed(service.clone()))
                    .boxed(),
            );

            let service = player.service.clone();
            streams.push(
                proxy
                    .receive_playback_status_changed()
                    .await
                    .map(move |_| MprisEvent::Changed(service.clone()))
                    .boxed(),
            );

            match proxy.receive_seeked().await {
                Ok(seeked) => {
                    let service = player.service.clone();
                    streams.push(
                        seeked
                            .map(move |_| MprisEvent::Changed(service.clone()))
                            .boxed(),
                    );
                }
                Err(err) => debug!("No Seeked signal for {}: {}", player.service, err),
            }

            proxies.insert(player.service.clone(), proxy);
        }

        let mut events = select_all(streams);
        loop {
            let Some(first) = events.next().await else {
                warn!("MPRIS event stream ended unexpectedly");
                tokio::time::sleep(Duration::from_secs(1)).await;
                break;
            };

            let mut batch = vec![first];
            while let Ok(Some(event)) = tokio::time::timeout(
                Duration::from_millis(EVENT_DEBOUNCE_MS),
                events.next(),
            )
            .await
            {
                batch.push(event);
            }

            let mut topology_changed = false;
            let mut changed = HashSet::new();
            for event in batch {
                match event {
                    MprisEvent::TopologyChanged => topology_changed = true,
                    MprisEvent::Changed(service) => {
                        trace!("MPRIS player changed: {}", service);
                        changed.insert(service);
                    }
                }
            }

            if topology_changed {
                debug!("MPRIS topology changed, rebuilding player streams");
                break;
            }

            for service in changed {
                let Some(proxy) = proxies.get(service.as_str()) else {
                    continue;
                };
                let snapshot = fetch_player(&service, proxy).await;

                let mut guard = data.lock_mut();
                if let Some(player) = guard.players.iter_mut().find(|p| p.service == service) {
                    *player = snapshot;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(state: PlaybackStatus, position: u64, length: Option<u64>) -> MprisPlayerData {
        MprisPlayerData {
            service: format!("{}test", MPRIS_PLAYER_SERVICE_PREFIX),
            track: TrackMetadata {
                artist: "Artist".into(),
                title: "Title".into(),
                length: length.map(Duration::from_secs),
            },
            state,
            position: Duration::from_secs(position),
            fetched_at: Instant::now(),
        }
    }

    #[test]
    fn test_playback_status_from_str() {
        assert_eq!(PlaybackStatus::from("Playing"), PlaybackStatus::Playing);
        assert_eq!(PlaybackStatus::from("Paused"), PlaybackStatus::Paused);
        assert_eq!(PlaybackStatus::from("bogus"), PlaybackStatus::Stopped);
    }

    #[test]
    fn test_position_advances_only_while_playing() {
        let playing = player(PlaybackStatus::Playing, 10, Some(300));
        let later = playing.fetched_at + Duration::from_secs(5);
        assert_eq!(playing.position_at(later), Duration::from_secs(15));

        let paused = player(PlaybackStatus::Paused, 10, Some(300));
        let later = paused.fetched_at + Duration::from_secs(5);
        assert_eq!(paused.position_at(later), Duration::from_secs(10));
    }

    #[test]
    fn test_position_capped_at_length() {
        let playing = player(PlaybackStatus::Playing, 295, Some(300));
        let later = playing.fetched_at + Duration::from_secs(60);
        assert_eq!(playing.position_at(later), Duration::from_secs(300));
    }

    #[test]
    fn test_active_prefers_playing() {
        let mut data = MprisData {
            players: vec![
                player(PlaybackStatus::Stopped, 0, None),
                player(PlaybackStatus::Paused, 1, None),
                player(PlaybackStatus::Playing, 2, None),
            ],
        };
        assert_eq!(data.active().unwrap().position, Duration::from_secs(2));

        data.players.pop();
        assert_eq!(data.active().unwrap().position, Duration::from_secs(1));

        data.players.pop();
        assert!(data.active().is_none());
    }

    #[test]
    fn test_track_metadata_from_dbus_map() {
        let mut raw = HashMap::new();
        raw.insert(
            "xesam:title".to_string(),
            OwnedValue::try_from(zbus::zvariant::Value::from("Song")).unwrap(),
        );
        raw.insert(
            "xesam:artist".to_string(),
            OwnedValue::try_from(zbus::zvariant::Value::from(vec!["A", "B"])).unwrap(),
        );
        raw.insert(
            "mpris:length".to_string(),
            OwnedValue::try_from(zbus::zvariant::Value::from(180_000_000i64)).unwrap(),
        );

        let track = TrackMetadata::from(&raw);
        assert_eq!(track.title, "Song");
        assert_eq!(track.artist, "A, B");
        assert_eq!(track.length, Some(Duration::from_secs(180)));
    }
}
