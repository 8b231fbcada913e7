//! Now playing, from the most relevant MPRIS player, and the output volume.

mod config;
pub use config::MediaConfig;

use std::time::{Duration, Instant};

use anyhow::Result;
use bar::{BarBuilder, Budget, Color, ModeKey, ModeSpec, ModuleId, Output, Segment, push, tick};
use futures_signals::signal::SignalExt;
use services::{AudioData, AudioSubscriber, MprisData, MprisSubscriber, PlaybackStatus};

use super::{media_time, split_into};
use crate::bar::icons;

pub const MEDIA: ModuleId = ModuleId::new("media");
pub const MEDIA_DETAIL: ModuleId = ModuleId::new("media_detail");
pub const VOLUME: ModuleId = ModuleId::new("volume");

/// Refresh period of the playback position.
const POSITION_PERIOD: Duration = Duration::from_secs(1);

/// `artist - title` for the summary, then position and track for the detail.
///
/// Nothing while stopped or without players.
pub fn format(data: &MprisData, now: Instant, budget: &Budget) -> Option<Output> {
    let player = data.active()?;
    let track = budget.fit(&player.track.artist, &player.track.title);

    let mut position = String::new();
    if player.state == PlaybackStatus::Playing {
        position.push_str(&media_time(player.position_at(now)));
        position.push('/');
    }
    if let Some(length) = player.track.length {
        position.push_str(&media_time(length));
    }
    let position = if position.is_empty() {
        Segment::icon(icons::MUSIC)
    } else {
        Segment::new(icons::MUSIC, position)
    };

    Some(
        Output::empty()
            .push(Segment::new(icons::MUSIC, track.clone()))
            .push(position)
            .push(Segment::text(track)),
    )
}

/// Volume icon and percentage; a muted sink is just the icon, degraded.
pub fn format_volume(audio: &AudioData) -> Segment {
    if audio.muted {
        return Segment::icon(icons::VOLUME_OFF).color(Color::Degraded);
    }
    let icon = match audio.volume {
        67.. => icons::VOLUME_HIGH,
        34..=66 => icons::VOLUME_LOW,
        _ => icons::VOLUME_MUTE,
    };
    Segment::new(icon, format!("{:2}%", audio.volume))
}

/// Register the media modules and mode. Without a session bus the modules
/// stay empty and the mode shows its icon.
pub fn register(
    builder: &mut BarBuilder,
    config: &MediaConfig,
    mpris: Option<&MprisSubscriber>,
    audio: &AudioSubscriber,
) -> Result<()> {
    let detail = builder.static_module(MEDIA_DETAIL)?;
    builder.module(
        VOLUME,
        push(audio.subscribe().to_stream(), |audio: Option<AudioData>| {
            audio.as_ref().map(format_volume)
        }),
    )?;

    match mpris {
        Some(mpris) => {
            let budget = Budget::new(config.budget).primary_cap(config.primary_cap);
            builder.module(
                MEDIA,
                tick(
                    POSITION_PERIOD,
                    mpris.subscribe().to_stream(),
                    move |data: &MprisData, now| {
                        split_into(&detail, 1, format(data, now, &budget))
                    },
                ),
            )?;
        }
        None => {
            builder.static_module(MEDIA)?;
        }
    }

    builder.mode(
        ModeSpec::new(ModeKey::Media)
            .override_segment(Segment::icon(icons::MUSIC))
            .summary([MEDIA])
            .detail([MEDIA_DETAIL])
            .always([VOLUME]),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use services::{MprisPlayerData, TrackMetadata};

    fn player(state: PlaybackStatus, fetched_at: Instant) -> MprisPlayerData {
        MprisPlayerData {
            service: "org.mpris.MediaPlayer2.spotify".into(),
            track: TrackMetadata {
                artist: "An Artist".into(),
                title: "A Title".into(),
                length: Some(Duration::from_secs(245)),
            },
            state,
            position: Duration::from_secs(60),
            fetched_at,
        }
    }

    fn budget() -> Budget {
        Budget::new(70).primary_cap(35)
    }

    #[test]
    fn test_stopped_is_empty() {
        let now = Instant::now();
        let data = MprisData {
            players: vec![player(PlaybackStatus::Stopped, now)],
        };
        assert!(format(&data, now, &budget()).is_none());
        assert!(format(&MprisData::default(), now, &budget()).is_none());
    }

    #[test]
    fn test_playing_advances_position() {
        let fetched = Instant::now();
        let data = MprisData {
            players: vec![player(PlaybackStatus::Playing, fetched)],
        };
        let output = format(&data, fetched + Duration::from_secs(3), &budget()).unwrap();
        let texts: Vec<String> = output.segments().iter().map(|s| s.full_text()).collect();
        assert_eq!(
            texts,
            [
                format!("{} An Artist - A Title", icons::MUSIC),
                format!("{} 1:03/4:05", icons::MUSIC),
                "An Artist - A Title".to_string(),
            ]
        );
    }

    #[test]
    fn test_paused_shows_length_only() {
        let fetched = Instant::now();
        let data = MprisData {
            players: vec![player(PlaybackStatus::Paused, fetched)],
        };
        let output = format(&data, fetched + Duration::from_secs(30), &budget()).unwrap();
        assert_eq!(output.segments()[1].text_str(), "4:05");
    }

    #[test]
    fn test_volume() {
        let loud = format_volume(&AudioData {
            volume: 80,
            muted: false,
        });
        assert_eq!(loud.full_text(), format!("{} 80%", icons::VOLUME_HIGH));
        assert_eq!(loud.color_value(), None);

        let quiet = format_volume(&AudioData {
            volume: 5,
            muted: false,
        });
        assert_eq!(quiet.full_text(), format!("{}  5%", icons::VOLUME_MUTE));
        assert_eq!(
            format_volume(&AudioData {
                volume: 50,
                muted: false,
            })
            .icon_str(),
            Some(icons::VOLUME_LOW)
        );

        let muted = format_volume(&AudioData {
            volume: 80,
            muted: true,
        });
        assert_eq!(muted.full_text(), icons::VOLUME_OFF);
        assert_eq!(muted.color_value(), Some(Color::Degraded));
    }

    #[test]
    fn test_long_track_fits_budget() {
        let now = Instant::now();
        let mut long = player(PlaybackStatus::Paused, now);
        long.track.artist = "An Artist With A Very Long Name Indeed".into();
        long.track.title = "A Rather Long Title".into();
        let data = MprisData {
            players: vec![long],
        };
        let budget = Budget::new(20).primary_cap(10);
        let output = format(&data, now, &budget).unwrap();
        assert_eq!(output.segments()[2].text_str(), "An Artist⋯ - A Rath⋯");
    }
}
