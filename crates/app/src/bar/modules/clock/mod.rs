//! Local date and time, and the per-zone clocks of the timezones mode.

mod config;
pub use config::{ClockConfig, TimezoneConfig};

use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use bar::{
    BarBuilder, Button, ClickAction, Launch, ModeKey, ModeSpec, ModuleId, Output, Segment, poll,
};
use chrono::format::{Item, StrftimeItems};
use chrono::{Local, NaiveDateTime, Utc};
use chrono_tz::Tz;

use crate::bar::icons;

pub const DATE: ModuleId = ModuleId::new("date");
pub const TIME: ModuleId = ModuleId::new("time");
pub const TIMEZONES: ModuleId = ModuleId::new("timezones");

const REFRESH: Duration = Duration::from_secs(1);

fn check_format(format: &str) -> Result<()> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        bail!("Invalid time format `{}`", format);
    }
    Ok(())
}

fn parse_zones(zones: &[TimezoneConfig]) -> Result<Vec<(String, Tz)>> {
    zones
        .iter()
        .map(|zone| {
            let tz = zone
                .zone
                .parse::<Tz>()
                .map_err(|e| anyhow!("Unknown timezone `{}`: {}", zone.zone, e))?;
            Ok((zone.label.clone(), tz))
        })
        .collect()
}

pub fn date_segment(now: NaiveDateTime, format: &str, calendar: Option<&Launch>) -> Segment {
    let segment = Segment::new(icons::CALENDAR, now.format(format).to_string());
    match calendar {
        Some(launch) => segment.on_click(Button::Left, ClickAction::Spawn(launch.clone())),
        None => segment,
    }
}

pub fn time_segment(now: NaiveDateTime, format: &str) -> Segment {
    Segment::text(now.format(format).to_string())
        .on_click(Button::Left, ClickAction::Toggle(ModeKey::Timezones))
}

/// One `label HH:MM` segment per zone.
pub fn zone_clocks(now: chrono::DateTime<Utc>, zones: &[(String, Tz)]) -> Output {
    zones
        .iter()
        .map(|(label, tz)| {
            let local = now.with_timezone(tz);
            Segment::text(format!("{} {}", label, local.format("%H:%M")))
        })
        .fold(Output::empty(), |output, segment| output.push(segment))
}

/// Register the date, time and timezone clocks, and the timezones mode.
pub fn register(
    builder: &mut BarBuilder,
    config: &ClockConfig,
    zones: &[TimezoneConfig],
) -> Result<()> {
    check_format(&config.date_format)?;
    check_format(&config.time_format)?;
    let zones = parse_zones(zones)?;

    let calendar = Launch::from_argv(&config.calendar_command);
    let date_format = config.date_format.clone();
    builder.module(
        DATE,
        poll(REFRESH, move || {
            let segment = date_segment(
                Local::now().naive_local(),
                &date_format,
                calendar.as_ref(),
            );
            async move { segment }
        }),
    )?;

    let time_format = config.time_format.clone();
    builder.module(
        TIME,
        poll(REFRESH, move || {
            let segment = time_segment(Local::now().naive_local(), &time_format);
            async move { segment }
        }),
    )?;

    // Polled every second so minute changes show up on time; equal outputs
    // do not re-render.
    builder.module(
        TIMEZONES,
        poll(REFRESH, move || {
            let output = zone_clocks(Utc::now(), &zones);
            async move { output }
        }),
    )?;

    builder.mode(
        ModeSpec::new(ModeKey::Timezones)
            .override_segment(Segment::icon(icons::CLOCK))
            .detail([TIMEZONES]),
    )?;
    builder.targets(TIME, [ModeKey::Timezones]);
    Ok(())
}
