//! Current weather at the machine's location.
//!
//! The condition icon is the weather mode's override; everything else is
//! detail. Fetch failures leave the previous icon and an empty detail until
//! the next fetch.

mod config;
pub use config::{Units, WeatherConfig};

use std::time::Duration;

use anyhow::Result;
use bar::{BarBuilder, ModeKey, ModeSpec, ModuleId, Output, Segment, poll};
use chrono::{DateTime, FixedOffset, Local, Utc};
use services::{Condition, Weather, WeatherClient};
use tracing::{debug, warn};

use crate::bar::icons;

pub const WEATHER: ModuleId = ModuleId::new("weather");

const CARDINALS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];
const MPS_TO_MPH: f64 = 2.236_936;

pub fn condition_icon(weather: &Weather, now: DateTime<Utc>) -> &'static str {
    match weather.condition {
        Condition::Thunderstorm => icons::STORMY,
        Condition::Drizzle => icons::SHOWER,
        Condition::Rain => icons::POURING,
        Condition::Snow | Condition::Sleet => icons::SNOWY,
        Condition::Mist
        | Condition::Smoke
        | Condition::Whirls
        | Condition::Haze
        | Condition::Fog => icons::FOG,
        Condition::Clear if weather.is_night(now) => icons::NIGHT,
        Condition::Clear => icons::SUNNY,
        Condition::PartlyCloudy => icons::PARTLY_CLOUDY,
        Condition::Cloudy | Condition::Overcast => icons::CLOUDY,
        Condition::Tornado | Condition::Windy => icons::WINDY,
        Condition::Unknown => icons::WARNING,
    }
}

/// Sixteen-point compass direction of a bearing in degrees.
pub fn cardinal(degrees: f64) -> &'static str {
    let index = (degrees.rem_euclid(360.0) / 22.5 + 0.5) as usize % CARDINALS.len();
    CARDINALS[index]
}

pub fn format(weather: &Weather, now: DateTime<Utc>, units: Units, offset: FixedOffset) -> Output {
    let (temperature, wind) = match units {
        Units::Metric => (
            format!("{:.1}℃", weather.temperature),
            format!("{:.0}m/s", weather.wind_speed),
        ),
        Units::Imperial => (
            format!("{:.1}℉", weather.temperature * 9.0 / 5.0 + 32.0),
            format!("{:.0}mph", weather.wind_speed * MPS_TO_MPH),
        ),
    };
    let local = |time: DateTime<Utc>| time.with_timezone(&offset).format("%H:%M").to_string();

    Output::empty()
        .push(Segment::new(condition_icon(weather, now), temperature))
        .push(Segment::text(weather.description.clone()))
        .push(Segment::new(
            icons::WINDY,
            format!("{} {}", wind, cardinal(weather.wind_direction)),
        ))
        .push(Segment::new(
            icons::HUMIDITY,
            format!("{:.0}%", weather.humidity * 100.0),
        ))
        .push(Segment::new(icons::SUNRISE, local(weather.sunrise)))
        .push(Segment::new(icons::SUNSET, local(weather.sunset)))
        .push(Segment::text(format!("provided by {}", weather.attribution)))
}

/// Register the weather module and mode, unless disabled or without an
/// API key.
pub fn register(builder: &mut BarBuilder, config: &WeatherConfig) -> Result<()> {
    if !config.enabled {
        debug!("Weather disabled");
        return Ok(());
    }
    let Some(api_key) = config.resolve_api_key() else {
        warn!("Weather enabled but no API key configured, skipping");
        return Ok(());
    };

    let client = WeatherClient::new(api_key)?;
    let controller = builder.controller();
    let units = config.units;
    builder.module(
        WEATHER,
        poll(Duration::from_secs(config.interval_secs.max(1)), move || {
            let client = client.clone();
            let controller = controller.clone();
            async move {
                let weather = client.current().await?;
                let now = Utc::now();
                let icon = Segment::icon(condition_icon(&weather, now));
                let _ = controller.set_override(ModeKey::Weather, icon);
                anyhow::Ok(format(&weather, now, units, *Local::now().offset()))
            }
        }),
    )?;

    builder.mode(
        ModeSpec::new(ModeKey::Weather)
            .override_segment(Segment::icon(icons::WARNING))
            .detail([WEATHER]),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weather(condition: Condition) -> Weather {
        Weather {
            condition,
            description: "broken clouds".into(),
            temperature: 12.4,
            wind_speed: 5.1,
            wind_direction: 240.0,
            humidity: 0.81,
            sunrise: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            sunset: DateTime::from_timestamp(1_700_030_000, 0).unwrap(),
            attribution: "OpenWeatherMap",
        }
    }

    fn noon() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_015_000, 0).unwrap()
    }

    #[test]
    fn test_cardinal() {
        assert_eq!(cardinal(0.0), "N");
        assert_eq!(cardinal(359.0), "N");
        assert_eq!(cardinal(240.0), "WSW");
        assert_eq!(cardinal(90.0), "E");
        assert_eq!(cardinal(-90.0), "W");
    }

    #[test]
    fn test_condition_icons() {
        let midnight = DateTime::from_timestamp(1_700_040_000, 0).unwrap();
        assert_eq!(condition_icon(&weather(Condition::Clear), noon()), icons::SUNNY);
        assert_eq!(condition_icon(&weather(Condition::Clear), midnight), icons::NIGHT);
        assert_eq!(condition_icon(&weather(Condition::Haze), noon()), icons::FOG);
        assert_eq!(
            condition_icon(&weather(Condition::Unknown), noon()),
            icons::WARNING
        );
    }

    #[test]
    fn test_format_metric() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let output = format(&weather(Condition::Cloudy), noon(), Units::Metric, utc);
        let texts: Vec<&str> = output.segments().iter().map(|s| s.text_str()).collect();
        assert_eq!(
            texts,
            [
                "12.4℃",
                "broken clouds",
                "5m/s WSW",
                "81%",
                "22:13",
                "06:33",
                "provided by OpenWeatherMap",
            ]
        );
        assert_eq!(output.segments()[0].icon_str(), Some(icons::CLOUDY));
    }

    #[test]
    fn test_format_imperial() {
        let cet = FixedOffset::east_opt(3600).unwrap();
        let output = format(&weather(Condition::Clear), noon(), Units::Imperial, cet);
        assert_eq!(output.segments()[0].text_str(), "54.3℉");
        assert_eq!(output.segments()[2].text_str(), "11mph WSW");
        assert_eq!(output.segments()[4].text_str(), "23:13");
    }

    #[test]
    fn test_config_api_key() {
        let config = WeatherConfig {
            api_key: "abc".into(),
            ..Default::default()
        };
        assert_eq!(config.resolve_api_key().as_deref(), Some("abc"));
    }
}
