//! Current weather from OpenWeatherMap, located by IP geolocation.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

const GEOIP_URL: &str = "https://freegeoip.app/json/";
const OWM_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const USER_AGENT: &str = concat!("modalbar/", env!("CARGO_PKG_VERSION"));

/// Coarse weather condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Thunderstorm,
    Drizzle,
    Rain,
    Snow,
    Sleet,
    Mist,
    Smoke,
    Haze,
    Whirls,
    Fog,
    Tornado,
    Windy,
    Clear,
    PartlyCloudy,
    Cloudy,
    Overcast,
    Unknown,
}

impl Condition {
    /// Map an OpenWeatherMap condition code.
    pub fn from_owm(code: u32) -> Self {
        match code {
            200..=299 => Condition::Thunderstorm,
            300..=399 => Condition::Drizzle,
            511 => Condition::Sleet,
            500..=599 => Condition::Rain,
            611..=616 => Condition::Sleet,
            600..=699 => Condition::Snow,
            701 => Condition::Mist,
            711 => Condition::Smoke,
            721 => Condition::Haze,
            731 | 751 | 761 | 762 => Condition::Whirls,
            741 => Condition::Fog,
            771 => Condition::Windy,
            781 => Condition::Tornado,
            800 => Condition::Clear,
            801 | 802 => Condition::PartlyCloudy,
            803 => Condition::Cloudy,
            804 => Condition::Overcast,
            _ => Condition::Unknown,
        }
    }
}

/// Current conditions, always in metric units.
#[derive(Debug, Clone, PartialEq)]
pub struct Weather {
    pub condition: Condition,
    pub description: String,
    /// Degrees Celsius.
    pub temperature: f64,
    /// Metres per second.
    pub wind_speed: f64,
    /// Meteorological degrees, where the wind comes from.
    pub wind_direction: f64,
    /// Relative humidity (0.0-1.0).
    pub humidity: f64,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
    pub attribution: &'static str,
}

impl Weather {
    /// Whether `now` falls between sunset and the next sunrise.
    pub fn is_night(&self, now: DateTime<Utc>) -> bool {
        now > self.sunset || now < self.sunrise
    }
}

#[derive(Debug, Deserialize)]
struct GeoIpResponse {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct OwmResponse {
    weather: Vec<OwmCondition>,
    main: OwmMain,
    wind: OwmWind,
    sys: OwmSys,
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    id: u32,
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: f64,
    #[serde(default)]
    deg: f64,
}

#[derive(Debug, Deserialize)]
struct OwmSys {
    sunrise: i64,
    sunset: i64,
}

impl TryFrom<OwmResponse> for Weather {
    type Error = anyhow::Error;

    fn try_from(response: OwmResponse) -> Result<Self> {
        let condition = response
            .weather
            .into_iter()
            .next()
            .context("Response has no weather condition")?;
        let timestamp = |secs: i64| {
            DateTime::from_timestamp(secs, 0)
                .with_context(|| format!("Invalid timestamp {}", secs))
        };

        Ok(Weather {
            condition: Condition::from_owm(condition.id),
            description: condition.description,
            temperature: response.main.temp,
            wind_speed: response.wind.speed,
            wind_direction: response.wind.deg,
            humidity: response.main.humidity / 100.0,
            sunrise: timestamp(response.sys.sunrise)?,
            sunset: timestamp(response.sys.sunset)?,
            attribution: "OpenWeatherMap",
        })
    }
}

/// Client for the geolocation and weather APIs.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    api_key: String,
}

impl WeatherClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key: api_key.into(),
        })
    }

    /// Locate this machine by its public IP.
    pub async fn whereami(&self) -> Result<(f64, f64)> {
        let response = self
            .client
            .get(GEOIP_URL)
            .send()
            .await
            .context("Geolocation request failed")?;
        if !response.status().is_success() {
            bail!("Geolocation request failed: {}", response.status());
        }
        let location: GeoIpResponse = response
            .json()
            .await
            .context("Invalid geolocation response")?;
        Ok((location.latitude, location.longitude))
    }

    /// Current weather at this machine's location.
    pub async fn current(&self) -> Result<Weather> {
        let (lat, lng) = self.whereami().await?;
        debug!("Fetching weather for {:.2},{:.2}", lat, lng);

        let response = self
            .client
            .get(OWM_URL)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lng.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await
            .context("Weather request failed")?;
        if !response.status().is_success() {
            bail!("Weather request failed: {}", response.status());
        }

        let body: OwmResponse = response.json().await.context("Invalid weather response")?;
        Weather::try_from(body)
    }
}
