//! Colors of the semantic segment states.

use anyhow::{Result, anyhow};
use bar::Color;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub good: String,
    pub degraded: String,
    pub bad: String,
    /// Pixels between blocks, left to the host bar when unset.
    pub separator_width: Option<u32>,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            good: "#50FA7B".into(),
            degraded: "#FFB86C".into(),
            bad: "#FF5555".into(),
            separator_width: None,
        }
    }
}

/// A validated theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub good: Color,
    pub degraded: Color,
    pub bad: Color,
    pub separator_width: Option<u32>,
}

fn parse(name: &str, hex: &str) -> Result<Color> {
    Color::parse_hex(hex).ok_or_else(|| anyhow!("Invalid theme color {} = {:?}", name, hex))
}

impl TryFrom<&ThemeConfig> for Theme {
    type Error = anyhow::Error;

    fn try_from(config: &ThemeConfig) -> Result<Self> {
        Ok(Self {
            good: parse("good", &config.good)?,
            degraded: parse("degraded", &config.degraded)?,
            bad: parse("bad", &config.bad)?,
            separator_width: config.separator_width,
        })
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            good: Color::Rgb(0x50, 0xFA, 0x7B),
            degraded: Color::Rgb(0xFF, 0xB8, 0x6C),
            bad: Color::Rgb(0xFF, 0x55, 0x55),
            separator_width: None,
        }
    }
}

impl Theme {
    /// `#RRGGBB` of any color, semantic ones resolved through the theme.
    pub fn hex(&self, color: Color) -> Option<String> {
        match color {
            Color::Good => self.good.to_hex(),
            Color::Degraded => self.degraded.to_hex(),
            Color::Bad => self.bad.to_hex(),
            rgb @ Color::Rgb(..) => rgb.to_hex(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_theme_matches_config() {
        let theme = Theme::try_from(&ThemeConfig::default()).unwrap();
        assert_eq!(theme, Theme::default());
        assert_eq!(theme.hex(Color::Bad).as_deref(), Some("#FF5555"));
        assert_eq!(
            theme.hex(Color::Rgb(1, 2, 3)).as_deref(),
            Some("#010203")
        );
    }

    #[test]
    fn test_invalid_color() {
        let config = ThemeConfig {
            good: "green".into(),
            ..Default::default()
        };
        let err = Theme::try_from(&config).unwrap_err();
        assert!(err.to_string().contains("good"));
    }
}
