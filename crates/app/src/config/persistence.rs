use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};

use super::Config;

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg).join("modalbar").join("config.toml"));
    }

    if let Some(home) = std::env::var_os("HOME") {
        return Ok(PathBuf::from(home)
            .join(".config")
            .join("modalbar")
            .join("config.toml"));
    }

    Err(anyhow!(
        "Unable to determine config path (XDG_CONFIG_HOME/HOME not set)"
    ))
}

/// Load `path`, writing the defaults there first if it does not exist.
pub fn load(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        let config = Config::default();
        save(&config, path)?;
        return Ok(config);
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let parsed = toml::from_str::<Config>(&raw)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(parsed)
}

pub fn save(config: &Config, path: &Path) -> anyhow::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        anyhow!(
            "Invalid config path has no parent directory: {}",
            path.display()
        )
    })?;
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;

    let encoded = toml::to_string_pretty(config).context("Failed to encode config as TOML")?;
    fs::write(path, encoded)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("modalbar-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_load_writes_defaults() {
        let dir = scratch_dir("defaults");
        let path = dir.join("nested").join("config.toml");

        let config = load(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.clock.time_format, Config::default().clock.time_format);

        // The written file loads back to the same values.
        let again = load(&path).unwrap();
        assert_eq!(again.timezones.len(), config.timezones.len());
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_load_partial_file() {
        let dir = scratch_dir("partial");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        fs::write(&path, "[media]\nbudget = 40\n").unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config.media.budget, 40);
        assert_eq!(config.media.primary_cap, Config::default().media.primary_cap);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = scratch_dir("invalid");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        fs::write(&path, "[media\n").unwrap();

        let err = load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config file"));
        fs::remove_dir_all(dir).unwrap();
    }
}
