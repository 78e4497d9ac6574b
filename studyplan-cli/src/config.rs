use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use studyplan_core::StudyAvailability;

use crate::state::ensure_studyplan_home;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// IANA zone deciding what "today" is.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Timeline length when `--days` is not given.
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,

    /// Snapshot used when `--snapshot` is not given (default: ~/.studyplan/snapshot.json).
    #[serde(default)]
    pub snapshot: Option<PathBuf>,

    /// Used for snapshots that carry no availability of their own.
    #[serde(default)]
    pub availability: StudyAvailability,
}

fn default_timezone() -> String {
    "America/Sao_Paulo".to_string()
}

fn default_horizon_days() -> u32 {
    14
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            horizon_days: default_horizon_days(),
            snapshot: None,
            availability: StudyAvailability::default(),
        }
    }
}

impl Config {
    /// Check the timezone early; a typo would otherwise surface on first use.
    pub fn validate(&self) -> Result<()> {
        self.timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|e| anyhow::anyhow!("invalid timezone '{}' in config: {}", self.timezone, e))?;
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_studyplan_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    let cfg: Config = toml::from_str(&s).context("parse config.toml")?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn save_config_to(p: &Path, cfg: &Config) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

/// Write the default config unless one exists. Returns the config path.
pub fn init_config() -> Result<PathBuf> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(p);
    }
    save_config_to(&p, &Config::default())?;
    println!("Wrote {}", p.display());
    Ok(p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyplan_core::Weekday;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.availability.for_day(Weekday::Saturday).minutes(), 0);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.toml");
        fs::write(
            &p,
            "timezone = \"Europe/Lisbon\"\n\n[availability]\nmonday = 45\nsunday = 300\n",
        )
        .unwrap();

        let cfg = load_config_from(&p).unwrap();
        assert_eq!(cfg.timezone, "Europe/Lisbon");
        assert_eq!(cfg.horizon_days, 14);
        assert_eq!(cfg.availability.for_day(Weekday::Monday).minutes(), 45);
        assert_eq!(cfg.availability.for_day(Weekday::Sunday).minutes(), 300);
        // Days left out of the table get the two-hour default.
        assert_eq!(cfg.availability.for_day(Weekday::Tuesday).minutes(), 120);
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.toml");
        let cfg = Config {
            horizon_days: 30,
            snapshot: Some(dir.path().join("snap.json")),
            ..Config::default()
        };
        save_config_to(&p, &cfg).unwrap();
        assert_eq!(load_config_from(&p).unwrap(), cfg);
    }

    #[test]
    fn rejects_bad_timezone_and_minutes() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.toml");

        fs::write(&p, "timezone = \"Mars/Olympus\"\n").unwrap();
        assert!(load_config_from(&p).is_err());

        fs::write(&p, "[availability]\nmonday = 2000\n").unwrap();
        assert!(load_config_from(&p).is_err());
    }
}
