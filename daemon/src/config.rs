//! Configuration management (TOML)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write config {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub sampling: SamplingConfig,
    pub profiles: ProfileConfig,
    pub kill: KillConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub cycle_interval_secs: u64,
    pub kill_prompt: bool,
    pub kill_prompt_timeout_secs: u64,
    pub notify_on_change: bool,
    /// Preset priority process. Empty means ask at startup.
    pub priority_process: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub exporter: Vec<String>,
    pub csv_path: PathBuf,
    /// Blind wait after the exporter returns, before the CSV is read.
    pub settle_delay_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub powersave_below: f64,
    pub balanced_below: f64,
    pub command: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KillConfig {
    pub command: Vec<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            cycle_interval_secs: 120,
            kill_prompt: true,
            kill_prompt_timeout_secs: 10,
            notify_on_change: false,
            priority_process: String::new(),
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        SamplingConfig {
            exporter: vec!["./csvExport".to_string()],
            csv_path: PathBuf::from("processes.csv"),
            settle_delay_secs: 10,
        }
    }
}

impl Default for ProfileConfig {
    fn default() -> Self {
        ProfileConfig {
            powersave_below: 20.0,
            balanced_below: 50.0,
            command: vec!["tuned-adm".to_string(), "profile".to_string()],
        }
    }
}

impl Default for KillConfig {
    fn default() -> Self {
        KillConfig {
            command: vec!["pkill".to_string(), "-f".to_string()],
        }
    }
}

impl GeneralConfig {
    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.cycle_interval_secs)
    }

    pub fn kill_prompt_timeout(&self) -> Duration {
        Duration::from_secs(self.kill_prompt_timeout_secs)
    }

    pub fn priority(&self) -> Option<String> {
        priority_name(&self.priority_process)
    }
}

/// Trimmed priority process name; blank means none.
pub fn priority_name(raw: &str) -> Option<String> {
    let name = raw.trim();
    (!name.is_empty()).then(|| name.to_string())
}

impl SamplingConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`Config::load`], but a missing, unreadable or invalid file
    /// logs a warning and yields the defaults.
    pub fn load_or_default(path: &Path) -> Self {
        Config::load(path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}, using defaults", e);
            Config::default()
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(path, content).map_err(write_err)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let commands = [
            ("sampling.exporter", &self.sampling.exporter),
            ("profiles.command", &self.profiles.command),
            ("kill.command", &self.kill.command),
        ];
        for (key, argv) in commands {
            if argv.first().map_or(true, |program| program.trim().is_empty()) {
                return Err(ConfigError::Invalid(format!("{key} must name a program")));
            }
        }

        let p = &self.profiles;
        if !p.powersave_below.is_finite() || !p.balanced_below.is_finite() {
            return Err(ConfigError::Invalid("profile thresholds must be finite".into()));
        }
        if p.powersave_below > p.balanced_below {
            return Err(ConfigError::Invalid(format!(
                "powersave_below ({}) exceeds balanced_below ({})",
                p.powersave_below, p.balanced_below
            )));
        }
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("", "", "powerpilot")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}
