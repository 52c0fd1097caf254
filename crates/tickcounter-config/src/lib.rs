//! Configuration for the tickcounter countdown.
//!
//! Settings live in a TOML file in the platform config directory
//! (`~/.config/tickcounter/config.toml` on Linux). Every field has a default,
//! so a missing file or a partial file is fine.

mod target;

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use target::{TargetParseError, format_compact, parse_target};

/// Lowest and highest frame rates accepted.
const FPS_RANGE: (u32, u32) = (15, 240);

/// Errors raised while loading or saving the config file.
#[derive(Debug)]
pub enum ConfigError {
    /// No home directory, so no default config location.
    NoConfigDir,
    Io { path: PathBuf, source: io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
    Serialize(toml::ser::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoConfigDir => write!(f, "could not determine the config directory"),
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Parse { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Serialize(e) => write!(f, "failed to serialize config: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NoConfigDir => None,
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Serialize(e) => Some(e),
        }
    }
}

/// Starfield backdrop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarfieldConfig {
    /// Number of stars.
    pub count: usize,
    /// Depth units removed from every star per rendered frame.
    pub speed: f32,
}

impl Default for StarfieldConfig {
    fn default() -> Self {
        Self {
            count: 300,
            speed: 15.0,
        }
    }
}

/// Expiry explosion settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplosionConfig {
    /// Play the explosion at all.
    pub enabled: bool,
    pub particle_count: usize,
    /// Fraction of particles that must reach the core to end the implosion.
    pub converge_ratio: f32,
    /// Per-axis distance from the origin that counts as "reached the core".
    pub converge_epsilon: f32,
    pub implode_timeout_secs: f32,
    pub flash_secs: f32,
    pub explode_secs: f32,
    /// Per-frame velocity multiplier while exploding.
    pub drag: f32,
    /// Upper bound on a single frame's time step, in seconds.
    pub max_frame_dt: f32,
}

impl Default for ExplosionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            particle_count: 8000,
            converge_ratio: 0.8,
            converge_epsilon: 0.5,
            implode_timeout_secs: 1.5,
            flash_secs: 0.1,
            explode_secs: 10.0,
            drag: 0.96,
            max_frame_dt: 0.1,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive, e.g. `info` or `tickcounter=debug`.
    pub level: String,
    /// Log file path. Defaults to the platform data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Countdown target as entered (compact or ISO form).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Title shown above the counter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Animation frame rate.
    pub fps: u32,
    pub starfield: StarfieldConfig,
    pub explosion: ExplosionConfig,
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target: None,
            title: None,
            fps: 60,
            starfield: StarfieldConfig::default(),
            explosion: ExplosionConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Default config file location.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        project_dirs()
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Default log file location.
    pub fn default_log_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.data_local_dir().join("tickcounter.log"))
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let config: Config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config.sanitized())
    }

    /// Write to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, text).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "config saved");
        Ok(())
    }

    /// Clamp values into workable ranges.
    pub fn sanitized(mut self) -> Self {
        self.fps = self.fps.clamp(FPS_RANGE.0, FPS_RANGE.1);
        self.starfield.count = self.starfield.count.max(1);
        self.explosion.particle_count = self.explosion.particle_count.max(1);
        self.explosion.converge_ratio = self.explosion.converge_ratio.clamp(0.0, 1.0);
        self.explosion.converge_epsilon = self.explosion.converge_epsilon.max(0.0);
        self.explosion.drag = self.explosion.drag.clamp(0.0, 1.0);
        if !self.explosion.max_frame_dt.is_finite() || self.explosion.max_frame_dt <= 0.0 {
            self.explosion.max_frame_dt = ExplosionConfig::default().max_frame_dt;
        }
        self.target = self.target.filter(|t| !t.trim().is_empty());
        self.title = self.title.filter(|t| !t.is_empty());
        self
    }

    /// Window/header title: `"<title> - TickCounter"` or just `"TickCounter"`.
    pub fn window_title(&self) -> String {
        match self.title.as_deref() {
            Some(title) => format!("{title} - TickCounter"),
            None => "TickCounter".to_string(),
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "tickcounter")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.fps, 60);
        assert_eq!(config.starfield.count, 300);
        assert_eq!(config.explosion.particle_count, 8000);
        assert_eq!(config.explosion.converge_ratio, 0.8);
        assert_eq!(config.explosion.converge_epsilon, 0.5);
        assert!(config.target.is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            title = "Launch"

            [explosion]
            particle_count = 500
            "#,
        )
        .unwrap();
        assert_eq!(config.title.as_deref(), Some("Launch"));
        assert_eq!(config.explosion.particle_count, 500);
        assert_eq!(config.explosion.drag, 0.96);
        assert_eq!(config.starfield, StarfieldConfig::default());
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            target: Some("20270101000000".to_string()),
            title: Some("New Year".to_string()),
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "fps = \"fast\"").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_sanitize_clamps() {
        let mut config = Config::default();
        config.fps = 1000;
        config.explosion.converge_ratio = 3.0;
        config.explosion.max_frame_dt = f32::NAN;
        config.target = Some("  ".to_string());
        let config = config.sanitized();
        assert_eq!(config.fps, 240);
        assert_eq!(config.explosion.converge_ratio, 1.0);
        assert_eq!(config.explosion.max_frame_dt, 0.1);
        assert!(config.target.is_none());
    }

    #[test]
    fn test_window_title() {
        let mut config = Config::default();
        assert_eq!(config.window_title(), "TickCounter");
        config.title = Some("Launch".to_string());
        assert_eq!(config.window_title(), "Launch - TickCounter");
    }
}
