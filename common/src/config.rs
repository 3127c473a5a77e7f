use serde::Deserialize;
use std::path::Path;

/// Top-level configuration, loadable from a TOML file.
///
/// Every section has defaults, so an empty file (or no file at all) is a
/// valid configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// Frames per second to analyze; the downsample step is the video's
    /// native rate divided by this.
    #[serde(default = "default_framerate")]
    pub framerate: f64,
    /// Similarity threshold in (0, 1]; higher is stricter.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            framerate: default_framerate(),
            threshold: default_threshold(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory slide images are written into.
    #[serde(default = "default_output_dir")]
    pub dir: String,
    /// Image extension without the leading dot, e.g. "png" or "jpg".
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            format: default_format(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFile(path.display().to_string(), e))?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(config)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    ReadFile(String, std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(String),
}

// Default value functions
fn default_framerate() -> f64 {
    0.1
}
fn default_threshold() -> f64 {
    0.95
}
fn default_output_dir() -> String {
    "slides/".into()
}
fn default_format() -> String {
    "png".into()
}
fn default_log_level() -> String {
    "info".into()
}
