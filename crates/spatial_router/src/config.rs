//! Configuration system
//!
//! Server settings load from `.toml` or `.ron` files, chosen by extension.
//! Every section has defaults so a partial file is accepted.

use std::path::Path;

pub use serde::{Deserialize, Serialize};

/// On-disk encodings understood by [`Config`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.toml`
    Toml,
    /// `.ron`
    Ron,
}

impl ConfigFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Decode a configuration from text
    pub fn parse<T: for<'de> Deserialize<'de>>(self, contents: &str) -> Result<T, ConfigError> {
        match self {
            Self::Toml => toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string())),
            Self::Ron => ron::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string())),
        }
    }

    /// Encode a configuration as pretty-printed text
    pub fn render<T: Serialize>(self, value: &T) -> Result<String, ConfigError> {
        match self {
            Self::Toml => toml::to_string_pretty(value).map_err(|e| ConfigError::Serialize(e.to_string())),
            Self::Ron => ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string())),
        }
    }
}

/// Settings that round-trip through a TOML or RON file
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Read and decode `path`
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let contents = std::fs::read_to_string(path)?;
        let config: Self = format.parse(&contents)?;
        config.validate()?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Reject values that decode but cannot be used
    fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }

    /// Encode and write to `path`
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = ConfigFormat::from_path(path)?.render(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

/// Failures while loading or saving configuration
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// Reading or writing the file failed
    #[error("Config file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The file contents did not decode
    #[error("Config parse failed: {0}")]
    Parse(String),

    /// The value could not be encoded
    #[error("Config serialization failed: {0}")]
    Serialize(String),

    /// A setting decoded but is out of range
    #[error("Invalid config value: {0}")]
    InvalidValue(String),

    /// Extension is neither `.toml` nor `.ron`
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),
}

/// # Server Configuration
///
/// Top-level settings for the routing server. Loaded once at process start
/// and handed to [`Server::new`](crate::Server::new).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Name reported in logs
    pub server_name: String,
    /// Upper bound on live client applications (`None` = unlimited)
    pub max_clients: Option<usize>,
    /// Default `env_logger` filter used when `RUST_LOG` is unset
    pub log_filter: String,
    /// Collision pass behaviour
    pub collision: CollisionConfig,
    /// Haptic request limits
    pub haptics: HapticsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_name: "spatial-router".to_string(),
            max_clients: None,
            log_filter: "info".to_string(),
            collision: CollisionConfig::default(),
            haptics: HapticsConfig::default(),
        }
    }
}

impl Config for ServerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.haptics.validate()
    }
}

impl ServerConfig {
    /// Set the client limit
    #[must_use]
    pub const fn with_max_clients(mut self, limit: usize) -> Self {
        self.max_clients = Some(limit);
        self
    }
}

/// Collision pass configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Publish every grabber result each frame, even when it is empty and
    /// identical to the last one published
    pub publish_unchanged: bool,
}

/// Haptic dispatch limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HapticsConfig {
    /// Amplitude ceiling (requests are clamped to `0.0..=max_amplitude`)
    pub max_amplitude: f32,
    /// Duration ceiling in seconds
    pub max_duration: f32,
}

impl Default for HapticsConfig {
    fn default() -> Self {
        Self {
            max_amplitude: 1.0,
            max_duration: 1.0,
        }
    }
}

impl HapticsConfig {
    /// Both limits must be finite and non-negative
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("max_amplitude", self.max_amplitude), ("max_duration", self.max_duration)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue(format!("haptics.{name} = {value}")));
            }
        }
        Ok(())
    }

    /// Amplitude limited to `0..=max_amplitude`; NaN becomes 0
    pub fn bound_amplitude(&self, amplitude: f32) -> f32 {
        bounded(amplitude, self.max_amplitude)
    }

    /// Duration limited to `0..=max_duration`; NaN becomes 0
    pub fn bound_duration(&self, duration: f32) -> f32 {
        bounded(duration, self.max_duration)
    }
}

/// Never panics, even for a negative or NaN limit
fn bounded(value: f32, limit: f32) -> f32 {
    if value.is_nan() || limit.is_nan() {
        return 0.0;
    }
    value.max(0.0).min(limit.max(0.0))
}
