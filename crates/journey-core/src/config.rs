use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Failed to read config: {0}")]
    ReadError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration for the journey tools
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct JourneyConfig {
    /// Spacing thresholds used by the graph validator
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Defaults for the recommendation tie-break
    #[serde(default)]
    pub recommendation: RecommendationConfig,

    /// Coordinate projection settings
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationConfig {
    /// Minimum distance between two nodes on the tree layout
    #[serde(default = "default_min_tree_distance")]
    pub min_tree_distance: f64,

    /// Minimum distance between two nodes on the spiral layout, measured after
    /// polar-to-cartesian conversion. Larger than the tree threshold because spiral
    /// nodes crowd near the center.
    #[serde(default = "default_min_spiral_distance")]
    pub min_spiral_distance: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_tree_distance: default_min_tree_distance(),
            min_spiral_distance: default_min_spiral_distance(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationConfig {
    /// Resume along the spiral track before falling back to tag similarity
    #[serde(default = "default_prefer_spiral_continuation")]
    pub prefer_spiral_continuation: bool,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            prefer_spiral_continuation: default_prefer_spiral_continuation(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutConfig {
    /// Display scale applied to tree coordinates
    #[serde(default = "default_tree_scale")]
    pub tree_scale: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            tree_scale: default_tree_scale(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
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

fn default_min_tree_distance() -> f64 {
    8.0
}
fn default_min_spiral_distance() -> f64 {
    12.0
}
fn default_prefer_spiral_continuation() -> bool {
    true
}
fn default_tree_scale() -> f64 {
    1.0
}
fn default_log_level() -> String {
    "info".to_string()
}

pub const LOCAL_CONFIG_FILE: &str = ".journey.toml";

/// Configuration manager with file discovery and environment overrides
pub struct ConfigManager {
    config: JourneyConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with the following precedence:
    /// 1. Environment variables
    /// 2. Config file (.journey.toml, then ~/.journey/config.toml)
    /// 3. Defaults
    pub fn load() -> Result<Self, ConfigError> {
        let (config, config_path) = Self::load_config_file()?;
        Self::finish(config, config_path)
    }

    /// Load an explicit config file; a missing file is an error here.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let config = Self::read_toml_file(path)?;
        Self::finish(config, Some(path.to_path_buf()))
    }

    /// Wrap an in-memory configuration, still subject to validation.
    pub fn from_config(config: JourneyConfig) -> Result<Self, ConfigError> {
        Self::validate_config(&config)?;
        Ok(Self {
            config,
            config_path: None,
        })
    }

    fn finish(config: JourneyConfig, config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config = Self::apply_env_overrides(config);
        Self::validate_config(&config)?;

        match config_path {
            Some(ref path) => info!("Loaded journey configuration from {}", path.display()),
            None => info!("No journey config file found, using defaults"),
        }
        info!(
            min_tree_distance = config.validation.min_tree_distance,
            min_spiral_distance = config.validation.min_spiral_distance,
            prefer_spiral_continuation = config.recommendation.prefer_spiral_continuation,
            "Journey configuration ready"
        );

        Ok(Self {
            config,
            config_path,
        })
    }

    /// Find and load config file
    fn load_config_file() -> Result<(JourneyConfig, Option<PathBuf>), ConfigError> {
        let local_config = Path::new(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            let config = Self::read_toml_file(local_config)?;
            return Ok((config, Some(local_config.to_path_buf())));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".journey").join("config.toml");
            if user_config.exists() {
                let config = Self::read_toml_file(&user_config)?;
                return Ok((config, Some(user_config)));
            }
        }

        Ok((JourneyConfig::default(), None))
    }

    fn read_toml_file(path: &Path) -> Result<JourneyConfig, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    fn apply_env_overrides(config: JourneyConfig) -> JourneyConfig {
        Self::apply_overrides(config, |key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup; unparsable values are ignored.
    pub fn apply_overrides<F>(mut config: JourneyConfig, lookup: F) -> JourneyConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(distance) = lookup("JOURNEY_MIN_TREE_DISTANCE") {
            if let Ok(d) = distance.parse() {
                config.validation.min_tree_distance = d;
            }
        }
        if let Some(distance) = lookup("JOURNEY_MIN_SPIRAL_DISTANCE") {
            if let Ok(d) = distance.parse() {
                config.validation.min_spiral_distance = d;
            }
        }
        if let Some(prefer) = lookup("JOURNEY_PREFER_SPIRAL_CONTINUATION") {
            config.recommendation.prefer_spiral_continuation =
                prefer.to_lowercase() == "true" || prefer == "1";
        }
        if let Some(scale) = lookup("JOURNEY_TREE_SCALE") {
            if let Ok(s) = scale.parse() {
                config.layout.tree_scale = s;
            }
        }
        if let Some(level) = lookup("RUST_LOG") {
            // Only plain levels map onto the config; filter directives stay with the subscriber.
            let level = level.to_lowercase();
            if is_known_level(&level) {
                config.logging.level = level;
            }
        }

        config
    }

    fn validate_config(config: &JourneyConfig) -> Result<(), ConfigError> {
        let distances = [
            ("validation.min_tree_distance", config.validation.min_tree_distance),
            (
                "validation.min_spiral_distance",
                config.validation.min_spiral_distance,
            ),
        ];
        for (field, value) in distances {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be a finite, non-negative number (got {})",
                    field, value
                )));
            }
        }

        if !config.layout.tree_scale.is_finite() || config.layout.tree_scale <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "layout.tree_scale must be positive (got {})",
                config.layout.tree_scale
            )));
        }

        if !is_known_level(&config.logging.level) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                config.logging.level
            )));
        }

        Ok(())
    }

    pub fn config(&self) -> &JourneyConfig {
        &self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Create a default config file
    pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        let config = JourneyConfig::default();
        let toml_str =
            toml::to_string_pretty(&config).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::ReadError(e.to_string()))?;
            }
        }

        std::fs::write(path, toml_str).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        Ok(())
    }
}

fn is_known_level(level: &str) -> bool {
    matches!(level, "trace" | "debug" | "info" | "warn" | "error")
}
