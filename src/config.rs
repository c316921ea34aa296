//! Configuration System
//!
//! Grid-wide defaults, paging and logging settings. Loaded from a TOML
//! file with environment variable overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::sorting::SortMode;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub grid: GridConfig,

    #[serde(default)]
    pub paging: PagingConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Defaults applied to every column of a grid
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GridConfig {
    /// Enable sorting on columns that do not set it themselves
    #[serde(default)]
    pub sortable: bool,

    /// Enable filtering on columns that do not set it themselves
    #[serde(default)]
    pub filterable: bool,

    #[serde(default)]
    pub sort_mode: SortMode,

    /// Totals format pattern for columns without their own
    #[serde(default)]
    pub default_format: Option<String>,
}

/// How rows are paged to the client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PagingType {
    #[default]
    Standard,
    Virtualization,
}

impl std::str::FromStr for PagingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "virtualization" => Ok(Self::Virtualization),
            other => Err(format!("Unknown paging type: {}", other)),
        }
    }
}

/// Paging configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PagingConfig {
    #[serde(default)]
    pub kind: PagingType,

    /// Virtualized pagers may skip totals entirely
    #[serde(default)]
    pub no_totals: bool,
}

impl PagingConfig {
    /// Whether the totals pass is skipped for this paging setup
    pub fn skips_totals(&self) -> bool {
        self.kind == PagingType::Virtualization && self.no_totals
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("tabula").join("config.toml")),
            Some(PathBuf::from("./tabula.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply `TABULA_*` environment variable overrides
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Grid overrides
        if let Some(sortable) = var("TABULA_SORTABLE").and_then(|v| v.parse().ok()) {
            self.grid.sortable = sortable;
        }
        if let Some(filterable) = var("TABULA_FILTERABLE").and_then(|v| v.parse().ok()) {
            self.grid.filterable = filterable;
        }
        if let Some(mode) = var("TABULA_SORT_MODE") {
            match mode.trim() {
                "three_state" => self.grid.sort_mode = SortMode::ThreeState,
                "two_state" => self.grid.sort_mode = SortMode::TwoState,
                other => tracing::warn!("Ignoring TABULA_SORT_MODE={}", other),
            }
        }
        if let Some(format) = var("TABULA_DEFAULT_FORMAT") {
            self.grid.default_format = Some(format);
        }

        // Paging overrides
        if let Some(kind) = var("TABULA_PAGING") {
            match kind.parse() {
                Ok(kind) => self.paging.kind = kind,
                Err(e) => tracing::warn!("Ignoring TABULA_PAGING: {}", e),
            }
        }
        if let Some(no_totals) = var("TABULA_NO_TOTALS").and_then(|v| v.parse().ok()) {
            self.paging.no_totals = no_totals;
        }

        // Logging overrides
        if let Some(level) = var("TABULA_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("TABULA_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Tabula Configuration
#
# Environment variables override these settings:
# - TABULA_SORTABLE
# - TABULA_FILTERABLE
# - TABULA_SORT_MODE
# - TABULA_DEFAULT_FORMAT
# - TABULA_PAGING
# - TABULA_NO_TOTALS
# - TABULA_LOG_LEVEL
# - TABULA_LOG_FORMAT

[grid]
# Enable sorting on columns that do not configure it
sortable = false

# Enable filtering on columns that do not configure it
filterable = false

# Sort cycle: three_state (asc, desc, unsorted) or two_state (asc, desc)
sort_mode = "three_state"

# printf-style pattern for totals of columns without their own format
# default_format = "%.2f"

[paging]
# Paging type: standard or virtualization
kind = "standard"

# Skip totals for virtualized grids
no_totals = false

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
