//! Configuration module for SpotView
//!
//! Holds the initial view state of each admin table: page size, the page
//! size choices offered, the default sort and how often the table polls its
//! data source. Live view state (filters, current page) is never persisted.
//!
//! # Config Location
//!
//! The dashboard config is read from the platform config directory:
//! - **Linux**: `~/.config/dev.spotview/dashboard.toml`
//! - **macOS**: `~/Library/Application Support/dev.spotview/dashboard.toml`
//! - **Windows**: `%APPDATA%\dev.spotview\dashboard.toml`
//!
//! # Example
//!
//! ```ignore
//! use spotview::config::DashboardConfig;
//!
//! let config = DashboardConfig::load_or_default();
//! let interval = config.parking_spots.poll_interval();
//! ```

use crate::error::{Result, SpotViewError};
use crate::pipeline::{PaginationState, SortKey, DEFAULT_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application identifier for config directories
pub const APP_ID: &str = "dev.spotview";

/// Dashboard config filename
pub const CONFIG_FILE: &str = "dashboard.toml";

/// Page sizes offered by the table footer
pub const DEFAULT_PAGE_SIZE_OPTIONS: [usize; 8] = [1, 2, 5, 10, 20, 30, 40, 50];

/// Default refresh interval of the parking spot table in milliseconds
pub const DEFAULT_PARKING_POLL_MS: u64 = 2500;

// ==================== Config Directory ====================

/// Get the application config directory path
pub fn app_config_dir() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID))
}

/// Get the path to the dashboard config file
pub fn config_path() -> Option<PathBuf> {
    app_config_dir().map(|p| p.join(CONFIG_FILE))
}

// ==================== Table Config ====================

/// Initial view state of one table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default = "default_page_size_options")]
    pub page_size_options: Vec<usize>,

    /// Polling interval; absent means fetch once and on explicit refetch
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,

    #[serde(default)]
    pub default_sort: Vec<SortKey>,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_page_size_options() -> Vec<usize> {
    DEFAULT_PAGE_SIZE_OPTIONS.to_vec()
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            page_size_options: default_page_size_options(),
            poll_interval_ms: None,
            default_sort: Vec::new(),
        }
    }
}

impl TableConfig {
    /// Parking spot table defaults: polled, newest occupancy first
    pub fn parking_spots() -> Self {
        Self {
            poll_interval_ms: Some(DEFAULT_PARKING_POLL_MS),
            default_sort: vec![SortKey::desc("occupiedTimestamp")],
            ..Self::default()
        }
    }

    /// User table defaults: fetched on demand, unsorted
    pub fn users() -> Self {
        Self::default()
    }

    pub fn poll_interval(&self) -> Option<Duration> {
        self.poll_interval_ms
            .filter(|&ms| ms > 0)
            .map(Duration::from_millis)
    }

    /// Starting pagination, first page at the configured size
    pub fn pagination(&self) -> PaginationState {
        PaginationState::with_page_size(self.page_size)
    }

    /// Check the values a hand-edited file could get wrong
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(SpotViewError::Config("page_size must be at least 1".to_string()));
        }
        if self.page_size_options.contains(&0) {
            return Err(SpotViewError::Config(
                "page_size_options must not contain 0".to_string(),
            ));
        }
        Ok(())
    }
}

// ==================== Dashboard Config ====================

/// Config of every admin table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "TableConfig::users")]
    pub users: TableConfig,

    #[serde(default = "TableConfig::parking_spots")]
    pub parking_spots: TableConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            users: TableConfig::users(),
            parking_spots: TableConfig::parking_spots(),
        }
    }
}

impl DashboardConfig {
    /// Load the config from the default location
    ///
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let path = config_path().ok_or_else(|| {
            SpotViewError::Config("Could not determine config directory".to_string())
        })?;

        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load the config, returning defaults on any error
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load dashboard config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Load and validate a config file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SpotViewError::Config(format!("Failed to read config {:?}: {}", path, e))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            SpotViewError::Config(format!("Failed to parse config {:?}: {}", path, e))
        })?;

        config.users.validate()?;
        config.parking_spots.validate()?;
        tracing::debug!("Loaded dashboard config from {:?}", path);
        Ok(config)
    }

    /// Save the config to the default location
    pub fn save(&self) -> Result<()> {
        let path = config_path().ok_or_else(|| {
            SpotViewError::Config("Could not determine config directory".to_string())
        })?;
        self.save_to(path)
    }

    /// Save the config as TOML, creating parent directories
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SpotViewError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| SpotViewError::Serialization(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| {
            SpotViewError::Config(format!("Failed to write config {:?}: {}", path, e))
        })
    }
}
