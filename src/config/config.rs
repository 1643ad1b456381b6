use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::data::pagination::PageSize;
use crate::data::virtualizer::{
    VirtualizerConfig, DEFAULT_OVERSCAN, DEFAULT_ROW_HEIGHT, DEFAULT_THRESHOLD,
};

const APP_DIR: &str = "sql-workbench";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub grid: GridConfig,
    pub execution: ExecutionConfig,
    pub history: HistoryConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Initial page size; one of 10, 25, 50, 100, 500
    pub default_page_size: PageSize,

    /// Pages with more rows than this are rendered through a window
    pub virtualization_threshold: usize,

    /// Estimated row height in pixel units
    pub row_height: usize,

    /// Extra rows rendered above and below the viewport
    pub overscan: usize,

    /// Unlimited results above this size get a performance notice
    pub large_result_warning: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Fixed part of the simulated query latency
    pub min_delay_ms: u64,

    /// Upper bound of the random part added on top
    pub max_random_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub enabled: bool,
    pub max_entries: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Where saved queries and history live (leave unset for the default)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            default_page_size: PageSize::default(),
            virtualization_threshold: DEFAULT_THRESHOLD,
            row_height: DEFAULT_ROW_HEIGHT,
            overscan: DEFAULT_OVERSCAN,
            large_result_warning: 500,
        }
    }
}

impl GridConfig {
    pub fn virtualizer(&self) -> VirtualizerConfig {
        VirtualizerConfig {
            row_height: self.row_height,
            overscan: self.overscan,
            threshold: self.virtualization_threshold,
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 300,
            max_random_delay_ms: 500,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 100,
        }
    }
}

impl StorageConfig {
    /// The configured directory, or the platform data dir
    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Ok(data_dir.join(APP_DIR))
    }
}

impl Config {
    /// Load config from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            // Create default config if it doesn't exist
            let default_config = Self::default();
            default_config.save_to(&config_path)?;
            info!("Wrote default config to {}", config_path.display());
            return Ok(default_config);
        }

        Self::load_from(&config_path)
    }

    /// Load config from an explicit file. Missing sections fall back to defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("Invalid config {}: {}", path.display(), e))?;
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        Ok(())
    }

    /// Get the default config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join(APP_DIR).join("config.toml"))
    }

    /// Create a default config file with comments
    pub fn create_default_with_comments() -> String {
        r#"# SQL Workbench Configuration File
# Location: ~/.config/sql-workbench/config.toml (Linux)
#           ~/Library/Application Support/sql-workbench/config.toml (macOS)
#           %APPDATA%\sql-workbench\config.toml (Windows)

[grid]
# Rows per page when a result is first shown: 10, 25, 50, 100 or 500
default_page_size = 25

# Pages with more rows than this only render the rows near the viewport
virtualization_threshold = 100

# Estimated height of one row
row_height = 45

# Rows rendered beyond each edge of the viewport
overscan = 10

# Show a performance notice above this many rows
large_result_warning = 500

[execution]
# Simulated latency is min_delay_ms plus a random 0..max_random_delay_ms
min_delay_ms = 300
max_random_delay_ms = 500

[history]
# Record every executed query
enabled = true

# Maximum number of history entries to keep
max_entries = 100

[storage]
# Directory for saved queries and history (leave commented to use default)
# data_dir = "/path/to/data"
"#
        .to_string()
    }
}
