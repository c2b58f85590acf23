//! Configuration management for Frauditor.
//!
//! Configuration is read from `~/.config/frauditor/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.
//!
//! The page selectors and class markers default to the product page's
//! currently observed markup. They live in config precisely because that
//! markup is versioned and churns.

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::extract::Markers;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub page: PageConfig,
    pub classifier: ClassifierConfig,
    pub crawl: CrawlConfig,
}

/// Selectors, class markers and timing for the watched product page.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Whether to run the browser in headless mode (default: true)
    pub headless: bool,

    /// Selector for the review list container
    pub container_selector: String,

    /// Selector for the wrapper whose opacity animates during pagination
    pub wrapper_selector: String,

    /// Selector for the "next page" control
    pub next_selector: String,

    /// Class marker carried by a filled rating star
    pub filled_star_marker: String,

    /// Class marker carried by a review's free-text content block
    pub content_marker: String,

    /// Class marker carried by a review's image-attachment block
    pub image_marker: String,

    /// Wait after a pagination transition settles before re-harvesting,
    /// in milliseconds (default: 200)
    pub settle_delay_ms: u64,

    /// Interval between opacity/visibility polls in milliseconds (default: 250)
    pub poll_interval_ms: u64,

    /// How long to wait for the review container to scroll into view,
    /// in seconds (default: 120)
    pub visibility_timeout_secs: u64,

    /// User agent string to use
    pub user_agent: Option<String>,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            headless: true,
            container_selector: ".shopee-product-ratings__list".to_string(),
            wrapper_selector: ".shopee-product-ratings".to_string(),
            next_selector: ".shopee-icon-button--right".to_string(),
            filled_star_marker: "icon-rating-solid--active".to_string(),
            content_marker: "shopee-product-ratings__review".to_string(),
            image_marker: "shopee-product-ratings__images".to_string(),
            settle_delay_ms: 200,
            poll_interval_ms: 250,
            visibility_timeout_secs: 120,
            user_agent: Some(
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                    .to_string(),
            ),
        }
    }
}

impl PageConfig {
    /// Get the settle delay as a Duration
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Get the poll interval as a Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Get the visibility timeout as a Duration
    pub fn visibility_timeout(&self) -> Duration {
        Duration::from_secs(self.visibility_timeout_secs)
    }

    /// Class markers consumed by the field extractor
    pub fn markers(&self) -> Markers {
        Markers {
            filled_star: self.filled_star_marker.clone(),
            content_block: self.content_marker.clone(),
            image_block: self.image_marker.clone(),
        }
    }
}

/// Classification service endpoint settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Base URL of the classification service
    pub endpoint: String,

    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:5000".to_string(),
            timeout_secs: 30,
        }
    }
}

impl ClassifierConfig {
    /// Get the request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Multi-page crawl settings for `scan --pages`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Hard cap on pages visited in one crawl (default: 5)
    pub max_pages: u32,

    /// Delay between clicking "next" and harvesting the new page,
    /// in milliseconds (default: 1500)
    pub page_delay_ms: u64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: 5,
            page_delay_ms: 1500,
        }
    }
}

impl CrawlConfig {
    /// Get the between-pages delay as a Duration
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(config)
    }

    /// Get the default config file path: `~/.config/frauditor/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("frauditor").join("config.toml"))
    }

    /// Create a default config file with comments.
    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let default_config = Self::default_config_content();

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(default_config.as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# Frauditor configuration
#
# Selectors and class markers track the product page's markup. The page's
# class names are generated and change between site releases; when badges
# stop appearing, these are the first thing to re-check.

[page]
# Run Chrome headless. Set to false to watch the browser work.
headless = true

# Review list container and the wrapper whose opacity animates during
# client-side pagination.
container_selector = ".shopee-product-ratings__list"
wrapper_selector = ".shopee-product-ratings"

# The "next page" control (only ever observed or clicked, never scraped).
next_selector = ".shopee-icon-button--right"

# Class markers matched as substrings of an element's class attribute.
filled_star_marker = "icon-rating-solid--active"
content_marker = "shopee-product-ratings__review"
image_marker = "shopee-product-ratings__images"

# Milliseconds to wait after a pagination transition settles before
# trusting the DOM and re-harvesting.
settle_delay_ms = 200

# Opacity/visibility polling interval in milliseconds.
poll_interval_ms = 250

# Seconds to wait for the review list to scroll into view.
visibility_timeout_secs = 120

[classifier]
# Base URL of the classification service.
endpoint = "http://127.0.0.1:5000"
timeout_secs = 30

[crawl]
# Page cap and inter-page delay for `scan --pages`.
max_pages = 5
page_delay_ms = 1500
"##
        .to_string()
    }
}
