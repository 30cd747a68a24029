//! Configuration types for auto-unpack
//!
//! The configuration document is YAML. Each product line lists the staging directories
//! to watch and where outcome notifications go:
//!
//! ```yaml
//! product_lines:
//!   - name: line-a
//!     watch_directories:
//!       - path: /data/line-a/incoming
//!         extract_mode: nested
//!     notification:
//!       dingtalk:
//!         webhook_url: https://oapi.dingtalk.com/robot/send?access_token=abc
//! notification_timeout: 10
//! keep_failed_archives: false
//! ```

use crate::error::{Error, Result};
use crate::types::{ExtractMode, WatchPolicy};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration for the archive watcher
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Product lines and their watched directories (at least one required)
    #[serde(default)]
    pub product_lines: Vec<ProductLineConfig>,

    /// Processing behavior
    #[serde(flatten)]
    pub extraction: ExtractionConfig,

    /// Timeout for a single notification request (default: 10 seconds)
    #[serde(default = "default_notification_timeout", with = "duration_serde")]
    pub notification_timeout: Duration,
}

/// Product line configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProductLineConfig {
    /// Product line name, shown in notifications
    pub name: String,

    /// Staging directories owned by this product line
    #[serde(default)]
    pub watch_directories: Vec<WatchDirectoryConfig>,

    /// Where outcome notifications for this product line go
    #[serde(default)]
    pub notification: NotificationConfig,
}

/// One watched staging directory
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WatchDirectoryConfig {
    /// Directory to watch (non-recursive)
    pub path: PathBuf,

    /// Extraction mode (default: nested)
    #[serde(default)]
    pub extract_mode: ExtractMode,
}

/// Notification destinations for a product line
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// DingTalk-style markdown robot webhook
    #[serde(default)]
    pub dingtalk: Option<WebhookTarget>,
}

/// A webhook endpoint
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WebhookTarget {
    /// URL to POST outcome messages to
    pub webhook_url: Option<String>,
}

/// Archive processing behavior
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Keep the source archive when decoding fails (default: false, the archive is
    /// deleted after every decode attempt)
    #[serde(default)]
    pub keep_failed_archives: bool,
}

impl Config {
    /// Load and validate a configuration document from disk
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the file cannot be read, is not valid YAML, or fails
    /// validation.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read {}: {}", path.display(), e),
            key: None,
        })?;
        Self::from_yaml(&raw)
    }

    /// Parse and validate a configuration document
    pub fn from_yaml(raw: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(raw).map_err(|e| Error::Config {
            message: format!("invalid configuration document: {}", e),
            key: None,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for structural problems
    ///
    /// Unknown extraction modes are accepted here and reported at processing time.
    pub fn validate(&self) -> Result<()> {
        if self.product_lines.is_empty() {
            return Err(Error::config(
                "at least one product line is required",
                "product_lines",
            ));
        }

        let mut seen = HashSet::new();
        for line in &self.product_lines {
            if line.name.trim().is_empty() {
                return Err(Error::config(
                    "product line name must not be empty",
                    "product_lines.name",
                ));
            }

            for dir in &line.watch_directories {
                if dir.path.as_os_str().is_empty() {
                    return Err(Error::config(
                        format!("product line '{}' has an empty watch path", line.name),
                        "watch_directories.path",
                    ));
                }
                if !seen.insert(dir.path.clone()) {
                    return Err(Error::config(
                        format!("directory {} is watched more than once", dir.path.display()),
                        "watch_directories.path",
                    ));
                }
            }

            if let Some(url) = line.webhook_url() {
                url::Url::parse(url).map_err(|e| {
                    Error::config(
                        format!("product line '{}' has an invalid webhook URL: {}", line.name, e),
                        "notification.dingtalk.webhook_url",
                    )
                })?;
            }
        }

        Ok(())
    }

    /// Flatten product lines into one policy per watched directory
    pub fn policies(&self) -> Vec<WatchPolicy> {
        self.product_lines
            .iter()
            .flat_map(|line| {
                line.watch_directories.iter().map(move |dir| WatchPolicy {
                    directory: dir.path.clone(),
                    mode: dir.extract_mode.clone(),
                    product_line: line.name.clone(),
                    notification_target: line.webhook_url().map(str::to_string),
                })
            })
            .collect()
    }
}

impl ProductLineConfig {
    /// Webhook URL for this product line, if configured
    pub fn webhook_url(&self) -> Option<&str> {
        self.notification
            .dingtalk
            .as_ref()
            .and_then(|d| d.webhook_url.as_deref())
            .filter(|url| !url.trim().is_empty())
    }
}

fn default_notification_timeout() -> Duration {
    Duration::from_secs(10)
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
