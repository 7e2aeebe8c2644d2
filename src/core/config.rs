//! Logger configuration
//!
//! [`LoggerConfig`] is the already-parsed configuration surface: which
//! driver to connect, the severity threshold, sync or async delivery, the
//! output format and the queue capacity. Driver-specific options travel in
//! `setting` untouched.
//!
//! [`SharedSettings`] holds the part of the configuration that producers
//! read on every submit and that may change while the logger runs.

use super::{
    error::{LoggerError, Result},
    formatter::{OutputFormat, DEFAULT_TEMPLATE},
    log_level::LogLevel,
    pipeline::DeliveryMode,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};

/// Driver name used when none is configured
pub const DEFAULT_DRIVER: &str = "default";

/// Async queue capacity used when `pool` is absent or not positive
pub const DEFAULT_POOL: usize = 1000;

/// Largest async queue capacity; the queue allocates every slot up front
pub const MAX_POOL: usize = 65_536;

/// Opaque driver-specific settings
pub type Setting = serde_json::Map<String, serde_json::Value>;

/// Logger configuration
///
/// # Example
///
/// ```
/// use rust_log_pipeline::{LoggerConfig, LogLevel};
///
/// let config: LoggerConfig = serde_json::from_str(r#"{
///     "driver": "file",
///     "level": "info",
///     "pool": 256,
///     "setting": { "path": "/var/log/app.log" }
/// }"#).unwrap();
///
/// assert_eq!(config.level, LogLevel::Info);
/// assert_eq!(config.queue_capacity(), 256);
/// assert_eq!(config.setting_str("path"), Some("/var/log/app.log"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Registry name of the sink driver
    pub driver: String,

    /// Least severe level that is still written
    pub level: LogLevel,

    /// Render records as JSON objects instead of the text template
    pub json: bool,

    /// Write on the caller's thread instead of through the async queue
    pub sync: bool,

    /// Async queue capacity; non-positive values select [`DEFAULT_POOL`],
    /// values above [`MAX_POOL`] fail validation
    pub pool: i64,

    /// Text template, see [`crate::core::formatter`]
    pub format: String,

    /// Driver-specific settings, passed to the driver unmodified
    pub setting: Setting,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            driver: DEFAULT_DRIVER.to_string(),
            level: LogLevel::Debug,
            json: false,
            sync: false,
            pool: DEFAULT_POOL as i64,
            format: DEFAULT_TEMPLATE.to_string(),
            setting: Setting::new(),
        }
    }
}

impl LoggerConfig {
    /// Parse a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Effective queue capacity, always within `1..=MAX_POOL`
    pub fn queue_capacity(&self) -> usize {
        if self.pool <= 0 {
            return DEFAULT_POOL;
        }
        usize::try_from(self.pool).map_or(MAX_POOL, |pool| pool.min(MAX_POOL))
    }

    pub fn delivery_mode(&self) -> DeliveryMode {
        if self.sync {
            DeliveryMode::Sync
        } else {
            DeliveryMode::Async {
                capacity: self.queue_capacity(),
            }
        }
    }

    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else if self.format.is_empty() {
            OutputFormat::default()
        } else {
            OutputFormat::text(&self.format)
        }
    }

    /// Set the threshold from a label such as `"warning"`
    pub fn set_level_label(&mut self, label: &str) -> Result<()> {
        self.level = label.parse()?;
        Ok(())
    }

    /// Check the parts of the configuration that connect depends on
    pub fn validate(&self) -> Result<()> {
        if self.driver.trim().is_empty() {
            return Err(LoggerError::config("driver", "driver name must not be empty"));
        }
        if self.pool > MAX_POOL as i64 {
            return Err(LoggerError::config(
                "pool",
                format!("queue capacity {} exceeds the maximum of {}", self.pool, MAX_POOL),
            ));
        }
        Ok(())
    }

    pub fn setting_str(&self, key: &str) -> Option<&str> {
        self.setting.get(key).and_then(serde_json::Value::as_str)
    }

    pub fn setting_bool(&self, key: &str) -> Option<bool> {
        self.setting.get(key).and_then(serde_json::Value::as_bool)
    }

    /// Fetch a string setting a driver cannot work without
    pub fn require_setting_str(&self, component: &str, key: &str) -> Result<&str> {
        self.setting_str(key).ok_or_else(|| {
            LoggerError::config(component, format!("missing string setting '{}'", key))
        })
    }
}

/// Threshold and format shared between the logger and its producers
///
/// Updates are visible to records submitted afterwards. Each record copies
/// the format when it enters the pipeline, so an update never reaches a
/// record that is already queued.
#[derive(Debug)]
pub struct SharedSettings {
    threshold: AtomicU8,
    format: RwLock<OutputFormat>,
}

impl SharedSettings {
    pub fn new(threshold: LogLevel, format: OutputFormat) -> Self {
        Self {
            threshold: AtomicU8::new(threshold as u8),
            format: RwLock::new(format),
        }
    }

    pub fn from_config(config: &LoggerConfig) -> Self {
        Self::new(config.level, config.output_format())
    }

    pub fn threshold(&self) -> LogLevel {
        LogLevel::from_u8(self.threshold.load(Ordering::Relaxed)).unwrap_or_default()
    }

    pub fn set_threshold(&self, level: LogLevel) {
        self.threshold.store(level as u8, Ordering::Relaxed);
    }

    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level.is_enabled(self.threshold())
    }

    /// Snapshot of the current format
    pub fn format(&self) -> OutputFormat {
        self.format.read().clone()
    }

    pub fn set_format(&self, format: OutputFormat) {
        *self.format.write() = format;
    }
}

impl Default for SharedSettings {
    fn default() -> Self {
        Self::from_config(&LoggerConfig::default())
    }
}
