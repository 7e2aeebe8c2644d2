//! Log record structure

use super::formatter::OutputFormat;
use super::log_level::LogLevel;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Nanoseconds since the Unix epoch for the current wall clock
pub fn now_nanos() -> i64 {
    // Only out of range after the year 2262
    Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
}

/// One leveled log message on its way through the pipeline
///
/// `format` is the rendering snapshot taken when the record enters the
/// pipeline. It is never looked up again, so reconfiguring the logger does
/// not change how records already in flight are rendered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(rename = "time")]
    pub timestamp: i64,
    pub level: LogLevel,
    pub body: String,
    #[serde(skip)]
    pub format: Option<OutputFormat>,
}

impl LogRecord {
    /// Create a record stamped with the current time
    pub fn new(level: LogLevel, body: impl Into<String>) -> Self {
        Self {
            timestamp: now_nanos(),
            level,
            body: body.into(),
            format: None,
        }
    }

    /// Create a record without a timestamp; one is assigned on submit
    pub fn unstamped(level: LogLevel, body: impl Into<String>) -> Self {
        Self {
            timestamp: 0,
            level,
            body: body.into(),
            format: None,
        }
    }

    #[must_use]
    pub fn with_timestamp(mut self, nanos: i64) -> Self {
        self.timestamp = nanos;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn is_stamped(&self) -> bool {
        self.timestamp > 0
    }

    /// Fill in the timestamp and format snapshot if the caller left them unset
    pub(crate) fn stamp(&mut self, format: impl FnOnce() -> OutputFormat) {
        if !self.is_stamped() {
            self.timestamp = now_nanos();
        }
        if self.format.is_none() {
            self.format = Some(format());
        }
    }
}
