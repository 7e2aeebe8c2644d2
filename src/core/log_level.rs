//! Log level definitions
//!
//! Levels are ordered from most severe to least severe. A lower numeric
//! value means a more severe record, so a threshold admits every level
//! that compares `<=` to it.

use super::error::LoggerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "&'static str", try_from = "String")]
#[derive(Default)]
#[repr(u8)]
pub enum LogLevel {
    Fatal = 0,
    Panic = 1,
    Warning = 2,
    Notice = 3,
    Info = 4,
    Trace = 5,
    #[default]
    Debug = 6,
}

impl LogLevel {
    /// Every level, most severe first
    pub const ALL: [LogLevel; 7] = [
        LogLevel::Fatal,
        LogLevel::Panic,
        LogLevel::Warning,
        LogLevel::Notice,
        LogLevel::Info,
        LogLevel::Trace,
        LogLevel::Debug,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::Fatal => "FATAL",
            LogLevel::Panic => "PANIC",
            LogLevel::Warning => "WARNING",
            LogLevel::Notice => "NOTICE",
            LogLevel::Info => "INFO",
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
        }
    }

    /// Look a level up by its numeric severity
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    /// Whether a record at this level passes the given threshold
    #[inline]
    pub fn is_enabled(&self, threshold: LogLevel) -> bool {
        *self <= threshold
    }

    #[cfg(feature = "console")]
    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            LogLevel::Fatal => BrightRed,
            LogLevel::Panic => Red,
            LogLevel::Warning => Yellow,
            LogLevel::Notice => Cyan,
            LogLevel::Info => Green,
            LogLevel::Trace => Blue,
            LogLevel::Debug => BrightBlack,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "FATAL" => Ok(LogLevel::Fatal),
            "PANIC" => Ok(LogLevel::Panic),
            "WARNING" | "WARN" => Ok(LogLevel::Warning),
            "NOTICE" => Ok(LogLevel::Notice),
            "INFO" => Ok(LogLevel::Info),
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            _ => Err(LoggerError::invalid_level(s)),
        }
    }
}

impl From<LogLevel> for &'static str {
    fn from(level: LogLevel) -> Self {
        level.to_str()
    }
}

impl TryFrom<String> for LogLevel {
    type Error = LoggerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
