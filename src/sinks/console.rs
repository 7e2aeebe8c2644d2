//! Console sink implementation

use crate::core::{LogLevel, LogRecord, LoggerConfig, Result, Sink};
use colored::Colorize;
use std::io::{self, Write};

/// Writes records to the terminal
///
/// FATAL and PANIC go to stderr, everything else to stdout. With colors
/// enabled the whole line is tinted by level.
pub struct ConsoleSink {
    use_colors: bool,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self { use_colors: true }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Build from the optional `colors` setting (default `true`)
    pub fn from_config(config: &LoggerConfig) -> Self {
        Self::with_colors(config.setting_bool("colors").unwrap_or(true))
    }

    fn decorate(&self, record: &LogRecord, line: &str) -> String {
        if self.use_colors {
            line.color(record.level.color_code()).to_string()
        } else {
            line.to_string()
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for ConsoleSink {
    fn open(&mut self) -> Result<()> {
        Ok(())
    }

    fn write(&mut self, record: &LogRecord, line: &str) -> Result<()> {
        let output = self.decorate(record, line);

        match record.level {
            LogLevel::Fatal | LogLevel::Panic => writeln!(io::stderr().lock(), "{}", output)?,
            _ => writeln!(io::stdout().lock(), "{}", output)?,
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        // Flush both stdout and stderr since we write to both
        io::stdout().flush()?;
        io::stderr().flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.flush()
    }

    fn name(&self) -> &str {
        "console"
    }
}

/// Driver for the `default` and `console` names
pub fn console_driver(config: &LoggerConfig) -> Result<Box<dyn Sink>> {
    Ok(Box::new(ConsoleSink::from_config(config)))
}
