//! File sink implementation

use crate::core::{LogRecord, LoggerConfig, LoggerError, Result, Sink};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Appends one line per record to a file
///
/// The file is created on `open` if missing and never truncated. With
/// `lock` enabled, `open` also takes an advisory exclusive lock so two
/// processes cannot interleave writes into the same log.
pub struct FileSink {
    path: PathBuf,
    lock: bool,
    writer: Option<BufWriter<File>>,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: false,
            writer: None,
        }
    }

    #[must_use]
    pub fn with_lock(mut self, lock: bool) -> Self {
        self.lock = lock;
        self
    }

    /// Build from the `path` (required) and `lock` settings
    pub fn from_config(config: &LoggerConfig) -> Result<Self> {
        let path = config.require_setting_str("FileSink", "path")?;
        Ok(Self::new(path).with_lock(config.setting_bool("lock").unwrap_or(false)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }
}

impl Sink for FileSink {
    fn open(&mut self) -> Result<()> {
        if self.writer.is_some() {
            return Ok(());
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                LoggerError::io_operation(
                    "opening log file",
                    self.path.display().to_string(),
                    e,
                )
            })?;

        if self.lock && fs2::FileExt::try_lock_exclusive(&file).is_err() {
            return Err(LoggerError::file_lock(self.path.display().to_string()));
        }

        self.writer = Some(BufWriter::new(file));
        Ok(())
    }

    fn write(&mut self, _record: &LogRecord, line: &str) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::writer("File sink is not open"))?;

        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };

        writer.flush()?;
        if self.lock {
            fs2::FileExt::unlock(writer.get_ref()).map_err(|e| {
                LoggerError::file_sink(self.path.display().to_string(), e.to_string())
            })?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        // Ensure all buffered data is flushed to disk
        let _ = self.flush();
    }
}

/// Driver for the `file` name
pub fn file_driver(config: &LoggerConfig) -> Result<Box<dyn Sink>> {
    Ok(Box::new(FileSink::from_config(config)?))
}
