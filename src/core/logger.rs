//! Logger lifecycle and caller-facing API

use super::{
    config::{LoggerConfig, SharedSettings},
    error::{LoggerError, Result},
    formatter::OutputFormat,
    log_level::LogLevel,
    metrics::PipelineMetrics,
    pipeline::{DeliveryMode, ErrorCallback, Pipeline},
    record::LogRecord,
    registry::DriverRegistry,
    sink::Sink,
};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::Arc;

/// Where a logger is in its lifecycle
///
/// The only transitions are `Unconnected -> Connected* -> Terminated` and
/// `Unconnected -> Terminated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Unconnected,
    ConnectedSync,
    ConnectedAsync,
    Terminated,
}

impl PipelineState {
    pub fn is_connected(&self) -> bool {
        matches!(
            self,
            PipelineState::ConnectedSync | PipelineState::ConnectedAsync
        )
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Unconnected => "unconnected",
            PipelineState::ConnectedSync => "connected-sync",
            PipelineState::ConnectedAsync => "connected-async",
            PipelineState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// A leveled logger bound to at most one sink
///
/// Created unconnected; every logging call fails with
/// [`LoggerError::NoConnection`] until [`Logger::connect`] succeeds.
///
/// # Example
///
/// ```
/// use rust_log_pipeline::{DriverRegistry, Logger, LogLevel};
///
/// let logger = Logger::builder()
///     .driver("console")
///     .min_level(LogLevel::Info)
///     .sync_mode()
///     .build();
///
/// logger.connect_driver(&DriverRegistry::with_builtin()).unwrap();
/// logger.info("service started").unwrap();
/// logger.debug("below the threshold, dropped").unwrap();
/// logger.terminate().unwrap();
/// ```
pub struct Logger {
    config: LoggerConfig,
    settings: Arc<SharedSettings>,
    metrics: Arc<PipelineMetrics>,
    on_error: Option<ErrorCallback>,
    /// Serializes connect and terminate
    state: Mutex<PipelineState>,
    pipeline: RwLock<Option<Arc<Pipeline>>>,
}

impl Logger {
    #[must_use]
    pub fn new(config: LoggerConfig) -> Self {
        Self {
            settings: Arc::new(SharedSettings::from_config(&config)),
            config,
            metrics: Arc::new(PipelineMetrics::new()),
            on_error: None,
            state: Mutex::new(PipelineState::Unconnected),
            pipeline: RwLock::new(None),
        }
    }

    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// Open `sink` and start delivering to it
    ///
    /// On failure the logger stays unconnected and the sink is dropped.
    pub fn connect(&self, mut sink: Box<dyn Sink>, mode: DeliveryMode) -> Result<()> {
        let mut state = self.state.lock();
        match *state {
            PipelineState::Unconnected => {}
            PipelineState::ConnectedSync | PipelineState::ConnectedAsync => {
                return Err(LoggerError::AlreadyConnected)
            }
            PipelineState::Terminated => return Err(LoggerError::Terminated),
        }

        let name = sink.name().to_string();
        sink.open().map_err(|e| LoggerError::sink_open(name, e))?;

        let mut pipeline = Pipeline::new(sink, mode, Arc::clone(&self.settings))
            .with_metrics(Arc::clone(&self.metrics));
        if let Some(ref callback) = self.on_error {
            pipeline = pipeline.with_error_callback(Arc::clone(callback));
        }

        if let Err(e) = pipeline.start() {
            if let Some(mut sink) = pipeline.take_sink() {
                let _ = sink.close();
            }
            return Err(e);
        }

        *self.pipeline.write() = Some(Arc::new(pipeline));
        *state = if mode.is_async() {
            PipelineState::ConnectedAsync
        } else {
            PipelineState::ConnectedSync
        };
        Ok(())
    }

    /// Build the configured driver's sink from `registry` and connect it
    pub fn connect_driver(&self, registry: &DriverRegistry) -> Result<()> {
        self.config.validate()?;
        let driver = registry.driver(&self.config.driver)?;
        let sink = driver.connect(&self.config)?;
        self.connect(sink, self.config.delivery_mode())
    }

    /// Flush, stop the pipeline and close the sink
    ///
    /// Later calls do nothing. A logger that was never connected simply
    /// becomes terminated.
    pub fn terminate(&self) -> Result<()> {
        let mut state = self.state.lock();
        if *state == PipelineState::Terminated {
            return Ok(());
        }
        *state = PipelineState::Terminated;

        let Some(pipeline) = self.pipeline.write().take() else {
            return Ok(());
        };

        if let Err(e) = pipeline.flush() {
            eprintln!("[LOGGER ERROR] Failed to flush during terminate: {}", e);
        }
        pipeline.stop();

        match pipeline.take_sink() {
            Some(mut sink) => sink.close(),
            None => Ok(()),
        }
    }

    /// Deliver a record built by the caller
    ///
    /// The timestamp and format snapshot are filled in if unset.
    pub fn submit(&self, record: LogRecord) -> Result<()> {
        self.pipeline()?.submit(record)
    }

    pub fn log(&self, level: LogLevel, body: impl Into<String>) -> Result<()> {
        let pipeline = self.pipeline()?;
        if !self.settings.enabled(level) {
            self.metrics.record_filtered();
            return Ok(());
        }
        pipeline.submit(LogRecord::new(level, body))
    }

    /// Wait until everything logged so far has reached the sink
    pub fn flush(&self) -> Result<()> {
        self.pipeline()?.flush()
    }

    #[inline]
    pub fn fatal(&self, body: impl Into<String>) -> Result<()> {
        self.log(LogLevel::Fatal, body)
    }

    #[inline]
    pub fn panic(&self, body: impl Into<String>) -> Result<()> {
        self.log(LogLevel::Panic, body)
    }

    #[inline]
    pub fn warning(&self, body: impl Into<String>) -> Result<()> {
        self.log(LogLevel::Warning, body)
    }

    #[inline]
    pub fn notice(&self, body: impl Into<String>) -> Result<()> {
        self.log(LogLevel::Notice, body)
    }

    #[inline]
    pub fn info(&self, body: impl Into<String>) -> Result<()> {
        self.log(LogLevel::Info, body)
    }

    #[inline]
    pub fn trace(&self, body: impl Into<String>) -> Result<()> {
        self.log(LogLevel::Trace, body)
    }

    #[inline]
    pub fn debug(&self, body: impl Into<String>) -> Result<()> {
        self.log(LogLevel::Debug, body)
    }

    /// Change the threshold for records submitted from now on
    pub fn set_level(&self, level: LogLevel) {
        self.settings.set_threshold(level);
    }

    pub fn level(&self) -> LogLevel {
        self.settings.threshold()
    }

    #[inline]
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        self.settings.enabled(level)
    }

    /// Switch to a text template for records submitted from now on
    pub fn set_format(&self, template: impl AsRef<str>) {
        self.settings.set_format(OutputFormat::text(template));
    }

    pub fn set_output_format(&self, format: OutputFormat) {
        self.settings.set_format(format);
    }

    pub fn output_format(&self) -> OutputFormat {
        self.settings.format()
    }

    pub fn state(&self) -> PipelineState {
        *self.state.lock()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// The configuration this logger was built with
    ///
    /// Runtime changes through `set_level`/`set_format` are not reflected.
    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    /// Get the pipeline metrics for observability
    ///
    /// Counters accumulate across the logger's whole life.
    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    fn pipeline(&self) -> Result<Arc<Pipeline>> {
        self.pipeline
            .read()
            .as_ref()
            .map(Arc::clone)
            .ok_or(LoggerError::NoConnection)
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LoggerConfig::default())
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if let Err(e) = self.terminate() {
            eprintln!("[LOGGER ERROR] Failed to close sink on drop: {}", e);
        }

        let failures = self.metrics.write_failures();
        if failures > 0 {
            eprintln!(
                "[LOGGER WARNING] {} records failed to reach the sink ({:.2}% failure rate)",
                failures,
                self.metrics.failure_rate()
            );
        }
    }
}

/// Fluent construction of a [`Logger`]
///
/// # Example
///
/// ```
/// use rust_log_pipeline::{Logger, LogLevel, PipelineState};
///
/// let logger = Logger::builder()
///     .driver("file")
///     .setting("path", "/tmp/app.log")
///     .min_level(LogLevel::Notice)
///     .async_mode(256)
///     .json(true)
///     .build();
///
/// assert_eq!(logger.config().queue_capacity(), 256);
/// assert_eq!(logger.state(), PipelineState::Unconnected);
/// ```
#[derive(Default)]
pub struct LoggerBuilder {
    config: LoggerConfig,
    on_error: Option<ErrorCallback>,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration
    #[must_use]
    pub fn config(mut self, config: LoggerConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn driver(mut self, name: impl Into<String>) -> Self {
        self.config.driver = name.into();
        self
    }

    #[must_use]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.config.level = level;
        self
    }

    #[must_use]
    pub fn format(mut self, template: impl Into<String>) -> Self {
        self.config.format = template.into();
        self
    }

    #[must_use]
    pub fn json(mut self, enabled: bool) -> Self {
        self.config.json = enabled;
        self
    }

    #[must_use]
    pub fn sync_mode(mut self) -> Self {
        self.config.sync = true;
        self
    }

    /// Deliver through a queue holding at most `capacity` records
    #[must_use]
    pub fn async_mode(mut self, capacity: usize) -> Self {
        self.config.sync = false;
        self.config.pool = i64::try_from(capacity).unwrap_or(i64::MAX);
        self
    }

    /// Add a driver-specific setting
    #[must_use]
    pub fn setting(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.config.setting.insert(key.into(), value.into());
        self
    }

    /// Observe write failures that happen on the worker thread
    ///
    /// The callback runs on the delivery thread and may log through this
    /// logger. Such calls never wait for queue space: when the queue is full
    /// the record is rejected with [`LoggerError::QueueFull`]. Do not call
    /// [`Logger::terminate`] from the callback.
    #[must_use]
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&LoggerError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(callback));
        self
    }

    pub fn build(self) -> Logger {
        let mut logger = Logger::new(self.config);
        logger.on_error = self.on_error;
        logger
    }
}
