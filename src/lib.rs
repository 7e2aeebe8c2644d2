//! # Rust Log Pipeline
//!
//! A leveled logging pipeline that moves records from any number of
//! producer threads to a single pluggable sink.
//!
//! ## Features
//!
//! - **Sync or Async Delivery**: write on the caller's thread, or through a
//!   bounded queue drained by one worker thread
//! - **Backpressure**: a full queue blocks producers; records are never dropped
//!   (an error callback logging from the delivery thread gets
//!   [`LoggerError::QueueFull`] instead of waiting on itself)
//! - **Flush Coordination**: `flush()` returns once everything logged before
//!   it has reached the sink
//! - **Pluggable Sinks**: console, file and TCP built in; custom sinks through
//!   the [`Sink`] trait and the [`DriverRegistry`]
//!
//! ## Example
//!
//! ```
//! use rust_log_pipeline::prelude::*;
//!
//! let logger = Logger::builder()
//!     .driver("console")
//!     .min_level(LogLevel::Info)
//!     .format("%time% [%level%] %body%")
//!     .async_mode(1024)
//!     .build();
//!
//! logger.connect_driver(&DriverRegistry::with_builtin())?;
//! logger.info("Application started")?;
//! logger.flush()?;
//! logger.terminate()?;
//! # Ok::<(), LoggerError>(())
//! ```

pub mod core;
pub mod macros;
pub mod sinks;

pub mod prelude {
    pub use crate::core::{
        DeliveryMode, DriverRegistry, LogLevel, LogRecord, Logger, LoggerBuilder, LoggerConfig,
        LoggerError, OutputFormat, PipelineMetrics, PipelineState, Result, Sink,
    };
    #[cfg(feature = "console")]
    pub use crate::sinks::ConsoleSink;
    #[cfg(feature = "file")]
    pub use crate::sinks::FileSink;
    #[cfg(feature = "network")]
    pub use crate::sinks::NetworkSink;
}

pub use core::{
    render, DeliveryMode, Driver, DriverRegistry, ErrorCallback, LogLevel, LogRecord, Logger,
    LoggerBuilder, LoggerConfig, LoggerError, OutputFormat, Pipeline, PipelineMetrics,
    PipelineState, Result, Setting, SharedSettings, Sink, DEFAULT_TEMPLATE, MAX_POOL,
};
