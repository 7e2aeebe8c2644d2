//! Core pipeline types and traits

pub mod config;
pub mod error;
pub mod formatter;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod pipeline;
pub mod record;
pub mod registry;
pub mod sink;

pub use config::{LoggerConfig, Setting, SharedSettings, DEFAULT_DRIVER, DEFAULT_POOL, MAX_POOL};
pub use error::{LoggerError, Result};
pub use formatter::{render, OutputFormat, DEFAULT_TEMPLATE};
pub use log_level::LogLevel;
pub use logger::{Logger, LoggerBuilder, PipelineState};
pub use metrics::PipelineMetrics;
pub use pipeline::{DeliveryMode, ErrorCallback, Pipeline};
pub use record::LogRecord;
pub use registry::{Driver, DriverRegistry};
pub use sink::Sink;
