//! Sink trait for log delivery targets

use super::{error::Result, record::LogRecord};

/// A destination for rendered log records
///
/// The pipeline serializes every call, so implementations only need to be
/// `Send`. `open` is called once by `Logger::connect` and `close` once by
/// `Logger::terminate`.
pub trait Sink: Send {
    /// Acquire the underlying resource; failure aborts connect
    fn open(&mut self) -> Result<()>;

    /// Deliver one record; `line` is the record rendered with its format snapshot
    fn write(&mut self, record: &LogRecord, line: &str) -> Result<()>;

    /// Push any buffered output to the underlying resource
    fn flush(&mut self) -> Result<()>;

    /// Release the underlying resource
    fn close(&mut self) -> Result<()>;

    fn name(&self) -> &str;
}
