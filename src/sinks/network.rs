//! Network sink for remote logging
//!
//! Streams newline-delimited records to a TCP collector.

use crate::core::{LogRecord, LoggerConfig, LoggerError, Result, Sink};
use std::io::Write;
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

/// Default socket write/read timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Sink that sends records to a remote TCP server
///
/// The connection is made on `open`. If a write finds the stream broken the
/// sink reconnects once and resends that line; a second failure is
/// returned to the pipeline.
///
/// # Example
///
/// ```no_run
/// use rust_log_pipeline::sinks::NetworkSink;
/// use rust_log_pipeline::{DeliveryMode, Logger};
///
/// let logger = Logger::default();
/// logger
///     .connect(Box::new(NetworkSink::new("127.0.0.1:5140")), DeliveryMode::Async { capacity: 512 })
///     .expect("Failed to connect to log server");
///
/// logger.info("This record will be sent to 127.0.0.1:5140").unwrap();
/// ```
pub struct NetworkSink {
    stream: Option<TcpStream>,
    address: String,
    reconnect_on_error: bool,
    timeout: Duration,
}

impl NetworkSink {
    /// Create an unconnected sink for `address` (e.g. "localhost:5140")
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            stream: None,
            address: address.into(),
            reconnect_on_error: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Enable or disable the single reconnect attempt on a broken stream
    ///
    /// Default: enabled
    #[must_use]
    pub fn with_reconnect(mut self, enable: bool) -> Self {
        self.reconnect_on_error = enable;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build from the `address` (required) and `reconnect` settings
    pub fn from_config(config: &LoggerConfig) -> Result<Self> {
        let address = config.require_setting_str("NetworkSink", "address")?;
        Ok(Self::new(address).with_reconnect(config.setting_bool("reconnect").unwrap_or(true)))
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn connect_stream(&self) -> Result<TcpStream> {
        let stream = TcpStream::connect(&self.address).map_err(|e| {
            LoggerError::io_operation("connecting to log server", self.address.clone(), e)
        })?;

        // Set timeouts to prevent hanging
        stream.set_write_timeout(Some(self.timeout))?;
        stream.set_read_timeout(Some(self.timeout))?;

        // Enable TCP_NODELAY for low-latency logging
        stream.set_nodelay(true)?;
        Ok(stream)
    }
}

impl Sink for NetworkSink {
    fn open(&mut self) -> Result<()> {
        if self.stream.is_none() {
            self.stream = Some(self.connect_stream()?);
        }
        Ok(())
    }

    fn write(&mut self, _record: &LogRecord, line: &str) -> Result<()> {
        let mut message = String::with_capacity(line.len() + 1);
        message.push_str(line);
        message.push('\n');

        let result = match self.stream {
            Some(ref mut stream) => stream.write_all(message.as_bytes()),
            None => return Err(LoggerError::writer("Network stream not connected")),
        };

        let Err(e) = result else {
            return Ok(());
        };

        // Connection lost
        self.stream = None;
        if !self.reconnect_on_error {
            return Err(e.into());
        }

        match self.connect_stream() {
            Ok(mut stream) => {
                stream.write_all(message.as_bytes())?;
                self.stream = Some(stream);
                Ok(())
            }
            Err(reconnect_err) => Err(LoggerError::writer(format!(
                "Failed to send log and reconnect: {} (reconnect: {})",
                e, reconnect_err
            ))),
        }
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut stream) = self.stream {
            stream.flush()?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            stream.flush()?;
            // The peer may already be gone
            let _ = stream.shutdown(Shutdown::Both);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "network"
    }
}

/// Driver for the `network` name
pub fn network_driver(config: &LoggerConfig) -> Result<Box<dyn Sink>> {
    Ok(Box::new(NetworkSink::from_config(config)?))
}
