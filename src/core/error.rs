//! Error types for the log pipeline

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// No sink is attached, either before connect or after terminate
    #[error("Log pipeline has no connection")]
    NoConnection,

    /// Connect called on a logger that already has a sink
    #[error("Logger is already connected")]
    AlreadyConnected,

    /// Connect called on a terminated logger
    #[error("Logger has been terminated")]
    Terminated,

    /// Driver name missing from the registry
    #[error("Invalid log driver: '{name}'")]
    UnknownDriver { name: String },

    /// Severity label that is not in the level table
    #[error("Invalid log level: '{label}'")]
    InvalidLevel { label: String },

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Sink failed to open during connect
    #[error("Failed to open log sink '{sink}': {source}")]
    SinkOpen {
        sink: String,
        #[source]
        source: Box<LoggerError>,
    },

    /// Sink panicked while writing or flushing
    #[error("Log sink '{sink}' panicked: {message}")]
    SinkPanicked { sink: String, message: String },

    /// File sink error with path
    #[error("File sink error for '{path}': {message}")]
    FileSinkError { path: String, message: String },

    /// File lock error
    #[error("Failed to acquire file lock on '{path}'")]
    FileLockError { path: String },

    /// Writer error (generic)
    #[error("Writer error: {0}")]
    WriterError(String),

    /// Channel send error
    #[error("Failed to send log record to async worker")]
    ChannelSendError,

    /// Channel receive error
    #[error("Failed to receive acknowledgement from async worker")]
    ChannelReceiveError,

    /// Queue full while submitting from the thread that drains it
    #[error("Async queue is full; record submitted from the delivery thread was not queued")]
    QueueFull,
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an unknown driver error
    pub fn unknown_driver(name: impl Into<String>) -> Self {
        LoggerError::UnknownDriver { name: name.into() }
    }

    /// Create an invalid level error
    pub fn invalid_level(label: impl Into<String>) -> Self {
        LoggerError::InvalidLevel {
            label: label.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Wrap an error raised by `Sink::open`
    pub fn sink_open(sink: impl Into<String>, source: LoggerError) -> Self {
        LoggerError::SinkOpen {
            sink: sink.into(),
            source: Box::new(source),
        }
    }

    pub fn sink_panicked(sink: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::SinkPanicked {
            sink: sink.into(),
            message: message.into(),
        }
    }

    /// Create a file sink error
    pub fn file_sink(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileSinkError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a file lock error
    pub fn file_lock(path: impl Into<String>) -> Self {
        LoggerError::FileLockError { path: path.into() }
    }

    /// Create a writer error (generic)
    pub fn writer<S: Into<String>>(msg: S) -> Self {
        LoggerError::WriterError(msg.into())
    }

    /// Whether this error belongs to the fatal configuration class
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            LoggerError::UnknownDriver { .. }
                | LoggerError::InvalidLevel { .. }
                | LoggerError::InvalidConfiguration { .. }
        )
    }
}
