//! Built-in sink implementations
//!
//! Each sink has a matching driver function that [`DriverRegistry::with_builtin`]
//! registers under the sink's name.
//!
//! [`DriverRegistry::with_builtin`]: crate::core::DriverRegistry::with_builtin

#[cfg(feature = "console")]
pub mod console;
#[cfg(feature = "file")]
pub mod file;
#[cfg(feature = "network")]
pub mod network;

#[cfg(feature = "console")]
pub use console::ConsoleSink;
#[cfg(feature = "file")]
pub use file::FileSink;
#[cfg(feature = "network")]
pub use network::NetworkSink;

pub use crate::core::Sink;
