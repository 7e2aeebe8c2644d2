//! Driver registry
//!
//! Maps a driver name from [`LoggerConfig::driver`] to a factory that
//! builds the matching [`Sink`]. The first registration of a name wins
//! unless the caller asks to override it.

use super::{
    config::LoggerConfig,
    error::{LoggerError, Result},
    sink::Sink,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Builds an unopened sink from configuration
pub trait Driver: Send + Sync {
    fn connect(&self, config: &LoggerConfig) -> Result<Box<dyn Sink>>;
}

impl<F> Driver for F
where
    F: Fn(&LoggerConfig) -> Result<Box<dyn Sink>> + Send + Sync,
{
    fn connect(&self, config: &LoggerConfig) -> Result<Box<dyn Sink>> {
        self(config)
    }
}

#[derive(Default)]
pub struct DriverRegistry {
    drivers: Mutex<HashMap<String, Arc<dyn Driver>>>,
}

impl DriverRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the sinks compiled into this crate
    ///
    /// `default` and `console` write to the terminal, `file` appends to
    /// `setting.path`, `network` streams to `setting.address`.
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        {
            #[allow(unused_mut, unused_variables)]
            let mut drivers = registry.drivers.lock();

            #[cfg(feature = "console")]
            {
                let console: Arc<dyn Driver> = Arc::new(crate::sinks::console::console_driver);
                drivers.insert(super::config::DEFAULT_DRIVER.to_string(), Arc::clone(&console));
                drivers.insert("console".to_string(), console);
            }

            #[cfg(feature = "file")]
            drivers.insert("file".to_string(), Arc::new(crate::sinks::file::file_driver));

            #[cfg(feature = "network")]
            drivers.insert(
                "network".to_string(),
                Arc::new(crate::sinks::network::network_driver),
            );
        }
        registry
    }

    /// Register `driver` under `name`
    ///
    /// Returns `Ok(false)` when the name is taken and `override_existing`
    /// is not set; the existing driver stays in place.
    pub fn register<D>(&self, name: &str, driver: D, override_existing: bool) -> Result<bool>
    where
        D: Driver + 'static,
    {
        if name.trim().is_empty() {
            return Err(LoggerError::config(
                "DriverRegistry",
                "driver name must not be empty",
            ));
        }

        let mut drivers = self.drivers.lock();
        if drivers.contains_key(name) && !override_existing {
            return Ok(false);
        }
        drivers.insert(name.to_string(), Arc::new(driver));
        Ok(true)
    }

    pub fn driver(&self, name: &str) -> Result<Arc<dyn Driver>> {
        self.drivers
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| LoggerError::unknown_driver(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.drivers.lock().contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.drivers.lock().keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("drivers", &self.names())
            .finish()
    }
}
