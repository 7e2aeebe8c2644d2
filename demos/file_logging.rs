//! File logging example
//!
//! Demonstrates configuring the file driver from JSON and writing records
//! as JSON lines.
//!
//! Run with: cargo run --example file_logging

use rust_log_pipeline::prelude::*;

fn main() -> Result<()> {
    println!("=== Rust Log Pipeline - File Logging Example ===\n");

    let config = LoggerConfig::from_json(
        r#"{
            "driver": "file",
            "level": "info",
            "json": true,
            "pool": 128,
            "setting": { "path": "application.log", "lock": true }
        }"#,
    )?;

    let logger = Logger::new(config);
    logger.connect_driver(&DriverRegistry::with_builtin())?;

    println!("1. Logging to application.log:");
    logger.info("Application started")?;
    logger.debug("Loading configuration...")?;
    logger.info("Configuration loaded successfully")?;
    logger.warning("Using default settings for some options")?;
    logger.panic("Failed to load optional plugin")?;

    println!("\n2. Performing some operations:");
    for i in 1..=5 {
        logger.info(format!("Processing item {}/5", i))?;
        if i == 3 {
            logger.notice("Item 3 took longer than expected")?;
        }
    }

    logger.info("All operations completed")?;

    // Flushes, stops the worker and closes the file
    logger.terminate()?;

    println!("\n=== Example completed successfully! ===");
    println!("Check 'application.log' for the full log output");

    Ok(())
}
