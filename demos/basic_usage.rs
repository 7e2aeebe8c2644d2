//! Basic logger usage example
//!
//! Demonstrates synchronous logging to the console driver at every level.
//!
//! Run with: cargo run --example basic_usage

use rust_log_pipeline::prelude::*;
use rust_log_pipeline::{info, notice};

fn main() -> Result<()> {
    println!("=== Rust Log Pipeline - Basic Usage Example ===\n");

    let registry = DriverRegistry::with_builtin();

    let logger = Logger::builder()
        .driver("console")
        .min_level(LogLevel::Debug)
        .sync_mode()
        .build();
    logger.connect_driver(&registry)?;

    println!("1. Logging at different levels:");
    logger.fatal("This is a fatal message")?;
    logger.panic("This is a panic message")?;
    logger.warning("This is a warning message")?;
    logger.notice("This is a notice message")?;
    logger.info("This is an info message")?;
    logger.trace("This is a trace message")?;
    logger.debug("This is a debug message")?;

    println!("\n2. Raising the threshold at runtime:");
    logger.set_level(LogLevel::Info);
    println!("   Threshold set to INFO - trace and debug won't show:");
    logger.trace("Trace message (hidden)")?;
    logger.debug("Debug message (hidden)")?;
    logger.info("Info message (visible)")?;

    println!("\n3. Changing the template:");
    logger.set_format("%unix% %level%: %body%");
    let port = 8080;
    info!(logger, "Listening on port {}", port)?;
    notice!(logger, "{} workers ready", 4)?;

    logger.terminate()?;
    println!("\n=== Example completed successfully! ===");

    Ok(())
}
