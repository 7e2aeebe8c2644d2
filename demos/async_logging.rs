//! Async logging example
//!
//! Demonstrates the bounded queue with several producer threads and an
//! explicit flush.
//!
//! Run with: cargo run --example async_logging

use rust_log_pipeline::prelude::*;
use std::sync::Arc;
use std::thread;

fn main() -> Result<()> {
    println!("=== Rust Log Pipeline - Async Logging Example ===\n");

    // Small queue so producers feel backpressure
    let logger = Logger::builder()
        .driver("console")
        .setting("colors", false)
        .format("%time% [%level%] %body%")
        .async_mode(32)
        .on_error(|e| eprintln!("delivery failed: {}", e))
        .build();
    logger.connect_driver(&DriverRegistry::with_builtin())?;

    println!("1. Logging 100 messages from one thread:");
    for i in 0..100 {
        logger.info(format!("Message #{}", i))?;
    }
    logger.flush()?;

    println!("\n2. Multi-threaded logging:");
    let logger = Arc::new(logger);

    let handles: Vec<_> = (0..5)
        .map(|thread_id| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || -> Result<()> {
                for i in 0..20 {
                    logger.notice(format!("Thread {} - Message {}", thread_id, i))?;
                }
                Ok(())
            })
        })
        .collect();

    for handle in handles {
        if let Ok(Err(e)) = handle.join() {
            eprintln!("producer failed: {}", e);
        }
    }
    logger.flush()?;

    let metrics = logger.metrics();
    println!("\n   accepted:          {}", metrics.total_accepted());
    println!("   written:           {}", metrics.total_written());
    println!("   queue-full events: {}", metrics.queue_full_events());

    logger.terminate()?;
    println!("\n=== Example completed successfully! ===");

    Ok(())
}
