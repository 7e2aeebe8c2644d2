//! Integration tests for the log pipeline
//!
//! These tests verify:
//! - FIFO delivery and level gating through the async queue
//! - Flush and terminate guarantees
//! - Sync-mode error propagation
//! - Format snapshots under reconfiguration
//! - Driver registry wiring for the built-in sinks

mod common;

use common::{wait_until, Gate, RecordingSink};
use rust_log_pipeline::prelude::*;
use std::fs;
use std::io::{BufRead, BufReader};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use std::thread;
use tempfile::TempDir;

fn body_logger(level: LogLevel) -> Logger {
    Logger::builder().min_level(level).format("%body%").build()
}

#[test]
fn test_async_fifo_order() {
    let (sink, recorded) = RecordingSink::new();
    let logger = body_logger(LogLevel::Debug);
    logger
        .connect(sink.boxed(), DeliveryMode::Async { capacity: 8 })
        .expect("Failed to connect");

    for i in 0..500 {
        logger.info(format!("Message {}", i)).unwrap();
    }
    logger.flush().expect("Failed to flush");

    let expected: Vec<String> = (0..500).map(|i| format!("Message {}", i)).collect();
    assert_eq!(recorded.lines(), expected);
}

#[test]
fn test_threshold_gates_async_records() {
    let (sink, recorded) = RecordingSink::new();
    let logger = body_logger(LogLevel::Notice);
    logger
        .connect(sink.boxed(), DeliveryMode::Async { capacity: 4 })
        .unwrap();

    for level in LogLevel::ALL {
        for _ in 0..10 {
            logger.log(level, level.to_str()).unwrap();
        }
    }
    logger.flush().unwrap();

    let levels = recorded.levels.lock().clone();
    assert_eq!(levels.len(), 40);
    assert!(levels.iter().all(|level| *level <= LogLevel::Notice));
    assert_eq!(logger.metrics().filtered_count(), 30);
}

#[test]
fn test_capacity_two_scenario() {
    let (sink, recorded) = RecordingSink::new();
    let logger = Logger::builder()
        .min_level(LogLevel::Info)
        .format("%level% %body%")
        .build();
    logger
        .connect(sink.boxed(), DeliveryMode::Async { capacity: 2 })
        .unwrap();

    logger.debug("dropped").unwrap();
    logger.info("kept").unwrap();
    logger.warning("also kept").unwrap();
    logger.flush().unwrap();

    assert_eq!(recorded.lines(), vec!["INFO kept", "WARNING also kept"]);
}

#[test]
fn test_flush_covers_each_producers_records() {
    let (sink, recorded) = RecordingSink::new();
    let logger = Arc::new(body_logger(LogLevel::Debug));
    logger
        .connect(sink.boxed(), DeliveryMode::Async { capacity: 16 })
        .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|producer| {
            let logger = Arc::clone(&logger);
            let recorded = Arc::clone(&recorded);
            thread::spawn(move || {
                for i in 0..50 {
                    logger.info(format!("p{}-{}", producer, i)).unwrap();
                }
                logger.flush().unwrap();

                let lines = recorded.lines();
                for i in 0..50 {
                    let line = format!("p{}-{}", producer, i);
                    assert!(lines.contains(&line), "{} missing after flush", line);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Producer panicked");
    }
    assert_eq!(recorded.line_count(), 200);
}

#[test]
fn test_terminate_closes_sink_once() {
    let (sink, recorded) = RecordingSink::new();
    let logger = body_logger(LogLevel::Debug);
    logger
        .connect(sink.boxed(), DeliveryMode::Async { capacity: 2 })
        .unwrap();

    for i in 0..25 {
        logger.notice(format!("n{}", i)).unwrap();
    }
    logger.terminate().unwrap();
    logger.terminate().unwrap();

    assert_eq!(recorded.line_count(), 25);
    assert_eq!(recorded.closes(), 1);
    assert_eq!(logger.state(), PipelineState::Terminated);
    assert!(matches!(logger.info("late"), Err(LoggerError::NoConnection)));

    drop(logger);
    assert_eq!(recorded.closes(), 1);
}

#[test]
fn test_no_silent_drops_while_attached() {
    let (sink, recorded) = RecordingSink::new();
    let logger = body_logger(LogLevel::Debug);
    logger
        .connect(sink.boxed(), DeliveryMode::Async { capacity: 3 })
        .unwrap();

    for i in 0..300 {
        logger.debug(format!("{}", i)).unwrap();
    }
    logger.flush().unwrap();

    let metrics = logger.metrics();
    assert_eq!(metrics.total_accepted(), 300);
    assert_eq!(metrics.total_written(), 300);
    assert_eq!(metrics.outstanding(), 0);
    assert_eq!(recorded.line_count(), 300);
}

#[test]
fn test_sync_write_error_is_returned() {
    let (sink, recorded) = RecordingSink::new();
    let logger = body_logger(LogLevel::Debug);
    logger
        .connect(sink.failing_on("broken").boxed(), DeliveryMode::Sync)
        .unwrap();

    let err = logger.info("broken").unwrap_err();
    assert_eq!(err.to_string(), "Writer error: disk full");

    logger.info("healthy").unwrap();
    assert_eq!(recorded.lines(), vec!["healthy"]);
    assert_eq!(logger.metrics().write_failures(), 1);
}

#[test]
fn test_async_write_error_reaches_callback() {
    let (sink, recorded) = RecordingSink::new();
    let seen = Arc::new(AtomicUsize::new(0));
    let seen_clone = Arc::clone(&seen);

    let logger = Logger::builder()
        .format("%body%")
        .on_error(move |err| {
            assert_eq!(err.to_string(), "Writer error: disk full");
            seen_clone.fetch_add(1, Ordering::SeqCst);
        })
        .build();
    logger
        .connect(
            sink.failing_on("broken").boxed(),
            DeliveryMode::Async { capacity: 4 },
        )
        .unwrap();

    logger.info("before").unwrap();
    logger.info("broken").unwrap();
    logger.info("after").unwrap();
    logger.flush().unwrap();

    assert_eq!(recorded.lines(), vec!["before", "after"]);
    assert_eq!(seen.load(Ordering::SeqCst), 1);
    assert_eq!(logger.metrics().write_failures(), 1);
}

#[test]
fn test_error_callback_logging_through_same_logger() {
    let (sink, recorded) = RecordingSink::new();
    let target: Arc<OnceLock<Weak<Logger>>> = Arc::new(OnceLock::new());
    let target_clone = Arc::clone(&target);

    let logger = Arc::new(
        Logger::builder()
            .format("%body%")
            .on_error(move |err| {
                if let Some(logger) = target_clone.get().and_then(Weak::upgrade) {
                    let _ = logger.warning(format!("sink failed: {}", err));
                }
            })
            .build(),
    );
    let _ = target.set(Arc::downgrade(&logger));
    logger
        .connect(
            sink.failing_on("bad").boxed(),
            DeliveryMode::Async { capacity: 1 },
        )
        .unwrap();

    let producer = {
        let logger = Arc::clone(&logger);
        thread::spawn(move || {
            for _ in 0..5 {
                logger.info("bad").unwrap();
            }
            logger.flush().unwrap();
        })
    };
    wait_until("producer to finish", || producer.is_finished());
    producer.join().unwrap();
    logger.terminate().unwrap();

    assert_eq!(logger.metrics().write_failures(), 5);
    let lines = recorded.lines();
    assert!(!lines.is_empty());
    assert!(lines
        .iter()
        .all(|line| line == "sink failed: Writer error: disk full"));
}

#[test]
fn test_sink_open_failure() {
    let (sink, recorded) = RecordingSink::new();
    let logger = body_logger(LogLevel::Debug);

    let err = logger
        .connect(sink.failing_open().boxed(), DeliveryMode::Sync)
        .unwrap_err();
    assert!(matches!(err, LoggerError::SinkOpen { .. }));
    assert!(err.to_string().contains("recording"));
    assert_eq!(logger.state(), PipelineState::Unconnected);
    assert_eq!(recorded.opens.load(Ordering::SeqCst), 0);
}

#[test]
fn test_format_snapshot_taken_at_submit() {
    let gate = Gate::new();
    let (sink, recorded) = RecordingSink::new();
    let logger = Logger::builder().format("A %body%").build();
    logger
        .connect(sink.gated(&gate).boxed(), DeliveryMode::Async { capacity: 8 })
        .unwrap();

    logger.info("one").unwrap();
    wait_until("worker to block in write", || {
        recorded.writes_started.load(Ordering::SeqCst) == 1
    });

    logger.info("two").unwrap();
    logger.set_format("B %body%");
    logger.info("three").unwrap();

    gate.open();
    logger.flush().unwrap();

    assert_eq!(recorded.lines(), vec!["A one", "A two", "B three"]);
}

#[test]
fn test_timestamps_are_assigned() {
    let (sink, recorded) = RecordingSink::new();
    let logger = Logger::builder().format("%nano%").sync_mode().build();
    logger.connect(sink.boxed(), DeliveryMode::Sync).unwrap();

    logger.submit(LogRecord::unstamped(LogLevel::Info, "x")).unwrap();
    logger
        .submit(LogRecord::unstamped(LogLevel::Info, "y").with_timestamp(42))
        .unwrap();

    let lines = recorded.lines();
    let first: i64 = lines[0].parse().unwrap();
    assert!(first > 0);
    assert_eq!(lines[1], "42");
}

#[test]
fn test_unknown_driver_is_configuration_error() {
    let logger = Logger::builder().driver("does-not-exist").build();
    let err = logger
        .connect_driver(&DriverRegistry::with_builtin())
        .unwrap_err();

    assert!(err.is_configuration());
    assert!(matches!(logger.info("x"), Err(LoggerError::NoConnection)));
    assert_eq!(logger.metrics().total_accepted(), 0);
}

#[test]
fn test_file_driver_end_to_end() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("app.log");

    let config: LoggerConfig = serde_json::from_value(serde_json::json!({
        "driver": "file",
        "level": "warning",
        "format": "[%level%] %body%",
        "pool": 4,
        "setting": { "path": log_file.to_str().unwrap(), "lock": true }
    }))
    .unwrap();

    let logger = Logger::new(config);
    logger
        .connect_driver(&DriverRegistry::with_builtin())
        .expect("Failed to connect file driver");

    logger.fatal("disk on fire").unwrap();
    logger.info("routine").unwrap();
    logger.warning("low space").unwrap();
    logger.terminate().unwrap();

    let content = fs::read_to_string(&log_file).expect("Failed to read log file");
    assert_eq!(content, "[FATAL] disk on fire\n[WARNING] low space\n");
}

#[test]
fn test_file_driver_without_path() {
    let logger = Logger::builder().driver("file").build();
    let err = logger
        .connect_driver(&DriverRegistry::with_builtin())
        .unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_json_file_output() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("app.json");

    let logger = Logger::builder().json(true).build();
    logger
        .connect(
            Box::new(FileSink::new(&log_file)),
            DeliveryMode::Async { capacity: 16 },
        )
        .unwrap();
    logger.panic("unrecoverable \"state\"").unwrap();
    logger.terminate().unwrap();

    let content = fs::read_to_string(&log_file).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(content.trim_end()).unwrap();
    assert_eq!(parsed["level"], "PANIC");
    assert_eq!(parsed["body"], "unrecoverable \"state\"");
    assert!(parsed["time"].as_i64().unwrap() > 0);
}

#[test]
fn test_network_driver_end_to_end() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap().to_string();

    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        BufReader::new(stream)
            .lines()
            .map(|line| line.unwrap())
            .collect::<Vec<_>>()
    });

    let logger = Logger::builder()
        .driver("network")
        .setting("address", address)
        .format("%level%|%body%")
        .async_mode(8)
        .build();
    logger
        .connect_driver(&DriverRegistry::with_builtin())
        .unwrap();

    for i in 0..5 {
        logger.info(format!("packet {}", i)).unwrap();
    }
    logger.terminate().unwrap();

    let received = server.join().unwrap();
    let expected: Vec<String> = (0..5).map(|i| format!("INFO|packet {}", i)).collect();
    assert_eq!(received, expected);
}

#[test]
fn test_custom_driver_registration() {
    let registry = DriverRegistry::with_builtin();
    let recorded_slot = Arc::new(parking_lot::Mutex::new(None));
    let slot = Arc::clone(&recorded_slot);

    let installed = registry
        .register(
            "memory",
            move |_config: &LoggerConfig| -> Result<Box<dyn Sink>> {
                let (sink, recorded) = RecordingSink::new();
                *slot.lock() = Some(recorded);
                Ok(sink.boxed())
            },
            false,
        )
        .unwrap();
    assert!(installed);

    let logger = Logger::builder()
        .driver("memory")
        .format("%body%")
        .sync_mode()
        .build();
    logger.connect_driver(&registry).unwrap();
    logger.info("through the registry").unwrap();

    let recorded = recorded_slot.lock().clone().expect("driver was not called");
    assert_eq!(recorded.lines(), vec!["through the registry"]);
}
