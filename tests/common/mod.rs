//! Test sinks shared by the integration suites

#![allow(dead_code)]

use parking_lot::{Condvar, Mutex};
use rust_log_pipeline::{LogLevel, LogRecord, LoggerError, Result, Sink};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Everything a [`RecordingSink`] was asked to do
#[derive(Default)]
pub struct Recorded {
    pub lines: Mutex<Vec<String>>,
    pub levels: Mutex<Vec<LogLevel>>,
    pub opens: AtomicUsize,
    pub writes_started: AtomicUsize,
    pub flushes: AtomicUsize,
    pub closes: AtomicUsize,
}

impl Recorded {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn line_count(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

/// Blocks sink writes until opened
#[derive(Default)]
pub struct Gate {
    open: Mutex<bool>,
    changed: Condvar,
}

impl Gate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn open(&self) {
        *self.open.lock() = true;
        self.changed.notify_all();
    }

    fn wait(&self) {
        let mut open = self.open.lock();
        while !*open {
            self.changed.wait(&mut open);
        }
    }
}

/// Sink that keeps every rendered line in memory
pub struct RecordingSink {
    recorded: Arc<Recorded>,
    fail_on: Option<String>,
    fail_open: bool,
    gate: Option<Arc<Gate>>,
}

impl RecordingSink {
    pub fn new() -> (Self, Arc<Recorded>) {
        let recorded = Arc::new(Recorded::default());
        let sink = Self {
            recorded: Arc::clone(&recorded),
            fail_on: None,
            fail_open: false,
            gate: None,
        };
        (sink, recorded)
    }

    /// Fail writes whose body is exactly `body` with "disk full"
    pub fn failing_on(mut self, body: &str) -> Self {
        self.fail_on = Some(body.to_string());
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn gated(mut self, gate: &Arc<Gate>) -> Self {
        self.gate = Some(Arc::clone(gate));
        self
    }

    pub fn boxed(self) -> Box<dyn Sink> {
        Box::new(self)
    }
}

impl Sink for RecordingSink {
    fn open(&mut self) -> Result<()> {
        if self.fail_open {
            return Err(LoggerError::writer("device unavailable"));
        }
        self.recorded.opens.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn write(&mut self, record: &LogRecord, line: &str) -> Result<()> {
        self.recorded.writes_started.fetch_add(1, Ordering::SeqCst);
        if let Some(ref gate) = self.gate {
            gate.wait();
        }
        if self.fail_on.as_deref() == Some(record.body.as_str()) {
            return Err(LoggerError::writer("disk full"));
        }
        self.recorded.levels.lock().push(record.level);
        self.recorded.lines.lock().push(line.to_string());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.recorded.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.recorded.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Poll `condition` until it holds, panicking after five seconds
pub fn wait_until(what: &str, condition: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "Timed out waiting for {}", what);
        std::thread::sleep(Duration::from_millis(1));
    }
}
