//! Delivery pipeline
//!
//! Moves records from any number of producers to a single [`Sink`].
//!
//! In [`DeliveryMode::Sync`] the producer's own thread renders and writes
//! the record and gets the sink's result back. In [`DeliveryMode::Async`]
//! records go through a bounded queue to one worker thread; a full queue
//! blocks the producer instead of dropping the record.
//!
//! The worker waits on two channels: records, and control commands
//! ([`Command::Flush`] / [`Command::Shutdown`]). A flush drains the records
//! that were queued when the command arrived, flushes the sink, then
//! acknowledges the caller. A shutdown drains everything, flushes and
//! exits. The worker is the only thread that touches the sink while it
//! runs, so records reach the sink in queue order.

use super::{
    config::{SharedSettings, MAX_POOL},
    error::{LoggerError, Result},
    formatter,
    metrics::PipelineMetrics,
    record::LogRecord,
    sink::Sink,
};
use crossbeam_channel::{bounded, select, unbounded, Receiver, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};

/// Callback for delivery failures nobody is waiting on
///
/// Invoked from the worker thread for async write and flush errors. The
/// callback may log through the same pipeline: on the delivery thread
/// `submit` never waits for queue space and fails with
/// [`LoggerError::QueueFull`] instead, and `flush` only flushes the sink.
/// Stopping the pipeline from the callback is not supported.
pub type ErrorCallback = Arc<dyn Fn(&LoggerError) + Send + Sync>;

type SharedSink = Arc<Mutex<Option<Box<dyn Sink>>>>;

/// Thread currently handing records to the sink, if any
type DeliveryThread = Arc<Mutex<Option<ThreadId>>>;

/// How submitted records reach the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Write on the caller's thread; `submit` returns the sink's result
    Sync,

    /// Queue for the worker thread; `capacity` bounds the queue (1 to [`MAX_POOL`])
    Async { capacity: usize },
}

impl DeliveryMode {
    pub fn is_async(&self) -> bool {
        matches!(self, DeliveryMode::Async { .. })
    }
}

enum Command {
    /// Drain what is queued, flush the sink, reply with the flush result
    Flush(Sender<Result<()>>),
    /// Drain everything, flush the sink and exit
    Shutdown,
}

#[derive(Clone)]
struct Reporter {
    sink_name: Arc<str>,
    on_error: Option<ErrorCallback>,
}

impl Reporter {
    fn report(&self, operation: &str, error: &LoggerError) {
        eprintln!(
            "[LOGGER ERROR] Sink '{}' {} failed: {}",
            self.sink_name, operation, error
        );
        if let Some(ref callback) = self.on_error {
            callback(error);
        }
    }
}

pub struct Pipeline {
    mode: DeliveryMode,
    sink: SharedSink,
    settings: Arc<SharedSettings>,
    metrics: Arc<PipelineMetrics>,
    reporter: Reporter,
    /// Producer side of the record queue; `None` in sync mode and after stop
    sender: RwLock<Option<Sender<LogRecord>>>,
    control: Sender<Command>,
    /// Receivers parked here until `start` hands them to the worker thread
    idle: Mutex<Option<(Receiver<LogRecord>, Receiver<Command>)>>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
    delivery_thread: DeliveryThread,
    stopped: AtomicBool,
}

impl Pipeline {
    /// Create a pipeline around an already opened sink
    ///
    /// An async pipeline does not deliver anything until [`Pipeline::start`].
    pub fn new(sink: Box<dyn Sink>, mode: DeliveryMode, settings: Arc<SharedSettings>) -> Self {
        let reporter = Reporter {
            sink_name: Arc::from(sink.name()),
            on_error: None,
        };
        let (control, control_rx) = unbounded();

        let (sender, idle) = match mode {
            DeliveryMode::Sync => (None, None),
            DeliveryMode::Async { capacity } => {
                let (sender, receiver) = bounded(capacity.clamp(1, MAX_POOL));
                (Some(sender), Some((receiver, control_rx)))
            }
        };

        Self {
            mode,
            sink: Arc::new(Mutex::new(Some(sink))),
            settings,
            metrics: Arc::new(PipelineMetrics::new()),
            reporter,
            sender: RwLock::new(sender),
            control,
            idle: Mutex::new(idle),
            worker: Mutex::new(None),
            delivery_thread: Arc::new(Mutex::new(None)),
            stopped: AtomicBool::new(false),
        }
    }

    /// Share an existing metrics instance
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Observe async delivery failures
    #[must_use]
    pub fn with_error_callback(mut self, callback: ErrorCallback) -> Self {
        self.reporter.on_error = Some(callback);
        self
    }

    pub fn mode(&self) -> DeliveryMode {
        self.mode
    }

    pub fn sink_name(&self) -> &str {
        &self.reporter.sink_name
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Records accepted but not yet handed to the sink
    pub fn outstanding(&self) -> u64 {
        self.metrics.outstanding()
    }

    pub fn is_running(&self) -> bool {
        self.worker.lock().is_some()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Gate, stamp and deliver one record
    ///
    /// Records below the threshold are dropped and reported as success. In
    /// async mode this blocks while the queue is full, except on the
    /// delivery thread itself (an error callback logging through the same
    /// pipeline), where a full queue rejects the record with
    /// [`LoggerError::QueueFull`].
    pub fn submit(&self, mut record: LogRecord) -> Result<()> {
        if self.is_stopped() {
            return Err(LoggerError::NoConnection);
        }

        match self.mode {
            DeliveryMode::Sync => {
                if !self.admit(&mut record) {
                    return Ok(());
                }
                let mut guard = self.sink.lock();
                let sink = guard.as_deref_mut().ok_or(LoggerError::NoConnection)?;

                self.metrics.record_accepted();
                let result = write_record(sink, &record);
                match result {
                    Ok(()) => self.metrics.record_written(),
                    Err(_) => self.metrics.record_write_failure(),
                };
                result
            }
            DeliveryMode::Async { .. } => {
                // Held across a blocking send so stop() cannot close the
                // queue under a producer that was already admitted
                let guard = self.sender.read();
                let sender = guard.as_ref().ok_or(LoggerError::NoConnection)?;
                if !self.admit(&mut record) {
                    return Ok(());
                }

                self.metrics.record_accepted();
                let sent = match sender.try_send(record) {
                    Ok(()) => Ok(()),
                    Err(TrySendError::Full(record)) => {
                        self.metrics.record_queue_full();
                        if self.on_delivery_thread() {
                            // Only this thread can make room
                            Err(LoggerError::QueueFull)
                        } else {
                            sender.send(record).map_err(|_| LoggerError::ChannelSendError)
                        }
                    }
                    Err(TrySendError::Disconnected(_)) => Err(LoggerError::ChannelSendError),
                };
                if sent.is_err() {
                    self.metrics.record_rejected();
                }
                sent
            }
        }
    }

    /// Flush everything submitted before this call through to the sink
    ///
    /// Async mode waits for the worker to write every record that was
    /// queued when the flush request reached it, then flushes the sink.
    /// Records submitted concurrently may land in this flush or the next.
    pub fn flush(&self) -> Result<()> {
        if self.is_stopped() {
            return Err(LoggerError::NoConnection);
        }

        if !self.mode.is_async() {
            let mut guard = self.sink.lock();
            let sink = guard.as_deref_mut().ok_or(LoggerError::NoConnection)?;
            return guarded(sink, |sink| sink.flush());
        }

        if self.on_delivery_thread() {
            // Waiting for an ack here would wait on ourselves
            let mut guard = self.sink.lock();
            let sink = guard.as_deref_mut().ok_or(LoggerError::NoConnection)?;
            return guarded(sink, |sink| sink.flush());
        }

        {
            let idle = self.idle.lock();
            if let Some((records, control)) = idle.as_ref() {
                // Not started: drain on the caller's thread
                let worker = self.worker_for(records.clone(), control.clone());
                *self.delivery_thread.lock() = Some(thread::current().id());
                worker.drain_pending();
                let result = worker.flush_sink();
                *self.delivery_thread.lock() = None;
                return result;
            }
        }

        let (ack, done) = bounded(1);
        self.control
            .send(Command::Flush(ack))
            .map_err(|_| LoggerError::NoConnection)?;

        match done.recv() {
            Ok(result) => result,
            // The worker exited during shutdown after draining everything
            Err(_) if self.is_stopped() => Ok(()),
            Err(_) => Err(LoggerError::ChannelReceiveError),
        }
    }

    /// Start the worker thread; a no-op in sync mode or when already running
    pub fn start(&self) -> Result<()> {
        if self.is_stopped() {
            return Err(LoggerError::NoConnection);
        }
        self.spawn_worker()
    }

    /// Drain the queue, flush the sink and wait for the worker to exit
    ///
    /// Safe to call more than once and from several threads; every call
    /// returns after the worker is gone. `submit` and `flush` fail with
    /// [`LoggerError::NoConnection`] afterwards.
    pub fn stop(&self) {
        let already_stopped = self.stopped.swap(true, Ordering::AcqRel);

        if !self.mode.is_async() {
            if !already_stopped {
                let flushed = match self.sink.lock().as_deref_mut() {
                    Some(sink) => guarded(sink, |sink| sink.flush()),
                    None => Ok(()),
                };
                if let Err(e) = flushed {
                    self.reporter.report("flush", &e);
                }
            }
            return;
        }

        // Producers blocked on a full queue only let go of the sender once
        // the worker makes room, so it has to be running
        if let Err(e) = self.spawn_worker() {
            eprintln!("[LOGGER ERROR] Failed to start pipeline worker for shutdown: {}", e);
        }

        let mut worker = self.worker.lock();
        let Some(handle) = worker.take() else {
            return;
        };

        drop(self.sender.write().take());
        let _ = self.control.send(Command::Shutdown);

        if let Err(e) = handle.join() {
            eprintln!(
                "[LOGGER ERROR] Pipeline worker panicked during shutdown: {}",
                panic_message(e.as_ref())
            );
        }
    }

    /// Detach the sink so the caller can close it
    ///
    /// Call after [`Pipeline::stop`]; any later delivery finds no sink.
    pub fn take_sink(&self) -> Option<Box<dyn Sink>> {
        self.sink.lock().take()
    }

    fn admit(&self, record: &mut LogRecord) -> bool {
        if !self.settings.enabled(record.level) {
            self.metrics.record_filtered();
            return false;
        }
        record.stamp(|| self.settings.format());
        true
    }

    fn on_delivery_thread(&self) -> bool {
        *self.delivery_thread.lock() == Some(thread::current().id())
    }

    fn worker_for(&self, records: Receiver<LogRecord>, control: Receiver<Command>) -> Worker {
        Worker {
            records,
            control,
            sink: Arc::clone(&self.sink),
            metrics: Arc::clone(&self.metrics),
            reporter: self.reporter.clone(),
            delivery_thread: Arc::clone(&self.delivery_thread),
        }
    }

    fn spawn_worker(&self) -> Result<()> {
        let mut idle = self.idle.lock();
        let Some((records, control)) = idle.take() else {
            return Ok(());
        };

        let worker = self.worker_for(records, control);
        let handle = thread::Builder::new()
            .name("log-pipeline".to_string())
            .spawn(move || worker.run())
            .map_err(|e| {
                LoggerError::io_operation("starting pipeline worker", "thread spawn failed", e)
            })?;

        *self.worker.lock() = Some(handle);
        Ok(())
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Worker {
    records: Receiver<LogRecord>,
    control: Receiver<Command>,
    sink: SharedSink,
    metrics: Arc<PipelineMetrics>,
    reporter: Reporter,
    delivery_thread: DeliveryThread,
}

impl Worker {
    fn run(self) {
        *self.delivery_thread.lock() = Some(thread::current().id());

        loop {
            select! {
                recv(self.records) -> msg => match msg {
                    Ok(record) => self.deliver(record),
                    Err(_) => break,
                },
                recv(self.control) -> command => match command {
                    Ok(Command::Flush(ack)) => {
                        self.drain_pending();
                        let _ = ack.send(self.flush_sink());
                    }
                    Ok(Command::Shutdown) | Err(_) => break,
                },
            }
        }

        self.finish();
    }

    fn deliver(&self, record: LogRecord) {
        let result = match self.sink.lock().as_deref_mut() {
            Some(sink) => write_record(sink, &record),
            None => Err(LoggerError::NoConnection),
        };

        match result {
            Ok(()) => {
                self.metrics.record_written();
            }
            Err(e) => {
                self.metrics.record_write_failure();
                self.reporter.report("write", &e);
            }
        }
    }

    /// Deliver the records queued right now, ignoring ones that arrive meanwhile
    fn drain_pending(&self) {
        for _ in 0..self.records.len() {
            match self.records.try_recv() {
                Ok(record) => self.deliver(record),
                Err(_) => break,
            }
        }
    }

    fn flush_sink(&self) -> Result<()> {
        match self.sink.lock().as_deref_mut() {
            Some(sink) => guarded(sink, |sink| sink.flush()),
            None => Ok(()),
        }
    }

    fn finish(&self) {
        // The sender is gone by now, so this terminates
        while let Ok(record) = self.records.try_recv() {
            self.deliver(record);
        }

        if let Err(e) = self.flush_sink() {
            self.reporter.report("flush", &e);
        }

        // Flush requests that raced with shutdown are covered by the drain above
        while let Ok(command) = self.control.try_recv() {
            if let Command::Flush(ack) = command {
                let _ = ack.send(Ok(()));
            }
        }
    }
}

fn write_record(sink: &mut dyn Sink, record: &LogRecord) -> Result<()> {
    let line = formatter::render(record);
    guarded(sink, |sink| sink.write(record, &line))
}

/// Run a sink operation, turning a panic into an error
fn guarded(sink: &mut dyn Sink, op: impl FnOnce(&mut dyn Sink) -> Result<()>) -> Result<()> {
    match catch_unwind(AssertUnwindSafe(|| op(&mut *sink))) {
        Ok(result) => result,
        Err(payload) => Err(LoggerError::sink_panicked(
            sink.name(),
            panic_message(payload.as_ref()),
        )),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
