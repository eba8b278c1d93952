//! Periodic snapshot fetching off the owner's thread.
//!
//! The poller thread only keeps time and issues fetches. Each fetch runs on
//! its own short-lived worker thread so a slow response never delays the
//! next tick, which also means responses can arrive out of order. Every
//! fetch carries the generation assigned at issuance and the pipeline drops
//! anything older than what it already applied.
//!
//! # Teardown
//!
//! [`Poller::shutdown`] (or dropping the poller) stops the timer thread,
//! joins it, and drops the outcome receiver. Fetches still in flight finish
//! on their own but their results have nowhere to go, so nothing reaches the
//! pipeline after teardown.

use crate::error::{Result, SpotViewError};
use crate::pipeline::{Generation, RowModelPipeline};
use crate::source::{DataSource, FetchOutcome};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Default cap on concurrently running fetches.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 4;

/// When the poller fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Time between fetches. `None` fetches only on start and on `refetch()`.
    pub interval: Option<Duration>,
    /// Issue a fetch as soon as the poller starts.
    pub fetch_on_start: bool,
    /// Ticks are skipped while this many fetches are still running.
    pub max_in_flight: usize,
}

impl PollConfig {
    pub fn every(interval: Duration) -> Self {
        Self {
            interval: Some(interval),
            ..Self::default()
        }
    }

    pub fn on_demand() -> Self {
        Self::default()
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: None,
            fetch_on_start: true,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

/// Commands sent from the owner to the poller thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerCommand {
    /// Fetch now, outside the interval.
    RefetchNow,
    /// Stop the poller thread.
    Shutdown,
}

/// Owner-side handle of a running poller.
pub struct Poller<T> {
    name: String,
    cmd_tx: Sender<PollerCommand>,
    outcome_rx: Option<Receiver<FetchOutcome<T>>>,
    running: Arc<AtomicBool>,
    in_flight: Arc<AtomicUsize>,
    handle: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Poller<T> {
    /// Start polling `source` on a dedicated thread.
    pub fn spawn(source: Arc<dyn DataSource<T>>, config: PollConfig) -> Result<Self> {
        let name = source.name().to_string();
        let (cmd_tx, cmd_rx) = unbounded();
        let (outcome_tx, outcome_rx) = unbounded();
        let running = Arc::new(AtomicBool::new(true));
        let in_flight = Arc::new(AtomicUsize::new(0));

        let worker = PollWorker {
            source,
            config,
            cmd_rx,
            outcome_tx,
            running: running.clone(),
            in_flight: in_flight.clone(),
            issued: Generation::ZERO,
        };

        let handle = thread::Builder::new()
            .name(format!("poll-{}", name))
            .spawn(move || worker.run())
            .map_err(|e| {
                SpotViewError::Io(e).with_context(format!("Failed to start poller for '{}'", name))
            })?;

        Ok(Self {
            name,
            cmd_tx,
            outcome_rx: Some(outcome_rx),
            running,
            in_flight,
            handle: Some(handle),
        })
    }

    /// Ask for an immediate fetch.
    pub fn refetch(&self) {
        if self.cmd_tx.send(PollerCommand::RefetchNow).is_err() {
            tracing::warn!("Poller '{}' is not running, refetch ignored", self.name);
        }
    }

    /// Take every outcome that has arrived so far.
    pub fn drain(&self) -> Vec<FetchOutcome<T>> {
        match &self.outcome_rx {
            Some(rx) => rx.try_iter().collect(),
            None => Vec::new(),
        }
    }

    /// Apply every arrived outcome to `pipeline`. Returns how many were handled.
    pub fn pump(&self, pipeline: &mut RowModelPipeline<T>) -> usize {
        let outcomes = self.drain();
        let count = outcomes.len();
        for outcome in outcomes {
            pipeline.apply_fetch(outcome);
        }
        count
    }

    /// Wait up to `timeout` for at least one outcome, then pump.
    pub fn wait_and_pump(&self, pipeline: &mut RowModelPipeline<T>, timeout: Duration) -> usize {
        let Some(rx) = &self.outcome_rx else {
            return 0;
        };
        match rx.recv_timeout(timeout) {
            Ok(first) => {
                pipeline.apply_fetch(first);
                1 + self.pump(pipeline)
            }
            Err(_) => 0,
        }
    }

    /// Number of fetches currently running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }
}

impl<T> Poller<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stop polling and discard anything still in flight.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        let _ = self.cmd_tx.send(PollerCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Poller '{}' thread panicked", self.name);
            }
        }
        self.outcome_rx = None;
    }
}

impl<T> Drop for Poller<T> {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.stop();
        }
    }
}

/// State owned by the poller thread.
struct PollWorker<T> {
    source: Arc<dyn DataSource<T>>,
    config: PollConfig,
    cmd_rx: Receiver<PollerCommand>,
    outcome_tx: Sender<FetchOutcome<T>>,
    running: Arc<AtomicBool>,
    in_flight: Arc<AtomicUsize>,
    issued: Generation,
}

impl<T: Send + 'static> PollWorker<T> {
    fn run(mut self) {
        tracing::info!(
            "Poller '{}' started (interval: {:?})",
            self.source.name(),
            self.config.interval
        );

        if self.config.fetch_on_start {
            self.issue();
        }

        let mut deadline = self.config.interval.map(|iv| Instant::now() + iv);
        while self.running.load(Ordering::Acquire) {
            let cmd = match deadline {
                Some(at) => self.cmd_rx.recv_deadline(at),
                None => self
                    .cmd_rx
                    .recv()
                    .map_err(|_| RecvTimeoutError::Disconnected),
            };

            match cmd {
                Ok(PollerCommand::RefetchNow) => self.issue(),
                Ok(PollerCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    self.tick();
                    if let (Some(at), Some(iv)) = (deadline, self.config.interval) {
                        deadline = Some(next_deadline(at, iv, Instant::now()));
                    }
                }
            }
        }

        tracing::info!("Poller '{}' exiting", self.source.name());
    }

    fn tick(&mut self) {
        let running = self.in_flight.load(Ordering::Acquire);
        if running >= self.config.max_in_flight.max(1) {
            tracing::debug!(
                "Poller '{}' skipping tick, {} fetches in flight",
                self.source.name(),
                running
            );
            return;
        }
        self.issue();
    }

    fn issue(&mut self) {
        self.issued = self.issued.next();
        let generation = self.issued;
        let source = self.source.clone();
        let outcome_tx = self.outcome_tx.clone();
        let running = self.running.clone();
        let in_flight = self.in_flight.clone();

        in_flight.fetch_add(1, Ordering::AcqRel);
        let spawned = thread::Builder::new()
            .name(format!("fetch-{}-{}", self.source.name(), generation.0))
            .spawn(move || {
                let started = Instant::now();
                let result = match panic::catch_unwind(AssertUnwindSafe(|| source.fetch())) {
                    Ok(fetched) => fetched.map_err(|e| e.to_string()),
                    Err(payload) => {
                        let message = panic_message(payload.as_ref());
                        tracing::error!(
                            "Fetch {} from '{}' panicked: {}",
                            generation,
                            source.name(),
                            message
                        );
                        Err(format!("fetch panicked: {}", message))
                    }
                };
                in_flight.fetch_sub(1, Ordering::AcqRel);
                tracing::trace!(
                    "Fetch {} from '{}' finished in {:?}",
                    generation,
                    source.name(),
                    started.elapsed()
                );
                if running.load(Ordering::Acquire) {
                    let _ = outcome_tx.send(FetchOutcome { generation, result });
                }
            });

        if let Err(e) = spawned {
            self.in_flight.fetch_sub(1, Ordering::AcqRel);
            tracing::error!("Could not start fetch {}: {}", generation, e);
            let _ = self
                .outcome_tx
                .send(FetchOutcome::failure(generation, e.to_string()));
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

/// Next tick after `previous`, skipping ticks that were missed entirely.
fn next_deadline(previous: Instant, interval: Duration, now: Instant) -> Instant {
    let mut next = previous + interval;
    while next <= now {
        next += interval;
    }
    next
}
