//! Mock data sources for tests and the demo binary
//!
//! - [`ScriptedSource`] - Plays back a queue of canned responses, each with
//!   an optional delay, so tests can make fetches finish out of order
//! - [`ParkingLotSimulator`] - A deterministic lot whose spots flip between
//!   free and occupied on every fetch
//!
//! # Example
//!
//! ```ignore
//! use spotview::source::ScriptedSource;
//! use std::time::Duration;
//!
//! let source = ScriptedSource::new("spots")
//!     .then_rows_after(Duration::from_millis(200), vec![1, 2, 3])
//!     .then_rows(vec![4, 5])
//!     .then_fail("503 Service Unavailable");
//! ```

use crate::error::{Result, SpotViewError};
use crate::source::DataSource;
use crate::types::ParkingSpot;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// One canned reply of a [`ScriptedSource`].
#[derive(Debug, Clone)]
enum Scripted<T> {
    Rows(Vec<T>),
    Fail(String),
}

/// Replays scripted responses in call order.
///
/// When the script runs out the last response is repeated, delay included,
/// so a polling test never sees a source go silent.
pub struct ScriptedSource<T> {
    name: String,
    script: Mutex<VecDeque<(Duration, Scripted<T>)>>,
    last: Mutex<Option<(Duration, Scripted<T>)>>,
    calls: AtomicUsize,
}

impl<T: Clone> ScriptedSource<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: Mutex::new(VecDeque::new()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn then_rows(self, rows: Vec<T>) -> Self {
        self.then_rows_after(Duration::ZERO, rows)
    }

    /// Respond with `rows` after sleeping for `delay`.
    pub fn then_rows_after(self, delay: Duration, rows: Vec<T>) -> Self {
        self.push(delay, Scripted::Rows(rows))
    }

    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.push(Duration::ZERO, Scripted::Fail(message.into()))
    }

    pub fn then_fail_after(self, delay: Duration, message: impl Into<String>) -> Self {
        self.push(delay, Scripted::Fail(message.into()))
    }

    /// Number of `fetch` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Acquire)
    }

    fn push(self, delay: Duration, reply: Scripted<T>) -> Self {
        lock(&self.script).push_back((delay, reply));
        self
    }

    fn next_reply(&self) -> Option<(Duration, Scripted<T>)> {
        let next = lock(&self.script).pop_front();
        let mut last = lock(&self.last);
        if let Some(entry) = next {
            *last = Some(entry);
        }
        last.clone()
    }
}

/// Lock that survives a panicked holder; the script data is still usable.
fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<T: Clone + Send> DataSource<T> for ScriptedSource<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self) -> Result<Vec<T>> {
        // Counted after the reply is taken, so `calls()` orders script entries.
        let reply = self.next_reply();
        self.calls.fetch_add(1, Ordering::AcqRel);
        let Some((delay, reply)) = reply else {
            return Ok(Vec::new());
        };
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        match reply {
            Scripted::Rows(rows) => Ok(rows),
            Scripted::Fail(message) => Err(SpotViewError::Fetch(message)),
        }
    }
}

// ==================== Parking lot simulator ====================

/// Zones handed out round-robin; every fifth spot has none.
const ZONES: [&str; 4] = ["A", "B", "C", "D"];

/// A lot of `spots` parking spots laid out on a grid around a center point.
///
/// Each fetch advances the simulation one step: a pseudo-random subset of
/// spots changes occupancy, with `occupiedTimestamp` set to the step's time.
/// The sequence is fully determined by the seed.
pub struct ParkingLotSimulator {
    name: String,
    state: Mutex<Vec<ParkingSpot>>,
    rng: AtomicU64,
    started: DateTime<Utc>,
    step: AtomicU64,
    step_length: ChronoDuration,
}

impl ParkingLotSimulator {
    pub fn new(spots: usize, seed: u64) -> Self {
        let started = Utc::now();
        let lot = (0..spots)
            .map(|i| {
                let row = (i / 10) as f64;
                let col = (i % 10) as f64;
                let mut spot = ParkingSpot::new(
                    format!("spot-{:03}", i + 1),
                    46.0569 + row * 0.0001,
                    14.5058 + col * 0.0001,
                );
                spot.parking_spot_zone = (i % 5 != 4).then(|| ZONES[i % ZONES.len()].to_string());
                spot.price = 1.0 + (i % 3) as f64 * 0.5;
                spot
            })
            .collect();

        Self {
            name: "parking-lot".to_string(),
            state: Mutex::new(lot),
            rng: AtomicU64::new(seed.max(1)),
            started,
            step: AtomicU64::new(0),
            step_length: ChronoDuration::seconds(30),
        }
    }

    /// xorshift64; good enough to scatter occupancy changes.
    fn next_random(&self) -> u64 {
        let mut x = self.rng.load(Ordering::Acquire);
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.rng.store(x, Ordering::Release);
        x
    }

    fn advance(&self) -> Vec<ParkingSpot> {
        let step = self.step.fetch_add(1, Ordering::AcqRel) + 1;
        let now = self.started + self.step_length * step as i32;

        let mut lot = lock(&self.state);
        let mut flipped = 0usize;
        for spot in lot.iter_mut() {
            spot.last_data_received = Some(now);
            if self.next_random() % 4 == 0 {
                spot.occupied = !spot.occupied;
                if spot.occupied {
                    spot.occupied_timestamp = Some(now);
                }
                flipped += 1;
            }
        }
        tracing::trace!("Simulator step {}: {} spots changed", step, flipped);
        lot.clone()
    }
}

impl DataSource<ParkingSpot> for ParkingLotSimulator {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self) -> Result<Vec<ParkingSpot>> {
        Ok(self.advance())
    }
}
