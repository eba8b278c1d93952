//! Data sources that feed snapshots into a [`RowModelPipeline`].
//!
//! A [`DataSource`] is a blocking "fetch everything" call. The [`Poller`]
//! runs it off the owner's thread on an interval and tags each result with
//! the generation assigned when the fetch was issued; the owner drains the
//! results with [`Poller::pump`].
//!
//! [`RowModelPipeline`]: crate::pipeline::RowModelPipeline

pub mod api;
pub mod mock;
pub mod poller;

pub use api::{ApiResponse, ItemsPage, JsonSource, PayloadShape};
pub use mock::{ParkingLotSimulator, ScriptedSource};
pub use poller::{PollConfig, Poller, PollerCommand};

use crate::error::Result;
use crate::pipeline::Generation;

/// Supplies full replacement snapshots of `T`.
///
/// `fetch` may block. It is always called from a poller worker thread, and
/// two calls may overlap when a fetch outlives the polling interval.
pub trait DataSource<T>: Send + Sync {
    /// Short name used in logs and thread names.
    fn name(&self) -> &str;

    /// Fetch the complete current collection.
    fn fetch(&self) -> Result<Vec<T>>;
}

/// A data source backed by a closure.
pub struct FnSource<F> {
    name: String,
    fetch: F,
}

impl<F> FnSource<F> {
    pub fn new(name: impl Into<String>, fetch: F) -> Self {
        Self {
            name: name.into(),
            fetch,
        }
    }
}

impl<T, F> DataSource<T> for FnSource<F>
where
    F: Fn() -> Result<Vec<T>> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self) -> Result<Vec<T>> {
        (self.fetch)()
    }
}

/// One completed fetch, successful or not.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome<T> {
    pub generation: Generation,
    pub result: std::result::Result<Vec<T>, String>,
}

impl<T> FetchOutcome<T> {
    pub fn success(generation: Generation, rows: Vec<T>) -> Self {
        Self {
            generation,
            result: Ok(rows),
        }
    }

    pub fn failure(generation: Generation, message: impl Into<String>) -> Self {
        Self {
            generation,
            result: Err(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}
