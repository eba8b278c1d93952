//! # SpotView: Row Models for Parking Admin Tables
//!
//! The data layer behind the parking dashboard's admin tables (user
//! management and live parking-spot monitoring). A periodically refreshed
//! collection of records becomes a filtered, sorted, paginated view, and the
//! user's view state survives every refresh.
//!
//! ## Architecture
//!
//! - **Pipeline**: Column registry plus pure filter, sort and pagination
//!   stages, memoized and owned by a single [`RowModelPipeline`]
//! - **Sources**: Blocking [`DataSource`]s polled off-thread by a [`Poller`]
//!   with generation-tagged results
//! - **Datasets**: Column definitions for [`ParkingSpot`] and [`User`]
//! - **Communication**: Crossbeam channels for poller outcomes and pipeline
//!   events
//!
//! ## Configuration
//!
//! The initial state of each table is read from `dashboard.toml` in the
//! platform config directory under `dev.spotview`.
//!
//! ## Example
//!
//! ```ignore
//! use spotview::config::DashboardConfig;
//! use spotview::datasets;
//! use spotview::source::{DataSource, ParkingLotSimulator, PollConfig, Poller};
//! use spotview::ParkingSpot;
//! use std::sync::Arc;
//!
//! let config = DashboardConfig::load_or_default();
//! let mut table = datasets::parking_spots::pipeline(&config.parking_spots)?;
//! let poll = PollConfig {
//!     interval: config.parking_spots.poll_interval(),
//!     ..PollConfig::default()
//! };
//! let source: Arc<dyn DataSource<ParkingSpot>> = Arc::new(ParkingLotSimulator::new(40, 1));
//! let poller = Poller::spawn(source, poll)?;
//!
//! loop {
//!     poller.wait_and_pump(&mut table, std::time::Duration::from_secs(5));
//!     for spot in table.rows() {
//!         println!("{} {}", spot.id, spot.occupied);
//!     }
//! }
//! ```

pub mod config;
pub mod datasets;
pub mod error;
pub mod pipeline;
pub mod source;
pub mod types;

// Re-export commonly used types
pub use config::{DashboardConfig, TableConfig};
pub use error::{Result, SpotViewError};
pub use pipeline::{
    CellValue, Column, FilterValue, Generation, PipelineError, PipelineEvent, RowModelPipeline,
    SortKey, SortSpec, ValueKind, ViewState,
};
pub use source::{DataSource, FetchOutcome, PollConfig, Poller};
pub use types::{ParkingSpot, User};
