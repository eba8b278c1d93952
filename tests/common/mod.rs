//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use std::time::Duration;

/// Upper bound for waiting on poller results
pub fn test_timeout() -> Duration {
    Duration::from_secs(2)
}

/// A short delay used to order scripted fetches
pub fn short_delay() -> Duration {
    Duration::from_millis(40)
}
