//! Error handling for spotview
//!
//! This module defines the crate-level error type and a Result alias used by
//! configuration, data sources and the demo binary. Pipeline-specific
//! failures live in [`crate::pipeline::error`] and convert into this type.

use crate::pipeline::PipelineError;
use thiserror::Error;

/// Main error type for spotview operations
#[derive(Error, Debug)]
pub enum SpotViewError {
    /// Errors raised by the row-model pipeline
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// A data source could not deliver a snapshot
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Errors related to decoding wire payloads
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<SpotViewError>,
    },
}

impl SpotViewError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        SpotViewError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Result type alias for spotview operations
pub type Result<T> = std::result::Result<T, SpotViewError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, serde_json::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| SpotViewError::from(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| SpotViewError::from(e).with_context(f()))
    }
}
