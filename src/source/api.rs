//! Decoding of the dashboard backend's response bodies.
//!
//! Two shapes are served:
//!
//! - a bare JSON array of records (`GET /parking-spot`)
//! - an envelope `{status, message, data}` whose `data` is a listing page
//!   `{items, filter, totalItems}` (`GET /admin/users`)
//!
//! An envelope with `status: "error"` is a failed fetch carrying the
//! server's message.

use crate::error::{Result, ResultExt, SpotViewError};
use crate::source::DataSource;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

/// Standard response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ApiResponse<T> {
    Success { message: String, data: T },
    Error { message: String },
}

impl<T> ApiResponse<T> {
    pub fn message(&self) -> &str {
        match self {
            ApiResponse::Success { message, .. } | ApiResponse::Error { message } => message,
        }
    }

    /// The payload, or a fetch error with the server's message.
    pub fn into_result(self) -> Result<T> {
        match self {
            ApiResponse::Success { data, .. } => Ok(data),
            ApiResponse::Error { message } => Err(SpotViewError::Fetch(message)),
        }
    }
}

/// One page of a listing endpoint. The backend always sends the full list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemsPage<T> {
    pub items: Vec<T>,
    /// Echo of the server-side filter; not interpreted.
    #[serde(default)]
    pub filter: serde_json::Value,
    #[serde(default)]
    pub total_items: usize,
}

/// Decode a bare JSON array.
pub fn decode_rows<T: DeserializeOwned>(body: &str) -> Result<Vec<T>> {
    serde_json::from_str(body).context("Failed to decode row array")
}

/// Decode an `{status, message, data: {items, ..}}` envelope.
pub fn decode_items_envelope<T: DeserializeOwned>(body: &str) -> Result<Vec<T>> {
    let response: ApiResponse<ItemsPage<T>> =
        serde_json::from_str(body).context("Failed to decode response envelope")?;
    let page = response.into_result()?;
    if page.total_items != 0 && page.total_items != page.items.len() {
        tracing::debug!(
            "Listing reports {} items but sent {}",
            page.total_items,
            page.items.len()
        );
    }
    Ok(page.items)
}

/// Which body shape an endpoint serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    RawArray,
    ItemsEnvelope,
}

impl PayloadShape {
    pub fn decode<T: DeserializeOwned>(self, body: &str) -> Result<Vec<T>> {
        match self {
            PayloadShape::RawArray => decode_rows(body),
            PayloadShape::ItemsEnvelope => decode_items_envelope(body),
        }
    }
}

/// A data source that fetches a response body and decodes it.
///
/// The transport is any closure returning the body text, so the same
/// decoding runs against a real client, a file, or a canned string.
pub struct JsonSource<T, F> {
    name: String,
    shape: PayloadShape,
    fetch_body: F,
    _marker: PhantomData<fn() -> T>,
}

impl<T, F> JsonSource<T, F>
where
    F: Fn() -> Result<String> + Send + Sync,
{
    pub fn new(name: impl Into<String>, shape: PayloadShape, fetch_body: F) -> Self {
        Self {
            name: name.into(),
            shape,
            fetch_body,
            _marker: PhantomData,
        }
    }
}

impl<T, F> DataSource<T> for JsonSource<T, F>
where
    T: DeserializeOwned,
    F: Fn() -> Result<String> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self) -> Result<Vec<T>> {
        let body = (self.fetch_body)().with_context(|| format!("Fetching '{}'", self.name))?;
        self.shape.decode(&body)
    }
}
