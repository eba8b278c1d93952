//! Core record types served by the dashboard backend
//!
//! These mirror the JSON the backend serves, field names included, so they
//! deserialize straight from a response body.
//!
//! # Main Types
//!
//! - [`ParkingSpot`] - A monitored parking spot with its occupancy sensor state
//! - [`User`] - A registered account as listed in user management

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role string for administrators
pub const ADMIN_ROLE: &str = "admin";

/// A monitored parking spot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkingSpot {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Zone label, absent for spots that were never assigned one
    #[serde(default)]
    pub parking_spot_zone: Option<String>,
    pub occupied: bool,
    /// When the spot last changed to occupied
    #[serde(default)]
    pub occupied_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_data_received: Option<DateTime<Utc>>,
    #[serde(default)]
    pub price: f64,
}

impl ParkingSpot {
    pub fn new(id: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.into(),
            latitude,
            longitude,
            parking_spot_zone: None,
            occupied: false,
            occupied_timestamp: None,
            last_data_received: None,
            price: 0.0,
        }
    }

    /// Zone label, or `None` when missing or blank
    pub fn zone(&self) -> Option<&str> {
        self.parking_spot_zone
            .as_deref()
            .map(str::trim)
            .filter(|z| !z.is_empty())
    }
}

/// A registered account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "ID")]
    pub id: u64,
    #[serde(rename = "CreatedAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "UpdatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "DeletedAt", default)]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    #[serde(rename = "emailVerifiedAt", default)]
    pub email_verified_at: Option<DateTime<Utc>>,
    pub role: String,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role.eq_ignore_ascii_case(ADMIN_ROLE)
    }

    pub fn is_verified(&self) -> bool {
        self.email_verified_at.is_some()
    }
}
