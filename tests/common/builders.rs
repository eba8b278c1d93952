//! Test data builders for creating test objects

use chrono::{DateTime, TimeZone, Utc};
use spotview::{ParkingSpot, User};

/// Fixed instant `seconds` after 2024-05-01T00:00:00Z
pub fn at(seconds: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap() + chrono::Duration::seconds(seconds)
}

/// Builder for creating test ParkingSpots
pub struct ParkingSpotBuilder {
    spot: ParkingSpot,
}

impl ParkingSpotBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            spot: ParkingSpot::new(id, 46.05, 14.50),
        }
    }

    pub fn position(mut self, latitude: f64, longitude: f64) -> Self {
        self.spot.latitude = latitude;
        self.spot.longitude = longitude;
        self
    }

    pub fn zone(mut self, zone: &str) -> Self {
        self.spot.parking_spot_zone = Some(zone.to_string());
        self
    }

    /// Occupied since `seconds` after the fixture epoch
    pub fn occupied_at(mut self, seconds: i64) -> Self {
        self.spot.occupied = true;
        self.spot.occupied_timestamp = Some(at(seconds));
        self
    }

    pub fn build(self) -> ParkingSpot {
        self.spot
    }
}

/// Builder for creating test Users
pub struct UserBuilder {
    user: User,
}

impl UserBuilder {
    pub fn new(id: u64, email: &str) -> Self {
        Self {
            user: User {
                id,
                created_at: at(0),
                updated_at: at(0),
                deleted_at: None,
                name: None,
                email: email.to_string(),
                email_verified_at: None,
                role: "user".to_string(),
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.user.name = Some(name.to_string());
        self
    }

    pub fn role(mut self, role: &str) -> Self {
        self.user.role = role.to_string();
        self
    }

    pub fn created_at(mut self, seconds: i64) -> Self {
        self.user.created_at = at(seconds);
        self.user.updated_at = at(seconds);
        self
    }

    pub fn build(self) -> User {
        self.user
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parking_spot_builder() {
        let spot = ParkingSpotBuilder::new("s1").zone("A").occupied_at(60).build();
        assert_eq!(spot.id, "s1");
        assert_eq!(spot.zone(), Some("A"));
        assert!(spot.occupied);
        assert_eq!(spot.occupied_timestamp, Some(at(60)));
    }

    #[test]
    fn test_user_builder() {
        let user = UserBuilder::new(3, "ada@example.com").name("Ada").role("admin").build();
        assert!(user.is_admin());
        assert_eq!(user.name.as_deref(), Some("Ada"));
    }
}
