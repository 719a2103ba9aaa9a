//! Tracking report message types.
//!
//! A report identifies the driver and the vehicle and carries one position
//! fix. It is serialized as a single JSON object:
//!
//! ```json
//! {
//!   "driver": { "name": "Albert" },
//!   "vehicle": {
//!     "type": "car",
//!     "brand": "Dacia",
//!     "model": "Lodggy",
//!     "color": "blue",
//!     "regisPlate": ""
//!   },
//!   "point": [42.56407944511193, -0.5709161516278983],
//!   "timestamp": 1538205371
//! }
//! ```

use serde::{Deserialize, Serialize};

/// Tracking report posted to the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportPayload {
    pub driver: DriverInfo,
    pub vehicle: VehicleInfo,
    /// Position as `[latitude, longitude]` in decimal degrees.
    pub point: [f64; 2],
    /// Unix timestamp of the fix, in seconds.
    pub timestamp: u64,
}

/// Driver section of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverInfo {
    pub name: String,
}

/// Vehicle section of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleInfo {
    #[serde(rename = "type")]
    pub vehicle_type: String,
    pub brand: String,
    pub model: String,
    pub color: String,
    /// Registration plate; may be empty.
    #[serde(rename = "regisPlate")]
    pub registration_plate: String,
}

impl ReportPayload {
    /// The report the firmware currently sends on every cycle.
    ///
    /// No GPS receiver is wired in yet, so the driver, vehicle, position and
    /// timestamp are fixed values.
    pub fn fixed() -> Self {
        Self {
            driver: DriverInfo {
                name: "Albert".to_string(),
            },
            vehicle: VehicleInfo {
                vehicle_type: "car".to_string(),
                brand: "Dacia".to_string(),
                model: "Lodggy".to_string(),
                color: "blue".to_string(),
                registration_plate: String::new(),
            },
            point: [42.56407944511193, -0.5709161516278983],
            timestamp: 1538205371,
        }
    }

    /// Latitude in decimal degrees.
    pub fn latitude(&self) -> f64 {
        self.point[0]
    }

    /// Longitude in decimal degrees.
    pub fn longitude(&self) -> f64 {
        self.point[1]
    }
}
