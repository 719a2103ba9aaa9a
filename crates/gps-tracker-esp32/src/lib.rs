//! ESP32-specific components for the GPS tracker.
//!
//! This crate provides the ESP-IDF implementations of the collaborators the
//! tracker core is written against:
//! - [`SpiffsFilesystem`]: config storage on the SPIFFS partition
//! - [`EspWifiDriver`]: Wi-Fi station on top of `EspWifi`
//! - [`EspHttpClient`]: one-shot HTTP POSTs through `EspHttpConnection`
//!
//! # Example
//!
//! ```ignore
//! use gps_tracker_core::{SystemClock, Tracker, TrackerOptions};
//! use gps_tracker_esp32::{EspHttpClient, EspWifiDriver, SpiffsFilesystem};
//!
//! let wifi = EspWifiDriver::new(peripherals.modem, sysloop, Some(nvs))?;
//! let tracker = Tracker::new(
//!     SpiffsFilesystem::new(),
//!     wifi,
//!     EspHttpClient::new(),
//!     SystemClock::new(),
//!     TrackerOptions::default(),
//! );
//! tracker.run()
//! ```

pub mod http;
pub mod storage;
pub mod wifi;

pub use http::EspHttpClient;
pub use storage::SpiffsFilesystem;
pub use wifi::EspWifiDriver;
