//! # gps-tracker-core
//!
//! Core logic of the driver tracker firmware.
//!
//! This crate provides:
//! - Configuration loading from a size-bounded JSON file
//! - Wi-Fi station session over a pluggable driver
//! - Tracking report posting over a pluggable HTTP client
//! - The report timer and the main loop
//!
//! This crate is intentionally runtime-agnostic and contains no async code,
//! making it usable on both Linux and ESP32 (esp-idf) targets. Platform
//! crates supply the [`fs::Filesystem`], [`network::WifiDriver`] and
//! [`report::HttpClient`] implementations.

pub mod clock;
pub mod config;
pub mod fs;
pub mod network;
pub mod report;
pub mod scheduler;
pub mod tracker;

pub use clock::{Clock, SystemClock};
pub use config::{Config, ConfigError, ConfigStore, FieldPolicy};
pub use fs::{ConfigFile, Filesystem, StdFilesystem};
pub use network::{LinkStatus, NetworkError, NetworkSession, WifiDriver, WifiStatus};
pub use report::{HttpClient, HttpError, HttpResponse, ReportError, ReportOutcome, Reporter};
pub use scheduler::{Phase, TimerState, REPORT_INTERVAL};
pub use tracker::{AppState, Tracker, TrackerOptions};
