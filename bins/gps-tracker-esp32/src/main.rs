//! GPS driver tracker firmware for ESP32
//!
//! This binary requires the ESP32 Rust toolchain.
//! It will not compile with the standard Rust toolchain.
//!
//! The config file is read from the `storage` SPIFFS partition as
//! `/config.json`. Flash it alongside the application image.

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::prelude::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;

use gps_tracker_core::{SystemClock, Tracker, TrackerOptions};
use gps_tracker_esp32::{EspHttpClient, EspWifiDriver, SpiffsFilesystem};

fn main() -> anyhow::Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    log::info!("GPS tracker v{} starting", env!("CARGO_PKG_VERSION"));

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    let wifi = EspWifiDriver::new(peripherals.modem, sysloop, Some(nvs))?;

    let tracker = Tracker::new(
        SpiffsFilesystem::new(),
        wifi,
        EspHttpClient::new(),
        SystemClock::new(),
        TrackerOptions::default(),
    );

    tracker.run()
}
