//! GPS driver tracker running on a Linux host.
//!
//! Reads `config.json` from the directory given as the first argument
//! (default `data`) and posts the tracking report to the configured host.
//! The WiFi link is simulated; the host's own network is used.

mod http;
mod wifi;

use std::time::Duration;

use gps_tracker_core::{StdFilesystem, SystemClock, Tracker, TrackerOptions};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::http::TokioHttpClient;
use crate::wifi::HostWifi;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,gps_tracker_core=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let data_dir = std::env::args().nth(1).unwrap_or_else(|| "data".to_string());
    tracing::info!("GPS tracker v{} starting, data dir {}", env!("CARGO_PKG_VERSION"), data_dir);

    let options = TrackerOptions {
        connect_timeout: Some(Duration::from_secs(30)),
        ..TrackerOptions::default()
    };

    let tracker = Tracker::new(
        StdFilesystem::new(data_dir),
        HostWifi::new(),
        TokioHttpClient::new()?,
        SystemClock::new(),
        options,
    );

    tracker.run()
}
