//! Wi-Fi station session.
//!
//! [`NetworkSession`] drives a [`WifiDriver`] through station-mode
//! association and blocks until the link is up. Platforms plug in their
//! own driver (ESP-IDF on the device, a simulated link on the host).

use std::net::Ipv4Addr;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::clock::Clock;

/// Delay between mode change and association.
pub const MODE_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Delay between two link status checks while connecting.
pub const CONNECT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// WiFi connection status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiStatus {
    /// Radio started, no association attempted yet.
    Idle,
    /// Not connected to any network.
    Disconnected,
    /// Connecting to network.
    Connecting,
    /// Connected but waiting for IP.
    WaitingForIp,
    /// Fully connected with IP address.
    Connected,
    /// The last association attempt was refused.
    ConnectFailed,
}

/// Errors reported by a Wi-Fi driver or while connecting.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The underlying radio stack failed.
    #[error("WiFi driver error: {0}")]
    Driver(String),

    /// The stack refused the SSID or passphrase (e.g. too long).
    #[error("Invalid WiFi credentials: {0}")]
    InvalidCredentials(String),

    /// The link did not come up before the connect timeout.
    #[error("Timed out after {waited:?} connecting to '{ssid}'")]
    Timeout { ssid: String, waited: Duration },
}

/// Platform Wi-Fi station.
pub trait WifiDriver {
    /// Switch the radio to station (client) mode.
    fn set_station_mode(&mut self) -> Result<(), NetworkError>;

    /// Start associating with a network. Must not block until connected.
    fn begin(&mut self, ssid: &str, password: &str) -> Result<(), NetworkError>;

    /// Current link state.
    fn status(&self) -> WifiStatus;

    /// Address assigned by DHCP, once connected.
    fn local_ip(&self) -> Option<Ipv4Addr>;

    /// Drop the association. With `clear_credentials` the stored SSID and
    /// passphrase are erased as well.
    fn disconnect(&mut self, clear_credentials: bool) -> Result<(), NetworkError>;
}

/// Anything that can tell whether the network link is usable.
pub trait LinkStatus {
    fn is_connected(&self) -> bool;
}

/// Station connection to a single network.
#[derive(Debug)]
pub struct NetworkSession<W> {
    driver: W,
    poll_interval: Duration,
    timeout: Option<Duration>,
}

impl<W: WifiDriver> NetworkSession<W> {
    /// Session that polls every [`CONNECT_POLL_INTERVAL`] and never gives up.
    pub fn new(driver: W) -> Self {
        Self {
            driver,
            poll_interval: CONNECT_POLL_INTERVAL,
            timeout: None,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Give up connecting after `timeout`. `None` blocks until the link is up.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn driver(&self) -> &W {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut W {
        &mut self.driver
    }

    pub fn status(&self) -> WifiStatus {
        self.driver.status()
    }

    pub fn local_ip(&self) -> Option<Ipv4Addr> {
        self.driver.local_ip()
    }

    /// Connect as a station and block until the link is up.
    ///
    /// Without a timeout this only returns once the driver reports
    /// [`WifiStatus::Connected`], or on a driver error.
    pub fn connect<C: Clock>(
        &mut self,
        ssid: &str,
        password: &str,
        clock: &C,
    ) -> Result<Ipv4Addr, NetworkError> {
        if ssid.is_empty() {
            warn!("WiFi SSID is empty, connection will not succeed");
        }

        self.driver.set_station_mode()?;
        clock.sleep(MODE_SETTLE_DELAY);

        info!("Connecting to {}", ssid);
        self.driver.begin(ssid, password)?;

        let started = clock.now_ms();
        loop {
            let status = self.driver.status();
            if status == WifiStatus::Connected {
                break;
            }
            if let Some(timeout) = self.timeout {
                let waited = Duration::from_millis(clock.now_ms().saturating_sub(started));
                if waited >= timeout {
                    return Err(NetworkError::Timeout {
                        ssid: ssid.to_string(),
                        waited,
                    });
                }
            }
            debug!("Waiting for WiFi ({:?})", status);
            clock.sleep(self.poll_interval);
        }

        let ip = self.driver.local_ip().unwrap_or(Ipv4Addr::UNSPECIFIED);
        info!("WiFi connected");
        info!("IP address: {}", ip);
        Ok(ip)
    }

    /// Tear down the station association and forget the credentials.
    pub fn disconnect(&mut self) -> Result<(), NetworkError> {
        self.driver.disconnect(true)?;
        info!("Turn wifi off.");
        Ok(())
    }
}

impl<W: WifiDriver> LinkStatus for NetworkSession<W> {
    fn is_connected(&self) -> bool {
        self.driver.status() == WifiStatus::Connected
    }
}
