//! Simulated WiFi link for running on a host.
//!
//! The host is already on a network, so associating only records the
//! credentials and reports the link as up. An empty SSID never connects,
//! like on the device.

use std::net::Ipv4Addr;

use gps_tracker_core::network::{NetworkError, WifiDriver, WifiStatus};
use tracing::info;

#[derive(Debug, Default)]
pub struct HostWifi {
    station: bool,
    ssid: Option<String>,
}

impl HostWifi {
    pub fn new() -> Self {
        Self::default()
    }

    /// SSID of the current association, if any.
    pub fn ssid(&self) -> Option<&str> {
        self.ssid.as_deref()
    }
}

impl WifiDriver for HostWifi {
    fn set_station_mode(&mut self) -> Result<(), NetworkError> {
        self.station = true;
        Ok(())
    }

    fn begin(&mut self, ssid: &str, _password: &str) -> Result<(), NetworkError> {
        if !self.station {
            return Err(NetworkError::Driver("radio is not in station mode".to_string()));
        }
        if ssid.is_empty() {
            self.ssid = None;
        } else {
            info!("Simulated link to '{}' is up", ssid);
            self.ssid = Some(ssid.to_string());
        }
        Ok(())
    }

    fn status(&self) -> WifiStatus {
        match (self.station, &self.ssid) {
            (false, _) => WifiStatus::Idle,
            (true, Some(_)) => WifiStatus::Connected,
            (true, None) => WifiStatus::Disconnected,
        }
    }

    fn local_ip(&self) -> Option<Ipv4Addr> {
        self.ssid.as_ref().map(|_| Ipv4Addr::LOCALHOST)
    }

    fn disconnect(&mut self, clear_credentials: bool) -> Result<(), NetworkError> {
        self.ssid = None;
        if clear_credentials {
            self.station = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_requires_station_mode() {
        let mut wifi = HostWifi::new();
        assert!(wifi.begin("net", "pw").is_err());
        assert_eq!(wifi.status(), WifiStatus::Idle);
    }

    #[test]
    fn test_link_lifecycle() {
        let mut wifi = HostWifi::new();
        wifi.set_station_mode().unwrap();
        wifi.begin("net", "pw").unwrap();

        assert_eq!(wifi.status(), WifiStatus::Connected);
        assert_eq!(wifi.ssid(), Some("net"));
        assert_eq!(wifi.local_ip(), Some(Ipv4Addr::LOCALHOST));

        wifi.disconnect(true).unwrap();
        assert_eq!(wifi.status(), WifiStatus::Idle);
        assert_eq!(wifi.local_ip(), None);
    }

    #[test]
    fn test_empty_ssid_never_connects() {
        let mut wifi = HostWifi::new();
        wifi.set_station_mode().unwrap();
        wifi.begin("", "").unwrap();

        assert_eq!(wifi.status(), WifiStatus::Disconnected);
    }
}
