//! WiFi station driver for ESP32.
//!
//! Wraps `EspWifi` in the non-blocking shape the tracker core expects:
//! [`WifiDriver::begin`] only starts the association, and the core polls
//! [`WifiDriver::status`] until the netif is up.

use std::net::Ipv4Addr;

use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::{modem::Modem, peripheral},
    nvs::EspDefaultNvsPartition,
    sys::EspError,
    wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi},
};
use gps_tracker_core::network::{NetworkError, WifiDriver, WifiStatus};
use log::{info, warn};

fn driver_error(e: EspError) -> NetworkError {
    NetworkError::Driver(e.to_string())
}

/// ESP-IDF WiFi station.
pub struct EspWifiDriver {
    wifi: Box<EspWifi<'static>>,
    /// An association was requested and not torn down since.
    associating: bool,
}

impl EspWifiDriver {
    /// Create the driver. The radio stays off until
    /// [`WifiDriver::set_station_mode`] is called.
    pub fn new(
        modem: impl peripheral::Peripheral<P = Modem> + 'static,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
    ) -> anyhow::Result<Self> {
        let wifi = EspWifi::new(modem, sysloop, nvs)?;
        Ok(Self {
            wifi: Box::new(wifi),
            associating: false,
        })
    }

    /// Channel the access point was seen on, if a scan finds it.
    fn find_channel(&mut self, ssid: &str) -> Option<u8> {
        match self.wifi.scan() {
            Ok(aps) => {
                let channel = aps
                    .into_iter()
                    .find(|ap| ap.ssid.as_str() == ssid)
                    .map(|ap| ap.channel);
                match channel {
                    Some(channel) => info!("Found '{}' on channel {}", ssid, channel),
                    None => info!("Network '{}' not found in scan, will try anyway", ssid),
                }
                channel
            }
            Err(e) => {
                warn!("WiFi scan failed: {}", e);
                None
            }
        }
    }
}

impl WifiDriver for EspWifiDriver {
    fn set_station_mode(&mut self) -> Result<(), NetworkError> {
        self.wifi
            .set_configuration(&Configuration::Client(ClientConfiguration::default()))
            .map_err(driver_error)?;
        if !self.wifi.is_started().map_err(driver_error)? {
            self.wifi.start().map_err(driver_error)?;
        }
        Ok(())
    }

    fn begin(&mut self, ssid: &str, password: &str) -> Result<(), NetworkError> {
        let auth_method = if password.is_empty() {
            info!("WiFi password is empty, using open network");
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };

        let configuration = ClientConfiguration {
            ssid: ssid.try_into().map_err(|_| {
                NetworkError::InvalidCredentials(format!("SSID '{}' is longer than 32 bytes", ssid))
            })?,
            password: password.try_into().map_err(|_| {
                NetworkError::InvalidCredentials("password is longer than 64 bytes".to_string())
            })?,
            channel: self.find_channel(ssid),
            auth_method,
            ..Default::default()
        };

        self.wifi
            .set_configuration(&Configuration::Client(configuration))
            .map_err(driver_error)?;
        self.wifi.connect().map_err(driver_error)?;
        self.associating = true;
        Ok(())
    }

    fn status(&self) -> WifiStatus {
        match self.wifi.is_started() {
            Ok(true) => {}
            Ok(false) => return WifiStatus::Idle,
            Err(_) => return WifiStatus::Disconnected,
        }
        match (self.wifi.is_connected(), self.wifi.is_up()) {
            (Ok(true), Ok(true)) => WifiStatus::Connected,
            (Ok(true), _) => WifiStatus::WaitingForIp,
            (Ok(false), _) if self.associating => WifiStatus::Connecting,
            _ => WifiStatus::Disconnected,
        }
    }

    fn local_ip(&self) -> Option<Ipv4Addr> {
        if !self.wifi.is_up().unwrap_or(false) {
            return None;
        }
        let ip_info = self.wifi.sta_netif().get_ip_info().ok()?;
        Some(Ipv4Addr::from(ip_info.ip.octets()))
    }

    fn disconnect(&mut self, clear_credentials: bool) -> Result<(), NetworkError> {
        self.associating = false;
        if !self.wifi.is_started().map_err(driver_error)? {
            return Ok(());
        }
        if self.wifi.is_connected().map_err(driver_error)? {
            self.wifi.disconnect().map_err(driver_error)?;
        }
        if clear_credentials {
            self.wifi
                .set_configuration(&Configuration::Client(ClientConfiguration::default()))
                .map_err(driver_error)?;
            self.wifi.stop().map_err(driver_error)?;
        }
        Ok(())
    }
}
