//! Application state and main loop.
//!
//! [`Tracker`] owns every component and the process state. The boot
//! sequence is strictly ordered: mount storage, load config, connect,
//! post the first report. After that the loop posts one report per
//! interval, counted from the first report, forever.

use std::time::Duration;

use gps_tracker_protocol::tracking_url;
use tracing::{debug, error, info};

use crate::clock::Clock;
use crate::config::{Config, ConfigStore, FieldPolicy, CONFIG_PATH};
use crate::fs::Filesystem;
use crate::network::{NetworkSession, WifiDriver, CONNECT_POLL_INTERVAL};
use crate::report::{HttpClient, ReportOutcome, Reporter};
use crate::scheduler::{Phase, TimerState, REPORT_INTERVAL};

/// Tunables for the tracker. Defaults match the deployed firmware.
#[derive(Debug, Clone)]
pub struct TrackerOptions {
    /// Config file path within the mounted storage.
    pub config_path: String,
    /// Handling of config values longer than their field.
    pub field_policy: FieldPolicy,
    /// Time between timer-driven reports.
    pub report_interval: Duration,
    /// Delay between link checks while connecting.
    pub connect_poll_interval: Duration,
    /// Give up connecting after this long. `None` waits forever.
    pub connect_timeout: Option<Duration>,
    /// Pause between the link coming up and the first report.
    pub post_connect_delay: Duration,
    /// Sleep between two loop iterations.
    pub loop_idle: Duration,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            config_path: CONFIG_PATH.to_string(),
            field_policy: FieldPolicy::Truncate,
            report_interval: REPORT_INTERVAL,
            connect_poll_interval: CONNECT_POLL_INTERVAL,
            connect_timeout: None,
            post_connect_delay: Duration::from_millis(1500),
            loop_idle: Duration::from_millis(10),
        }
    }
}

/// Mutable process state.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// Loaded once during setup; empty if loading failed.
    pub config: Config,
    pub timer: TimerState,
}

/// The tracker application.
#[derive(Debug)]
pub struct Tracker<F, W, H, C> {
    store: ConfigStore<F>,
    network: NetworkSession<W>,
    reporter: Reporter<H>,
    clock: C,
    post_connect_delay: Duration,
    loop_idle: Duration,
    state: AppState,
}

impl<F, W, H, C> Tracker<F, W, H, C>
where
    F: Filesystem,
    W: WifiDriver,
    H: HttpClient,
    C: Clock,
{
    pub fn new(fs: F, wifi: W, http: H, clock: C, options: TrackerOptions) -> Self {
        let store = ConfigStore::new(fs)
            .with_path(options.config_path)
            .with_policy(options.field_policy);
        let network = NetworkSession::new(wifi)
            .with_poll_interval(options.connect_poll_interval)
            .with_timeout(options.connect_timeout);

        Self {
            store,
            network,
            reporter: Reporter::new(http),
            clock,
            post_connect_delay: options.post_connect_delay,
            loop_idle: options.loop_idle,
            state: AppState {
                config: Config::default(),
                timer: TimerState::new(options.report_interval),
            },
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn store(&self) -> &ConfigStore<F> {
        &self.store
    }

    pub fn network(&self) -> &NetworkSession<W> {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut NetworkSession<W> {
        &mut self.network
    }

    pub fn reporter(&self) -> &Reporter<H> {
        &self.reporter
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Run the boot sequence and post the first report.
    ///
    /// Returns the outcome of that first report, or `None` if the storage
    /// could not be mounted and setup stopped early. Other failures are
    /// logged and setup carries on with whatever state it has.
    pub fn setup(&mut self) -> Option<ReportOutcome> {
        if let Err(e) = self.store.mount() {
            error!("{}", e);
            return None;
        }

        match self.store.load_into(&mut self.state.config) {
            Ok(()) => {
                info!("Config loaded");
                info!(
                    "Reporting driver '{}' to {}",
                    self.state.config.driver,
                    tracking_url(&self.state.config.host)
                );
            }
            Err(e) => {
                error!("{}", e);
                error!("Failed to load config");
            }
        }

        if let Err(e) = self.network.connect(
            &self.state.config.ssid,
            &self.state.config.password,
            &self.clock,
        ) {
            error!("{}", e);
        }
        self.clock.sleep(self.post_connect_delay);

        let outcome = self.report();
        self.state.timer.rearm(self.clock.now_ms());
        debug!("Next report in {} ms", self.state.timer.remaining_ms());
        Some(outcome)
    }

    /// One loop iteration: post a report if the timer is due.
    pub fn tick(&mut self) -> Option<ReportOutcome> {
        match self.state.timer.poll(self.clock.now_ms()) {
            Phase::Due => {
                let outcome = self.report();
                debug!("Next report in {} ms", self.state.timer.remaining_ms());
                Some(outcome)
            }
            Phase::Idle => None,
        }
    }

    /// Boot, then loop forever.
    pub fn run(mut self) -> ! {
        self.setup();
        loop {
            self.tick();
            self.clock.sleep(self.loop_idle);
        }
    }

    fn report(&mut self) -> ReportOutcome {
        self.reporter
            .post_report(&self.state.config.host, &self.network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::ConfigFile;
    use crate::network::{NetworkError, WifiStatus};
    use crate::report::{HttpError, HttpResponse};
    use std::cell::Cell;
    use std::io::{self, Cursor, Read};
    use std::net::Ipv4Addr;

    #[derive(Debug, Default)]
    struct ManualClock {
        now: Cell<u64>,
    }

    impl Clock for ManualClock {
        fn now_ms(&self) -> u64 {
            self.now.get()
        }

        fn sleep(&self, duration: Duration) {
            self.now.set(self.now.get() + duration.as_millis() as u64);
        }
    }

    #[derive(Debug)]
    struct OneFile {
        contents: Option<&'static str>,
        mountable: bool,
    }

    struct OneFileHandle(Cursor<&'static str>);

    impl Read for OneFileHandle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.0.read(buf)
        }
    }

    impl ConfigFile for OneFileHandle {
        fn size(&self) -> io::Result<u64> {
            Ok(self.0.get_ref().len() as u64)
        }
    }

    impl Filesystem for OneFile {
        type File = OneFileHandle;

        fn mount(&mut self) -> io::Result<()> {
            if self.mountable {
                Ok(())
            } else {
                Err(io::Error::new(io::ErrorKind::Other, "no partition"))
            }
        }

        fn open(&self, path: &str) -> io::Result<OneFileHandle> {
            match (path, self.contents) {
                ("/config.json", Some(contents)) => Ok(OneFileHandle(Cursor::new(contents))),
                _ => Err(io::ErrorKind::NotFound.into()),
            }
        }
    }

    #[derive(Debug, Default)]
    struct InstantWifi {
        begun: Option<(String, String)>,
    }

    impl WifiDriver for InstantWifi {
        fn set_station_mode(&mut self) -> Result<(), NetworkError> {
            Ok(())
        }

        fn begin(&mut self, ssid: &str, password: &str) -> Result<(), NetworkError> {
            self.begun = Some((ssid.to_string(), password.to_string()));
            Ok(())
        }

        fn status(&self) -> WifiStatus {
            if self.begun.is_some() {
                WifiStatus::Connected
            } else {
                WifiStatus::Disconnected
            }
        }

        fn local_ip(&self) -> Option<Ipv4Addr> {
            Some(Ipv4Addr::LOCALHOST)
        }

        fn disconnect(&mut self, _clear_credentials: bool) -> Result<(), NetworkError> {
            self.begun = None;
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct CountingClient {
        urls: Vec<String>,
    }

    impl HttpClient for CountingClient {
        fn post(
            &mut self,
            url: &str,
            _headers: &[(&str, &str)],
            _body: &[u8],
        ) -> Result<HttpResponse, HttpError> {
            self.urls.push(url.to_string());
            Ok(HttpResponse {
                status: 200,
                body: "ok".to_string(),
            })
        }
    }

    const CONFIG: &str = r#"{"myDRIVER":"d1","myHOST":"http://h","mySSID":"net","myPASSWORD":"pw"}"#;

    fn tracker(fs: OneFile) -> Tracker<OneFile, InstantWifi, CountingClient, ManualClock> {
        Tracker::new(
            fs,
            InstantWifi::default(),
            CountingClient::default(),
            ManualClock::default(),
            TrackerOptions::default(),
        )
    }

    #[test]
    fn test_setup_posts_first_report() {
        let mut tracker = tracker(OneFile {
            contents: Some(CONFIG),
            mountable: true,
        });

        let outcome = tracker.setup();

        assert!(matches!(outcome, Some(ReportOutcome::Sent(_))));
        assert_eq!(tracker.state().config.host, "http://h");
        assert_eq!(
            tracker.network().driver().begun,
            Some(("net".to_string(), "pw".to_string()))
        );
        assert_eq!(
            tracker.reporter().http().urls,
            vec!["http://h/api/v1/driver/tracking".to_string()]
        );
        // 100 ms mode settle + 1500 ms post-connect delay.
        assert_eq!(tracker.clock().now_ms(), 1600);
        assert_eq!(tracker.state().timer.updated_ms, 1600);
    }

    #[test]
    fn test_mount_failure_stops_setup() {
        let mut tracker = tracker(OneFile {
            contents: Some(CONFIG),
            mountable: false,
        });

        assert!(tracker.setup().is_none());
        assert!(tracker.network().driver().begun.is_none());
        assert!(tracker.reporter().http().urls.is_empty());

        // The loop keeps running but every report is skipped.
        tracker.clock().sleep(REPORT_INTERVAL + Duration::from_millis(1));
        assert!(matches!(tracker.tick(), Some(ReportOutcome::Skipped)));
        assert!(tracker.reporter().http().urls.is_empty());
    }

    #[test]
    fn test_missing_config_degrades_to_empty_credentials() {
        let mut tracker = tracker(OneFile {
            contents: None,
            mountable: true,
        });

        tracker.setup();

        assert_eq!(tracker.state().config, Config::default());
        assert_eq!(
            tracker.network().driver().begun,
            Some((String::new(), String::new()))
        );
        assert_eq!(
            tracker.reporter().http().urls,
            vec!["/api/v1/driver/tracking".to_string()]
        );
    }

    #[test]
    fn test_tick_follows_timer() {
        let mut tracker = tracker(OneFile {
            contents: Some(CONFIG),
            mountable: true,
        });
        tracker.setup();

        assert!(tracker.tick().is_none());

        // The interval counts from the boot report at 1600 ms.
        tracker.clock().now.set(301_600);
        assert!(tracker.tick().is_none());
        tracker.clock().now.set(301_601);
        assert!(matches!(tracker.tick(), Some(ReportOutcome::Sent(_))));
        assert!(tracker.tick().is_none());
        assert_eq!(tracker.state().timer.updated_ms, 301_601);
        assert_eq!(tracker.reporter().http().urls.len(), 2);
    }

    #[test]
    fn test_default_options() {
        let options = TrackerOptions::default();

        assert_eq!(options.config_path, "/config.json");
        assert_eq!(options.report_interval, Duration::from_millis(300_000));
        assert_eq!(options.connect_poll_interval, Duration::from_millis(500));
        assert_eq!(options.connect_timeout, None);
        assert_eq!(options.post_connect_delay, Duration::from_millis(1500));
        assert_eq!(options.field_policy, FieldPolicy::Truncate);
    }

    #[test]
    fn test_tracker_debug_shows_state() {
        let mut tracker = tracker(OneFile {
            contents: Some(CONFIG),
            mountable: true,
        });
        tracker.setup();

        let debug = format!("{:?}", tracker);

        assert!(debug.starts_with("Tracker"));
        assert!(debug.contains("updated_ms: 1600"));
        assert!(debug.contains("password: \"<redacted>\""));
    }
}
