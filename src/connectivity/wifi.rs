//! WiFi station/access-point state machine.
//!
//! The manager tries each configured station in order, polling the radio for
//! a bounded interval per candidate. When every candidate fails it brings up
//! an access point with a generated SSID, so the device is always reachable
//! by some means once [`WifiManager::connect`] returns.

use std::net::Ipv4Addr;
use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::Result;
use crate::settings::Settings;

/// Station/access-point radio operations.
///
/// The associated flag alone is not trusted: right after association some
/// radios report a link before an address is assigned, and that combination
/// has been observed to be unreliable. Implementations must report the
/// address only once it is actually usable; the manager treats
/// associated-but-addressless as not connected.
pub trait WifiRadio {
    /// Begin associating with a station. Returns once the attempt is
    /// initiated; completion is observed by polling.
    fn begin_station(&mut self, ssid: &str, secret: &str) -> Result<()>;

    /// Tear down any station state.
    fn stop_station(&mut self);

    /// Whether the station link reports associated.
    fn station_associated(&self) -> bool;

    /// Address assigned to the station link, if any.
    fn station_address(&self) -> Option<Ipv4Addr>;

    /// Bring up an access point.
    fn start_access_point(&mut self, ssid: &str, secret: &str) -> Result<()>;

    /// Tear down any access-point state.
    fn stop_access_point(&mut self);

    /// Whether an access point is currently up.
    fn access_point_active(&self) -> bool;

    /// Stable device identifier, used in generated SSIDs and client ids.
    fn device_id(&self) -> String;
}

/// WiFi candidate list and fallback configuration.
#[derive(Debug, Clone)]
pub struct WifiConfig {
    /// Ordered `(ssid, secret)` candidates.
    pub stations: Vec<(String, String)>,
    /// Prefix of the generated access-point SSID.
    pub ap_prefix: String,
    /// Access-point secret.
    pub ap_secret: String,
    /// Poll attempts per candidate.
    pub polls_per_station: u32,
    /// Delay between poll attempts.
    pub poll_interval: Duration,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            stations: Vec::new(),
            ap_prefix: "neomatrix".to_string(),
            ap_secret: "xmas-tree".to_string(),
            polls_per_station: 50,
            poll_interval: Duration::from_millis(500),
        }
    }
}

impl WifiConfig {
    /// Build the configuration from settings.
    ///
    /// `wifi_stations` holds a JSON array of `[ssid, secret]` pairs; a
    /// malformed value is logged and treated as empty, which sends
    /// `connect()` straight to the access-point fallback.
    pub fn from_settings(settings: &Settings) -> Self {
        let defaults = Self::default();
        let stations = match settings.get("wifi_stations") {
            None => Vec::new(),
            Some(raw) => match serde_json::from_str::<Vec<(String, String)>>(raw) {
                Ok(stations) => stations,
                Err(err) => {
                    warn!("Error parsing wifi_stations setting: {err}");
                    Vec::new()
                }
            },
        };
        Self {
            stations,
            ap_prefix: settings.get_or("wifi_ap_pfx", &defaults.ap_prefix).to_string(),
            ap_secret: settings
                .get_or("wifi_ap_passwd", &defaults.ap_secret)
                .to_string(),
            ..defaults
        }
    }
}

/// Connectivity state of the WiFi sub-machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WifiState {
    /// No station link and no access point.
    Disconnected,
    /// Mid-`connect()`: polling one candidate.
    AttemptingStation {
        /// Index into the candidate list.
        candidate: usize,
        /// Poll attempts spent on this candidate so far.
        polls: u32,
    },
    /// Associated with an assigned address.
    StationConnected(Ipv4Addr),
    /// Access-point fallback with the generated SSID.
    AccessPoint(String),
}

/// WiFi connection manager.
pub struct WifiManager<R: WifiRadio> {
    radio: R,
    config: WifiConfig,
    state: WifiState,
    ap_ssid: Option<String>,
}

impl<R: WifiRadio> WifiManager<R> {
    /// Create a manager over a radio.
    pub fn new(radio: R, config: WifiConfig) -> Self {
        Self {
            radio,
            config,
            state: WifiState::Disconnected,
            ap_ssid: None,
        }
    }

    /// Last known state.
    pub fn state(&self) -> &WifiState {
        &self.state
    }

    /// The radio, e.g. for its device identifier.
    pub fn radio(&self) -> &R {
        &self.radio
    }

    /// Re-derive the current state from the radio.
    ///
    /// A station link that reports associated without an address is treated
    /// as lost and torn down.
    pub fn status(&mut self) -> WifiState {
        if self.radio.station_associated() {
            if let Some(address) = self.radio.station_address() {
                self.state = WifiState::StationConnected(address);
                return self.state.clone();
            }
            // Associated without an address: the link is not usable.
            self.radio.stop_station();
        }
        if self.radio.access_point_active() {
            if let Some(ssid) = &self.ap_ssid {
                self.state = WifiState::AccessPoint(ssid.clone());
                return self.state.clone();
            }
        }
        self.state = WifiState::Disconnected;
        self.state.clone()
    }

    /// Whether a usable station link is up.
    pub fn is_station_connected(&mut self) -> bool {
        matches!(self.status(), WifiState::StationConnected(_))
    }

    /// Establish connectivity.
    ///
    /// With an existing station link and `force_reconnect` false this is a
    /// no-op. Otherwise all radio state is torn down, every candidate is
    /// tried in order with bounded polling, and exhaustion ends in the
    /// access-point fallback. Blocks for the duration; nothing else is
    /// meaningful before connectivity exists at boot.
    pub fn connect(&mut self, force_reconnect: bool) -> WifiState {
        if !force_reconnect {
            if let WifiState::StationConnected(_) = self.status() {
                info!("Already connected to WiFi; nothing done.");
                return self.state.clone();
            }
        }

        // Dispose of earlier connections if any.
        self.radio.stop_access_point();
        self.radio.stop_station();
        self.ap_ssid = None;
        self.state = WifiState::Disconnected;

        for candidate in 0..self.config.stations.len() {
            let (ssid, secret) = self.config.stations[candidate].clone();
            info!("Attempting WiFi network \"{ssid}\".");
            self.state = WifiState::AttemptingStation {
                candidate,
                polls: 0,
            };
            if let Err(err) = self.radio.begin_station(&ssid, &secret) {
                warn!("Could not start association with \"{ssid}\": {err}");
                self.radio.stop_station();
                continue;
            }
            for polls in 0..self.config.polls_per_station {
                self.state = WifiState::AttemptingStation { candidate, polls };
                if self.radio.station_associated() {
                    if let Some(address) = self.radio.station_address() {
                        info!("Connected to WiFi network \"{ssid}\" with IP {address}.");
                        self.state = WifiState::StationConnected(address);
                        return self.state.clone();
                    }
                }
                if !self.config.poll_interval.is_zero() {
                    thread::sleep(self.config.poll_interval);
                }
            }
            info!("Connecting WiFi network \"{ssid}\" failed!");
            self.radio.stop_station();
        }

        // No station reachable: become an access point.
        let ssid = format!("{}-{}", self.config.ap_prefix, self.radio.device_id());
        info!("No WiFi network found. Starting AP with SSID \"{ssid}\".");
        match self.radio.start_access_point(&ssid, &self.config.ap_secret) {
            Ok(()) => {
                self.ap_ssid = Some(ssid.clone());
                self.state = WifiState::AccessPoint(ssid);
            }
            Err(err) => {
                warn!("Could not start AP \"{ssid}\": {err}");
                self.state = WifiState::Disconnected;
            }
        }
        self.state.clone()
    }
}
