//! WiFi state machine behavior against a scripted radio.

use std::cell::Cell;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::time::Duration;

use neomatrix::connectivity::wifi::{WifiConfig, WifiManager, WifiRadio, WifiState};
use neomatrix::Result;

const DEVICE_ID: &str = "a1b2c3";

/// Radio double: configured SSIDs associate on the first poll, everything
/// else stays down forever.
#[derive(Default)]
struct MockRadio {
    reachable: HashMap<String, Ipv4Addr>,
    /// SSIDs that report associated but never receive an address.
    addressless: Vec<String>,
    /// SSIDs whose association cannot even be started.
    broken: Vec<String>,
    current: Option<String>,
    ap: Option<(String, String)>,
    begin_calls: Vec<String>,
    stop_station_calls: u32,
    association_checks: Cell<u32>,
}

impl WifiRadio for MockRadio {
    fn begin_station(&mut self, ssid: &str, _secret: &str) -> Result<()> {
        self.begin_calls.push(ssid.to_string());
        if self.broken.contains(&ssid.to_string()) {
            return Err(neomatrix::Error::Wifi("radio busy".into()));
        }
        self.current = Some(ssid.to_string());
        Ok(())
    }

    fn stop_station(&mut self) {
        self.stop_station_calls += 1;
        self.current = None;
    }

    fn station_associated(&self) -> bool {
        self.association_checks
            .set(self.association_checks.get() + 1);
        match &self.current {
            Some(ssid) => {
                self.reachable.contains_key(ssid) || self.addressless.contains(ssid)
            }
            None => false,
        }
    }

    fn station_address(&self) -> Option<Ipv4Addr> {
        self.current
            .as_ref()
            .and_then(|ssid| self.reachable.get(ssid))
            .copied()
    }

    fn start_access_point(&mut self, ssid: &str, secret: &str) -> Result<()> {
        self.ap = Some((ssid.to_string(), secret.to_string()));
        Ok(())
    }

    fn stop_access_point(&mut self) {
        self.ap = None;
    }

    fn access_point_active(&self) -> bool {
        self.ap.is_some()
    }

    fn device_id(&self) -> String {
        DEVICE_ID.to_string()
    }
}

fn config(stations: &[&str]) -> WifiConfig {
    WifiConfig {
        stations: stations
            .iter()
            .map(|ssid| (ssid.to_string(), "secret".to_string()))
            .collect(),
        ap_prefix: "sense".to_string(),
        ap_secret: "fallback-pass".to_string(),
        polls_per_station: 5,
        poll_interval: Duration::ZERO,
    }
}

#[test]
fn exhausted_candidates_fall_back_to_access_point() {
    let radio = MockRadio::default();
    let mut manager = WifiManager::new(radio, config(&["one", "two", "three"]));

    let state = manager.connect(false);

    let expected_ssid = format!("sense-{DEVICE_ID}");
    assert_eq!(state, WifiState::AccessPoint(expected_ssid.clone()));
    assert_eq!(manager.state(), &WifiState::AccessPoint(expected_ssid.clone()));

    let radio = manager.radio();
    assert_eq!(radio.begin_calls, vec!["one", "two", "three"]);
    assert_eq!(
        radio.ap,
        Some((expected_ssid, "fallback-pass".to_string()))
    );
    // Polling is bounded: one initial status check plus exactly
    // polls_per_station checks per candidate.
    assert_eq!(radio.association_checks.get(), 1 + 3 * 5);
}

#[test]
fn first_reachable_candidate_wins() {
    let mut radio = MockRadio::default();
    let address = Ipv4Addr::new(10, 0, 0, 7);
    radio.reachable.insert("two".to_string(), address);
    let mut manager = WifiManager::new(radio, config(&["one", "two", "three"]));

    let state = manager.connect(false);

    assert_eq!(state, WifiState::StationConnected(address));
    // The third candidate is never tried and no AP comes up.
    assert_eq!(manager.radio().begin_calls, vec!["one", "two"]);
    assert!(manager.radio().ap.is_none());
}

#[test]
fn connect_is_a_no_op_while_station_holds() {
    let mut radio = MockRadio::default();
    radio
        .reachable
        .insert("home".to_string(), Ipv4Addr::new(192, 168, 1, 20));
    let mut manager = WifiManager::new(radio, config(&["home"]));

    manager.connect(false);
    assert!(manager.is_station_connected());
    let begins_after_first = manager.radio().begin_calls.len();

    let state = manager.connect(false);
    assert!(matches!(state, WifiState::StationConnected(_)));
    assert_eq!(manager.radio().begin_calls.len(), begins_after_first);

    // A forced reconnect tears down and re-associates.
    let state = manager.connect(true);
    assert!(matches!(state, WifiState::StationConnected(_)));
    assert_eq!(manager.radio().begin_calls.len(), begins_after_first + 1);
}

#[test]
fn associated_without_address_is_not_connected() {
    let mut radio = MockRadio::default();
    radio.addressless.push("flaky".to_string());
    let mut manager = WifiManager::new(radio, config(&["flaky"]));

    let state = manager.connect(false);

    // The link claimed association throughout but never got an address, so
    // the candidate is exhausted and the AP fallback takes over.
    assert!(matches!(state, WifiState::AccessPoint(_)));
}

#[test]
fn status_tears_down_addressless_station_links() {
    let mut radio = MockRadio::default();
    radio.addressless.push("ghost".to_string());
    radio.current = Some("ghost".to_string());
    let mut manager = WifiManager::new(radio, config(&[]));

    let state = manager.status();

    assert_eq!(state, WifiState::Disconnected);
    assert_eq!(manager.radio().stop_station_calls, 1);
}

#[test]
fn failed_association_start_moves_to_the_next_candidate() {
    let mut radio = MockRadio::default();
    radio.broken.push("one".to_string());
    radio
        .reachable
        .insert("two".to_string(), Ipv4Addr::new(10, 0, 0, 9));
    let mut manager = WifiManager::new(radio, config(&["one", "two"]));

    let state = manager.connect(false);

    assert_eq!(state, WifiState::StationConnected(Ipv4Addr::new(10, 0, 0, 9)));
    assert_eq!(manager.radio().begin_calls, vec!["one", "two"]);
}

#[test]
fn empty_candidate_list_goes_straight_to_access_point() {
    let radio = MockRadio::default();
    let mut manager = WifiManager::new(radio, config(&[]));

    let state = manager.connect(false);
    assert_eq!(
        state,
        WifiState::AccessPoint(format!("sense-{DEVICE_ID}"))
    );
    assert!(manager.radio().begin_calls.is_empty());
}
