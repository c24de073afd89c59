//! WiFi radio modes.

use crate::{NetworkLink, Peripheral};
use espsim_common::{Capability, IdentityContribution, PeripheralState, SimulationEvent, Tick};
use espsim_model::{WifiApConfig, WifiStaConfig};
use sha2::{Digest, Sha256};

/// Address of the device on its own soft-AP network (ESP-IDF default).
pub const AP_IP_ADDRESS: &str = "192.168.4.1";

/// First host octet handed out to a station.
const STA_HOST_BASE: u32 = 2;
/// Number of distinct station host octets (2..=254).
const STA_HOST_SPAN: u32 = 253;

/// Deterministic DHCP lease a station gets on the network `ssid`.
///
/// The host octet is `2 + h mod 253`, where `h` is the big-endian `u32` made
/// from the first four bytes of SHA-256(ssid). Stable across runs and platforms.
pub fn station_ip(ssid: &str) -> String {
    let digest = Sha256::digest(ssid.as_bytes());
    let h = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    format!("192.168.1.{}", STA_HOST_BASE + h % STA_HOST_SPAN)
}

// ============================================================================
// Soft Access Point
// ============================================================================

/// Soft access point. Comes up on its first tick.
#[derive(Debug, Clone)]
pub struct WifiAp {
    config: WifiApConfig,
    state: PeripheralState,
}

impl WifiAp {
    /// Create an access point that has not started yet.
    pub fn new(config: WifiApConfig) -> Self {
        WifiAp {
            config,
            state: PeripheralState::Uninitialized,
        }
    }

    /// The access point's configuration.
    pub fn config(&self) -> &WifiApConfig {
        &self.config
    }
}

impl Peripheral for WifiAp {
    fn capability(&self) -> Capability {
        Capability::WifiAp
    }

    fn state(&self) -> PeripheralState {
        self.state
    }

    fn boot(&mut self, tick: Tick, _link: NetworkLink) -> Vec<SimulationEvent> {
        if self.state != PeripheralState::Uninitialized {
            return Vec::new();
        }
        self.state = PeripheralState::Ready;
        vec![
            SimulationEvent::info(
                tick,
                Capability::WifiAp,
                format!(
                    "starting soft-AP \"{}\" on channel {}",
                    self.config.ssid, self.config.channel
                ),
            ),
            SimulationEvent::success(
                tick,
                Capability::WifiAp,
                format!("access point up at {}", AP_IP_ADDRESS),
            ),
        ]
    }

    fn steady_state(&self, _tick: Tick) -> Option<SimulationEvent> {
        None
    }

    fn identity_contribution(&self) -> IdentityContribution {
        IdentityContribution {
            ip_address: Some(AP_IP_ADDRESS.to_string()),
            ap_ssid: Some(self.config.ssid.clone()),
            ..IdentityContribution::none()
        }
    }
}

// ============================================================================
// Station
// ============================================================================

/// WiFi station. Logs one association attempt per tick, then connects.
#[derive(Debug, Clone)]
pub struct WifiSta {
    config: WifiStaConfig,
    state: PeripheralState,
    /// Association attempts logged so far.
    attempts: u32,
    /// Lease obtained on connect.
    ip_address: Option<String>,
}

impl WifiSta {
    /// Create a station that has not started associating yet.
    pub fn new(config: WifiStaConfig) -> Self {
        WifiSta {
            config,
            state: PeripheralState::Uninitialized,
            attempts: 0,
            ip_address: None,
        }
    }

    /// Association attempts logged so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// The leased address, once connected.
    pub fn ip_address(&self) -> Option<&str> {
        self.ip_address.as_deref()
    }
}

impl Peripheral for WifiSta {
    fn capability(&self) -> Capability {
        Capability::WifiSta
    }

    fn state(&self) -> PeripheralState {
        self.state
    }

    fn boot(&mut self, tick: Tick, _link: NetworkLink) -> Vec<SimulationEvent> {
        if self.state.is_terminal() {
            return Vec::new();
        }
        if self.config.ssid.is_empty() {
            self.state = PeripheralState::Failed;
            return vec![SimulationEvent::error(
                tick,
                Capability::WifiSta,
                "no SSID configured, cannot associate",
            )];
        }

        if self.attempts < self.config.connect_attempts {
            self.attempts += 1;
            self.state = PeripheralState::Initializing;
            return vec![SimulationEvent::info(
                tick,
                Capability::WifiSta,
                format!(
                    "connecting to \"{}\" (attempt {}/{})",
                    self.config.ssid, self.attempts, self.config.connect_attempts
                ),
            )];
        }

        self.ip_address = Some(station_ip(&self.config.ssid));
        self.state = PeripheralState::Ready;
        Vec::new()
    }

    fn steady_state(&self, tick: Tick) -> Option<SimulationEvent> {
        let ip = self.ip_address.as_deref()?;
        Some(SimulationEvent::success(
            tick,
            Capability::WifiSta,
            format!("connected to \"{}\", got IP {}", self.config.ssid, ip),
        ))
    }

    fn identity_contribution(&self) -> IdentityContribution {
        IdentityContribution {
            ip_address: self.ip_address.clone(),
            ..IdentityContribution::none()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use espsim_common::Severity;

    fn sta(ssid: &str, attempts: u32) -> WifiSta {
        WifiSta::new(WifiStaConfig {
            ssid: ssid.to_string(),
            password: String::new(),
            connect_attempts: attempts,
        })
    }

    #[test]
    fn test_ap_ready_on_first_tick() {
        let mut ap = WifiAp::new(WifiApConfig::with_ssid("Test"));
        let events = ap.boot(Tick::new(1), NetworkLink::Absent);

        assert_eq!(ap.state(), PeripheralState::Ready);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].message, "starting soft-AP \"Test\" on channel 1");
        assert_eq!(events[1].severity, Severity::Success);
        assert_eq!(events[1].message, "access point up at 192.168.4.1");
        assert!(ap.steady_state(Tick::new(1)).is_none());

        let identity = ap.identity_contribution();
        assert_eq!(identity.ip_address.as_deref(), Some("192.168.4.1"));
        assert_eq!(identity.ap_ssid.as_deref(), Some("Test"));
    }

    #[test]
    fn test_sta_attempts_then_connects() {
        let mut sta = sta("HomeNet", 2);

        let e1 = sta.boot(Tick::new(1), NetworkLink::Absent);
        assert_eq!(e1[0].message, "connecting to \"HomeNet\" (attempt 1/2)");
        assert_eq!(sta.state(), PeripheralState::Initializing);

        let e2 = sta.boot(Tick::new(2), NetworkLink::Absent);
        assert_eq!(e2[0].message, "connecting to \"HomeNet\" (attempt 2/2)");

        let e3 = sta.boot(Tick::new(3), NetworkLink::Absent);
        assert!(e3.is_empty());
        assert_eq!(sta.state(), PeripheralState::Ready);
        assert_eq!(sta.attempts(), 2);

        let ip = station_ip("HomeNet");
        let announce = sta.steady_state(Tick::new(3)).unwrap();
        assert_eq!(
            announce.message,
            format!("connected to \"HomeNet\", got IP {}", ip)
        );
        assert_eq!(sta.identity_contribution().ip_address, Some(ip));
    }

    #[test]
    fn test_sta_empty_ssid_fails() {
        let mut sta = sta("", 3);
        let events = sta.boot(Tick::new(1), NetworkLink::Absent);

        assert_eq!(sta.state(), PeripheralState::Failed);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].severity, Severity::Error);
        assert!(sta.steady_state(Tick::new(1)).is_none());
        assert!(sta.identity_contribution().is_empty());
    }

    #[test]
    fn test_station_ip_stable_and_in_range() {
        for ssid in ["a", "HomeNet", "ESP32_Comms_Hub", "x".repeat(32).as_str()] {
            let ip = station_ip(ssid);
            assert_eq!(ip, station_ip(ssid));
            let host: u32 = ip.rsplit('.').next().unwrap().parse().unwrap();
            assert!((2..=254).contains(&host), "{} out of range", ip);
            assert!(ip.starts_with("192.168.1."));
        }
    }
}
