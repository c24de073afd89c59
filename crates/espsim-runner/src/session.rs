//! Device sessions.
//!
//! A [`DeviceSession`] is one simulated board: the peripherals built from a
//! validated descriptor, the tick counter, and the append-only event log. It is
//! owned by a single run and never shared.

use espsim_common::{
    Board, DeviceIdentity, PeripheralState, SimulationEvent, Tick,
};
use espsim_model::FeatureDescriptor;
use espsim_peripherals::{NetworkLink, Peripheral, VirtualPeripheral};
use sha2::{Digest, Sha256};
use std::fmt;
use tracing::{debug, warn};

/// Bytes of the descriptor hash kept in a session id.
const SESSION_ID_BYTES: usize = 8;

/// Stable identifier of a session, derived from its descriptor.
///
/// Two sessions built from equal descriptors get the same id, which makes log
/// lines from repeated runs easy to correlate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    fn for_descriptor(descriptor: &FeatureDescriptor) -> Self {
        let mut hasher = Sha256::new();
        if let Err(err) = serde_json::to_writer(&mut hasher, descriptor) {
            warn!(%err, "descriptor could not be serialized for the session id");
        }
        let digest = hasher.finalize();
        SessionId(hex::encode(&digest[..SESSION_ID_BYTES]))
    }

    /// The id as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Device Session
// ============================================================================

/// One simulated device.
#[derive(Debug, Clone)]
pub struct DeviceSession {
    id: SessionId,
    descriptor: FeatureDescriptor,
    /// One peripheral per capability, in canonical order.
    peripherals: Vec<VirtualPeripheral>,
    /// Ticks executed so far.
    ticks: Tick,
    events: Vec<SimulationEvent>,
    identity: DeviceIdentity,
}

impl DeviceSession {
    /// Build a session with one uninitialized peripheral per capability.
    pub fn new(descriptor: FeatureDescriptor) -> Self {
        let peripherals: Vec<_> = descriptor
            .configs()
            .map(VirtualPeripheral::from_config)
            .collect();
        let id = SessionId::for_descriptor(&descriptor);
        debug!(
            session = %id,
            board = %descriptor.board(),
            peripherals = peripherals.len(),
            "created device session"
        );
        DeviceSession {
            id,
            descriptor,
            peripherals,
            ticks: Tick::ZERO,
            events: Vec::new(),
            identity: DeviceIdentity::default(),
        }
    }

    /// Session id.
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// The descriptor this session was built from.
    pub fn descriptor(&self) -> &FeatureDescriptor {
        &self.descriptor
    }

    /// Target board.
    pub fn board(&self) -> Board {
        self.descriptor.board()
    }

    /// Peripherals in canonical order.
    pub fn peripherals(&self) -> &[VirtualPeripheral] {
        &self.peripherals
    }

    /// Event log in emission order.
    pub fn events(&self) -> &[SimulationEvent] {
        &self.events
    }

    /// Number of ticks executed.
    pub fn ticks_run(&self) -> u32 {
        self.ticks.get()
    }

    /// Device identity. Empty until the run has finished.
    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// Whether every peripheral is `Ready` or `Failed`.
    pub fn all_terminal(&self) -> bool {
        self.peripherals.iter().all(|p| p.state().is_terminal())
    }

    /// Whether every peripheral is `Ready`.
    pub fn all_ready(&self) -> bool {
        self.peripherals
            .iter()
            .all(|p| p.state() == PeripheralState::Ready)
    }

    /// The link network-bound peripherals see right now.
    fn network_link(&self) -> NetworkLink {
        let radio = self
            .peripherals
            .iter()
            .find(|p| p.capability().is_radio())
            .map(|p| p.state());
        NetworkLink::from_radio(radio)
    }

    /// Execute one tick: advance every non-terminal peripheral once, in order.
    ///
    /// Each peripheral's events are appended before the next one runs, and the
    /// link is re-read before every advance, so a radio that comes up early in
    /// the tick is visible to the servers after it.
    pub(crate) fn step(&mut self) {
        let tick = self.ticks.next();
        for index in 0..self.peripherals.len() {
            if self.peripherals[index].state().is_terminal() {
                continue;
            }
            let link = self.network_link();
            let events = self.peripherals[index].advance(tick, link);
            self.events.extend(events);
        }
        self.ticks = tick;
        debug!(session = %self.id, tick = tick.get(), events = self.events.len(), "tick complete");
    }

    /// Derive the device identity from the `Ready` peripherals.
    ///
    /// Contributions are merged in canonical order, first writer wins per field.
    pub(crate) fn finish(&mut self) {
        let mut identity = DeviceIdentity::default();
        for peripheral in &self.peripherals {
            if peripheral.state() == PeripheralState::Ready {
                identity.merge(peripheral.identity_contribution());
            }
        }
        self.identity = identity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use espsim_common::Capability;
    use espsim_model::{validate, FeatureRequest, SimulateRequest};

    fn descriptor(features: &[FeatureRequest]) -> FeatureDescriptor {
        validate(&SimulateRequest::new("Session Test"), features).unwrap()
    }

    #[test]
    fn test_one_peripheral_per_capability_in_canonical_order() {
        let session = DeviceSession::new(descriptor(&[
            FeatureRequest::named("ble_peripheral"),
            FeatureRequest::named("http_server"),
            FeatureRequest::named("wifi_ap"),
        ]));

        let caps: Vec<_> = session.peripherals().iter().map(|p| p.capability()).collect();
        assert_eq!(
            caps,
            vec![Capability::WifiAp, Capability::HttpServer, Capability::BlePeripheral]
        );
        assert!(session.peripherals().iter().all(|p| p.state() == PeripheralState::Uninitialized));
        assert_eq!(session.ticks_run(), 0);
        assert!(session.events().is_empty());
    }

    #[test]
    fn test_session_id_depends_only_on_descriptor() {
        let a = DeviceSession::new(descriptor(&[
            FeatureRequest::named("wifi_ap"),
            FeatureRequest::named("tcp_server"),
        ]));
        let b = DeviceSession::new(descriptor(&[
            FeatureRequest::named("tcp_server"),
            FeatureRequest::named("wifi_ap"),
        ]));
        let c = DeviceSession::new(descriptor(&[FeatureRequest::named("wifi_ap")]));

        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
        assert_eq!(a.id().as_str().len(), SESSION_ID_BYTES * 2);
    }

    #[test]
    fn test_radio_visible_to_servers_within_the_same_tick() {
        let mut session = DeviceSession::new(descriptor(&[
            FeatureRequest::named("wifi_ap"),
            FeatureRequest::named("tcp_server"),
        ]));
        session.step();

        let messages: Vec<_> = session.events().iter().map(|e| e.to_string()).collect();
        assert_eq!(
            messages,
            vec![
                "[1] wifi_ap: starting soft-AP \"session_test_AP\" on channel 1",
                "[1] wifi_ap: access point up at 192.168.4.1",
                "[1] tcp_server: binding port 8080",
            ]
        );
        assert_eq!(session.ticks_run(), 1);
    }

    #[test]
    fn test_identity_empty_until_finished() {
        let mut session = DeviceSession::new(descriptor(&[FeatureRequest::named("wifi_ap")]));
        session.step();
        assert_eq!(session.identity(), &DeviceIdentity::default());

        session.finish();
        assert_eq!(session.identity().ip_address.as_deref(), Some("192.168.4.1"));
        assert_eq!(session.identity().ap_ssid.as_deref(), Some("session_test_AP"));
    }

    #[test]
    fn test_identity_ignores_peripherals_that_are_not_ready() {
        let mut session = DeviceSession::new(descriptor(&[FeatureRequest::named("tcp_server")]));
        for _ in 0..5 {
            session.step();
        }
        session.finish();
        assert!(session.identity().server_banner.is_none());
        assert!(!session.all_terminal());
    }
}
