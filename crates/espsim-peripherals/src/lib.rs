//! # espsim-peripherals
//!
//! Virtual peripherals for the ESP32 project simulator.
//!
//! Each requested capability is backed by one small state machine. The
//! scheduler advances them one tick at a time; each advance returns the events
//! the peripheral logged during that tick.
//!
//! ## Components
//!
//! - [`WifiAp`] / [`WifiSta`]: the two radio modes
//! - [`TcpServer`] / [`HttpServer`]: servers that need the radio's network
//! - [`MqttClient`]: broker client, also network-bound
//! - [`BlePeripheral`]: BLE advertiser with no network dependency
//! - [`VirtualPeripheral`]: closed set of all of the above
//!
//! ## Usage
//!
//! ```rust,ignore
//! use espsim_peripherals::{NetworkLink, VirtualPeripheral};
//!
//! let mut tcp = VirtualPeripheral::from_config(config);
//! let events = tcp.advance(Tick::new(1), NetworkLink::Up);
//! ```

mod ble;
mod mqtt;
mod server;
mod wifi;

pub use ble::BlePeripheral;
pub use mqtt::{BrokerConnection, MqttClient};
pub use server::{HttpServer, HttpServerPhase, ListenerState, TcpServer};
pub use wifi::{station_ip, WifiAp, WifiSta, AP_IP_ADDRESS};

use espsim_common::{Capability, IdentityContribution, PeripheralState, SimulationEvent, Tick};
use espsim_model::CapabilityConfig;

/// Warning logged by a network-bound peripheral that has no usable radio.
pub const NO_NETWORK_MESSAGE: &str = "no network interface available";

// ============================================================================
// Network Link
// ============================================================================

/// State of the device's IP link as seen by network-bound peripherals.
///
/// Derived from the radio peripheral at the moment a dependent peripheral is
/// advanced. The radio always runs first within a tick, so dependents see the
/// radio's state after its own advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkLink {
    /// No radio capability was requested.
    Absent,
    /// The radio is still coming up.
    Pending,
    /// The radio is `Ready`.
    Up,
    /// The radio `Failed`.
    Down,
}

impl NetworkLink {
    /// Link state implied by the radio's state, or `None` if there is no radio.
    pub fn from_radio(radio: Option<PeripheralState>) -> Self {
        match radio {
            None => NetworkLink::Absent,
            Some(PeripheralState::Ready) => NetworkLink::Up,
            Some(PeripheralState::Failed) => NetworkLink::Down,
            Some(PeripheralState::Uninitialized | PeripheralState::Initializing) => {
                NetworkLink::Pending
            }
        }
    }

    /// Whether the link can never come up.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, NetworkLink::Absent | NetworkLink::Down)
    }
}

// ============================================================================
// Peripheral Trait
// ============================================================================

/// Common interface of every virtual peripheral.
pub trait Peripheral {
    /// The capability this peripheral implements.
    fn capability(&self) -> Capability;

    /// Current lifecycle state.
    fn state(&self) -> PeripheralState;

    /// Run one step of the boot sequence and return the events it logged.
    fn boot(&mut self, tick: Tick, link: NetworkLink) -> Vec<SimulationEvent>;

    /// The announcement a `Ready` peripheral makes, if it has one.
    ///
    /// Read-only. The scheduler emits it once, on the tick the peripheral
    /// becomes `Ready`.
    fn steady_state(&self, tick: Tick) -> Option<SimulationEvent>;

    /// Identity fields this peripheral supplies. Only consulted once `Ready`.
    fn identity_contribution(&self) -> IdentityContribution;
}

// ============================================================================
// Virtual Peripheral
// ============================================================================

/// One virtual peripheral of any capability.
#[derive(Debug, Clone)]
pub enum VirtualPeripheral {
    /// Soft access point.
    WifiAp(WifiAp),
    /// WiFi station.
    WifiSta(WifiSta),
    /// Raw TCP server.
    TcpServer(TcpServer),
    /// HTTP server.
    HttpServer(HttpServer),
    /// MQTT client.
    MqttClient(MqttClient),
    /// BLE advertiser.
    BlePeripheral(BlePeripheral),
}

impl VirtualPeripheral {
    /// Build an uninitialized peripheral from its validated configuration.
    pub fn from_config(config: &CapabilityConfig) -> Self {
        match config {
            CapabilityConfig::WifiAp(c) => VirtualPeripheral::WifiAp(WifiAp::new(c.clone())),
            CapabilityConfig::WifiSta(c) => VirtualPeripheral::WifiSta(WifiSta::new(c.clone())),
            CapabilityConfig::TcpServer(c) => {
                VirtualPeripheral::TcpServer(TcpServer::new(c.clone()))
            }
            CapabilityConfig::HttpServer(c) => {
                VirtualPeripheral::HttpServer(HttpServer::new(c.clone()))
            }
            CapabilityConfig::MqttClient(c) => {
                VirtualPeripheral::MqttClient(MqttClient::new(c.clone()))
            }
            CapabilityConfig::BlePeripheral(c) => {
                VirtualPeripheral::BlePeripheral(BlePeripheral::new(c.clone()))
            }
        }
    }

    fn inner(&self) -> &dyn Peripheral {
        match self {
            VirtualPeripheral::WifiAp(p) => p,
            VirtualPeripheral::WifiSta(p) => p,
            VirtualPeripheral::TcpServer(p) => p,
            VirtualPeripheral::HttpServer(p) => p,
            VirtualPeripheral::MqttClient(p) => p,
            VirtualPeripheral::BlePeripheral(p) => p,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Peripheral {
        match self {
            VirtualPeripheral::WifiAp(p) => p,
            VirtualPeripheral::WifiSta(p) => p,
            VirtualPeripheral::TcpServer(p) => p,
            VirtualPeripheral::HttpServer(p) => p,
            VirtualPeripheral::MqttClient(p) => p,
            VirtualPeripheral::BlePeripheral(p) => p,
        }
    }

    /// Advance the peripheral by one tick.
    ///
    /// Returns the boot events of this tick, followed by the steady-state
    /// announcement if the peripheral became `Ready`.
    ///
    /// # Panics
    ///
    /// Panics if the peripheral is already terminal. The scheduler never
    /// advances a `Ready` or `Failed` peripheral.
    pub fn advance(&mut self, tick: Tick, link: NetworkLink) -> Vec<SimulationEvent> {
        let before = self.state();
        assert!(
            !before.is_terminal(),
            "{} advanced at tick {} after reaching {}",
            self.capability(),
            tick,
            before
        );

        let mut events = self.inner_mut().boot(tick, link);
        let after = self.state();
        if after != before {
            tracing::debug!(
                capability = %self.capability(),
                tick = tick.get(),
                from = %before,
                to = %after,
                "peripheral state changed"
            );
        }
        if after == PeripheralState::Ready {
            events.extend(self.steady_state(tick));
        }
        events
    }
}

impl Peripheral for VirtualPeripheral {
    fn capability(&self) -> Capability {
        self.inner().capability()
    }

    fn state(&self) -> PeripheralState {
        self.inner().state()
    }

    fn boot(&mut self, tick: Tick, link: NetworkLink) -> Vec<SimulationEvent> {
        self.inner_mut().boot(tick, link)
    }

    fn steady_state(&self, tick: Tick) -> Option<SimulationEvent> {
        self.inner().steady_state(tick)
    }

    fn identity_contribution(&self) -> IdentityContribution {
        self.inner().identity_contribution()
    }
}
