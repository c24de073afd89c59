//! # espsim-common
//!
//! Common types for the ESP32 project simulator.
//!
//! This crate provides the vocabulary shared by every other crate in the workspace:
//! - Target hardware ([`Board`])
//! - The closed capability set and its canonical order ([`Capability`])
//! - Simulation time ([`Tick`])
//! - Log events ([`SimulationEvent`], [`Severity`])
//! - Peripheral lifecycle ([`PeripheralState`])
//! - Network identity ([`IdentityContribution`], [`DeviceIdentity`])

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors produced when parsing vocabulary names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VocabularyError {
    /// The board identifier is not one of the supported chips.
    #[error("Unknown board type: {0}")]
    UnknownBoard(String),

    /// The capability name is not part of the capability vocabulary.
    #[error("Unknown capability: {0}")]
    UnknownCapability(String),
}

// ============================================================================
// Board Types
// ============================================================================

/// Supported ESP32 chip families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Board {
    /// Original dual-core ESP32.
    Esp32,
    /// ESP32-S2 (WiFi only, no Bluetooth).
    Esp32S2,
    /// ESP32-S3.
    Esp32S3,
    /// ESP32-C3 (RISC-V).
    Esp32C3,
    /// ESP32-C6 (RISC-V, WiFi 6).
    Esp32C6,
}

impl Board {
    /// All boards, in declaration order.
    pub const ALL: [Board; 5] = [
        Board::Esp32,
        Board::Esp32S2,
        Board::Esp32S3,
        Board::Esp32C3,
        Board::Esp32C6,
    ];

    /// The display name echoed back in simulation reports.
    pub const fn display_name(&self) -> &'static str {
        match self {
            Board::Esp32 => "ESP32",
            Board::Esp32S2 => "ESP32-S2",
            Board::Esp32S3 => "ESP32-S3",
            Board::Esp32C3 => "ESP32-C3",
            Board::Esp32C6 => "ESP32-C6",
        }
    }

    /// Whether the chip has a Bluetooth LE controller.
    pub const fn has_bluetooth(&self) -> bool {
        !matches!(self, Board::Esp32S2)
    }

    /// Spellings accepted by [`Board::from_str`], for error messages.
    pub const ACCEPTED_NAMES: &'static [&'static str] = &[
        "esp32", "esp32s2", "esp32-s2", "s2", "esp32s3", "esp32-s3", "s3", "esp32c3", "esp32-c3",
        "c3", "esp32c6", "esp32-c6", "c6",
    ];
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Board {
    type Err = VocabularyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "esp32" => Ok(Board::Esp32),
            "esp32s2" | "esp32-s2" | "s2" => Ok(Board::Esp32S2),
            "esp32s3" | "esp32-s3" | "s3" => Ok(Board::Esp32S3),
            "esp32c3" | "esp32-c3" | "c3" => Ok(Board::Esp32C3),
            "esp32c6" | "esp32-c6" | "c6" => Ok(Board::Esp32C6),
            _ => Err(VocabularyError::UnknownBoard(s.to_string())),
        }
    }
}

// ============================================================================
// Capability Vocabulary
// ============================================================================

/// One declared firmware feature.
///
/// The declaration order of the variants is the canonical evaluation order used
/// by the scheduler and by the identity merge. `Ord` is derived from it, so
/// sorted collections of capabilities are always in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// WiFi soft access point.
    WifiAp,
    /// WiFi station (client) mode.
    WifiSta,
    /// Raw TCP server.
    TcpServer,
    /// HTTP web server.
    HttpServer,
    /// MQTT client.
    MqttClient,
    /// Bluetooth LE peripheral (advertiser).
    BlePeripheral,
}

impl Capability {
    /// All capabilities in canonical order.
    pub const ALL: [Capability; 6] = [
        Capability::WifiAp,
        Capability::WifiSta,
        Capability::TcpServer,
        Capability::HttpServer,
        Capability::MqttClient,
        Capability::BlePeripheral,
    ];

    /// The wire name of the capability.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Capability::WifiAp => "wifi_ap",
            Capability::WifiSta => "wifi_sta",
            Capability::TcpServer => "tcp_server",
            Capability::HttpServer => "http_server",
            Capability::MqttClient => "mqtt_client",
            Capability::BlePeripheral => "ble_peripheral",
        }
    }

    /// Whether this capability is a WiFi radio mode.
    pub const fn is_radio(&self) -> bool {
        matches!(self, Capability::WifiAp | Capability::WifiSta)
    }

    /// Whether this capability needs an IP network to come up.
    pub const fn needs_network(&self) -> bool {
        matches!(
            self,
            Capability::TcpServer | Capability::HttpServer | Capability::MqttClient
        )
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = VocabularyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| VocabularyError::UnknownCapability(s.to_string()))
    }
}

// ============================================================================
// Time Types
// ============================================================================

/// Discrete simulation tick. The first executed tick is tick 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Tick(u32);

impl Tick {
    /// Before the first tick.
    pub const ZERO: Tick = Tick(0);

    /// Create a tick from its number.
    pub const fn new(n: u32) -> Self {
        Tick(n)
    }

    /// Get the tick number.
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// The following tick.
    pub const fn next(&self) -> Tick {
        Tick(self.0 + 1)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Event Types
// ============================================================================

/// Severity of a simulation log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Progress information.
    Info,
    /// A subsystem came up.
    Success,
    /// Non-fatal problem; the subsystem did not come up.
    Warning,
    /// The subsystem failed.
    Error,
}

impl Severity {
    /// Lowercase name, used as a metric label.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in a device session's event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationEvent {
    /// Tick during which the event was emitted.
    pub tick: Tick,
    /// Peripheral that emitted the event.
    pub source: Capability,
    /// Severity of the event.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
}

impl SimulationEvent {
    /// Create a new event.
    pub fn new(tick: Tick, source: Capability, severity: Severity, message: impl Into<String>) -> Self {
        SimulationEvent {
            tick,
            source,
            severity,
            message: message.into(),
        }
    }

    /// Create an info event.
    pub fn info(tick: Tick, source: Capability, message: impl Into<String>) -> Self {
        Self::new(tick, source, Severity::Info, message)
    }

    /// Create a success event.
    pub fn success(tick: Tick, source: Capability, message: impl Into<String>) -> Self {
        Self::new(tick, source, Severity::Success, message)
    }

    /// Create a warning event.
    pub fn warning(tick: Tick, source: Capability, message: impl Into<String>) -> Self {
        Self::new(tick, source, Severity::Warning, message)
    }

    /// Create an error event.
    pub fn error(tick: Tick, source: Capability, message: impl Into<String>) -> Self {
        Self::new(tick, source, Severity::Error, message)
    }
}

/// Renders as `[<tick>] <capability>: <message>`.
impl fmt::Display for SimulationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.tick, self.source, self.message)
    }
}

// ============================================================================
// Peripheral Lifecycle
// ============================================================================

/// Lifecycle state shared by all virtual peripherals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeripheralState {
    /// Not yet advanced.
    Uninitialized,
    /// Boot in progress, or stalled waiting on something that will not arrive.
    Initializing,
    /// Booted. Terminal.
    Ready,
    /// Boot failed. Terminal.
    Failed,
}

impl PeripheralState {
    /// Whether the scheduler must stop advancing a peripheral in this state.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, PeripheralState::Ready | PeripheralState::Failed)
    }

    /// Lowercase name, used as a metric label.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PeripheralState::Uninitialized => "uninitialized",
            PeripheralState::Initializing => "initializing",
            PeripheralState::Ready => "ready",
            PeripheralState::Failed => "failed",
        }
    }
}

impl fmt::Display for PeripheralState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Identity Types
// ============================================================================

/// Identity fields a single peripheral supplies once it is `Ready`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityContribution {
    /// IPv4 address of the device.
    pub ip_address: Option<String>,
    /// SSID of the soft access point.
    pub ap_ssid: Option<String>,
    /// Whether an HTTP server is running.
    pub web_server: Option<bool>,
    /// Short description of the listening server.
    pub server_banner: Option<String>,
}

impl IdentityContribution {
    /// A contribution with no fields set.
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        self.ip_address.is_none()
            && self.ap_ssid.is_none()
            && self.web_server.is_none()
            && self.server_banner.is_none()
    }
}

/// The externally reported identity of a simulated device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// IPv4 address of the device.
    pub ip_address: Option<String>,
    /// SSID of the soft access point.
    pub ap_ssid: Option<String>,
    /// Whether an HTTP server is running.
    pub web_server: Option<bool>,
    /// Short description of the listening server.
    pub server_banner: Option<String>,
}

impl DeviceIdentity {
    /// Merge a contribution into this identity.
    ///
    /// First writer wins: a field that is already set is never overwritten.
    /// Callers merge in canonical capability order, so a radio's address always
    /// takes priority over anything a later peripheral offers.
    pub fn merge(&mut self, contribution: IdentityContribution) {
        fn first_wins<T>(slot: &mut Option<T>, value: Option<T>) {
            if slot.is_none() {
                *slot = value;
            }
        }

        first_wins(&mut self.ip_address, contribution.ip_address);
        first_wins(&mut self.ap_ssid, contribution.ap_ssid);
        first_wins(&mut self.web_server, contribution.web_server);
        first_wins(&mut self.server_banner, contribution.server_banner);
    }
}
