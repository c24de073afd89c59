//! Validated feature descriptors.
//!
//! A [`FeatureDescriptor`] is only ever produced by [`crate::validate`], so every
//! value in it is in range and every omitted parameter has been filled with the
//! default a generated project would use.

use crate::params::{
    DEFAULT_AP_CHANNEL, DEFAULT_AP_MAX_CONNECTIONS, DEFAULT_BLE_DEVICE_NAME,
    DEFAULT_BLE_SERVICE_UUID, DEFAULT_HTTP_PORT, DEFAULT_HTTP_ROUTE, DEFAULT_MQTT_PORT,
    DEFAULT_STA_CONNECT_ATTEMPTS, DEFAULT_TCP_PORT,
};
use espsim_common::{Board, Capability};
use serde::Serialize;
use std::collections::BTreeMap;

// ============================================================================
// Capability Configurations
// ============================================================================

/// Soft access point configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WifiApConfig {
    /// Broadcast network name.
    pub ssid: String,
    /// WPA2 passphrase; empty for an open network. Checked, not simulated.
    pub password: String,
    /// 2.4 GHz channel.
    pub channel: u8,
    /// Maximum simultaneous clients. Checked, not simulated.
    pub max_connections: u8,
    /// Whether the SSID is hidden. Checked, not simulated.
    pub hidden: bool,
}

impl WifiApConfig {
    /// Defaults for an access point with the given SSID.
    pub fn with_ssid(ssid: impl Into<String>) -> Self {
        WifiApConfig {
            ssid: ssid.into(),
            password: String::new(),
            channel: DEFAULT_AP_CHANNEL,
            max_connections: DEFAULT_AP_MAX_CONNECTIONS,
            hidden: false,
        }
    }
}

/// WiFi station configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WifiStaConfig {
    /// Network to join. May be empty, in which case association fails.
    pub ssid: String,
    /// WPA2 passphrase. Checked, not simulated.
    pub password: String,
    /// Association attempts logged before the link comes up.
    pub connect_attempts: u32,
}

impl Default for WifiStaConfig {
    fn default() -> Self {
        WifiStaConfig {
            ssid: String::new(),
            password: String::new(),
            connect_attempts: DEFAULT_STA_CONNECT_ATTEMPTS,
        }
    }
}

/// TCP server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TcpServerConfig {
    /// Listening port.
    pub port: u16,
}

impl Default for TcpServerConfig {
    fn default() -> Self {
        TcpServerConfig {
            port: DEFAULT_TCP_PORT,
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HttpServerConfig {
    /// Listening port.
    pub port: u16,
    /// Registered request paths. Never empty.
    pub routes: Vec<String>,
}

impl HttpServerConfig {
    /// The path reported as the server root: `/` if routed, otherwise the first route.
    pub fn root_path(&self) -> &str {
        self.routes
            .iter()
            .find(|r| r.as_str() == "/")
            .or_else(|| self.routes.first())
            .map(String::as_str)
            .unwrap_or(DEFAULT_HTTP_ROUTE)
    }
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        HttpServerConfig {
            port: DEFAULT_HTTP_PORT,
            routes: vec![DEFAULT_HTTP_ROUTE.to_string()],
        }
    }
}

/// MQTT client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MqttClientConfig {
    /// Broker host; `None` leaves the client unable to connect.
    pub broker_host: Option<String>,
    /// Broker port.
    pub broker_port: u16,
    /// Client identifier.
    pub client_id: String,
}

impl MqttClientConfig {
    /// Defaults for a client with the given id and no broker.
    pub fn with_client_id(client_id: impl Into<String>) -> Self {
        MqttClientConfig {
            broker_host: None,
            broker_port: DEFAULT_MQTT_PORT,
            client_id: client_id.into(),
        }
    }
}

/// Bluetooth LE peripheral configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlePeripheralConfig {
    /// Advertised device name.
    pub device_name: String,
    /// Advertised primary service UUID (lowercase).
    pub service_uuid: String,
}

impl Default for BlePeripheralConfig {
    fn default() -> Self {
        BlePeripheralConfig {
            device_name: DEFAULT_BLE_DEVICE_NAME.to_string(),
            service_uuid: DEFAULT_BLE_SERVICE_UUID.to_string(),
        }
    }
}

/// Validated configuration of one capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "capability", rename_all = "snake_case")]
pub enum CapabilityConfig {
    /// `wifi_ap`
    WifiAp(WifiApConfig),
    /// `wifi_sta`
    WifiSta(WifiStaConfig),
    /// `tcp_server`
    TcpServer(TcpServerConfig),
    /// `http_server`
    HttpServer(HttpServerConfig),
    /// `mqtt_client`
    MqttClient(MqttClientConfig),
    /// `ble_peripheral`
    BlePeripheral(BlePeripheralConfig),
}

impl CapabilityConfig {
    /// The capability this configuration belongs to.
    pub fn capability(&self) -> Capability {
        match self {
            CapabilityConfig::WifiAp(_) => Capability::WifiAp,
            CapabilityConfig::WifiSta(_) => Capability::WifiSta,
            CapabilityConfig::TcpServer(_) => Capability::TcpServer,
            CapabilityConfig::HttpServer(_) => Capability::HttpServer,
            CapabilityConfig::MqttClient(_) => Capability::MqttClient,
            CapabilityConfig::BlePeripheral(_) => Capability::BlePeripheral,
        }
    }
}

// ============================================================================
// Feature Descriptor
// ============================================================================

/// A validated, normalized description of what a project declares.
///
/// Immutable once built. Capabilities are keyed by [`Capability`], so iteration
/// is always in canonical order regardless of the order they were requested in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureDescriptor {
    project_name: String,
    board: Board,
    capabilities: BTreeMap<Capability, CapabilityConfig>,
}

impl FeatureDescriptor {
    pub(crate) fn new(
        project_name: String,
        board: Board,
        capabilities: BTreeMap<Capability, CapabilityConfig>,
    ) -> Self {
        debug_assert!(!capabilities.is_empty());
        FeatureDescriptor {
            project_name,
            board,
            capabilities,
        }
    }

    /// Trimmed project name.
    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// Target board.
    pub fn board(&self) -> Board {
        self.board
    }

    /// Requested capabilities in canonical order.
    pub fn capabilities(&self) -> impl Iterator<Item = Capability> + '_ {
        self.capabilities.keys().copied()
    }

    /// Capability configurations in canonical order.
    pub fn configs(&self) -> impl Iterator<Item = &CapabilityConfig> + '_ {
        self.capabilities.values()
    }

    /// Configuration of one capability, if requested.
    pub fn config(&self, capability: Capability) -> Option<&CapabilityConfig> {
        self.capabilities.get(&capability)
    }

    /// Whether a capability was requested.
    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains_key(&capability)
    }

    /// Number of requested capabilities.
    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    /// Always false for a validated descriptor.
    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}

/// Directory-style slug of a project name: spaces become `_`, all lowercase.
pub fn project_slug(project_name: &str) -> String {
    project_name.trim().replace(' ', "_").to_lowercase()
}
