//! Per-capability parameter schemas.
//!
//! Each capability accepts a fixed set of parameters. The tables here are the
//! single source of truth for which keys exist, what type they take, and what a
//! generated project uses when the key is omitted. The validator rejects keys
//! that are not listed, and `espsim capabilities` prints the tables.

use espsim_common::Capability;
use serde::Serialize;

// ============================================================================
// Default Values
// ============================================================================

/// Default soft-AP channel.
pub const DEFAULT_AP_CHANNEL: u8 = 1;
/// Default soft-AP client limit (ESP-IDF default).
pub const DEFAULT_AP_MAX_CONNECTIONS: u8 = 4;
/// Suffix appended to the project slug to form the default AP SSID.
pub const DEFAULT_AP_SSID_SUFFIX: &str = "_AP";
/// Default number of association attempts logged before a station connects.
pub const DEFAULT_STA_CONNECT_ATTEMPTS: u32 = 3;
/// Default TCP server port.
pub const DEFAULT_TCP_PORT: u16 = 8080;
/// Default HTTP server port.
pub const DEFAULT_HTTP_PORT: u16 = 80;
/// Default HTTP route.
pub const DEFAULT_HTTP_ROUTE: &str = "/";
/// Default MQTT broker port.
pub const DEFAULT_MQTT_PORT: u16 = 1883;
/// Prefix of the default MQTT client id.
pub const DEFAULT_MQTT_CLIENT_PREFIX: &str = "esp32-";
/// Default BLE device name.
pub const DEFAULT_BLE_DEVICE_NAME: &str = "ESP32";
/// Default BLE service UUID (the one used by the Arduino-ESP32 BLE examples).
pub const DEFAULT_BLE_SERVICE_UUID: &str = "4fafc201-1fb5-459e-8fcc-c5c9c331914b";

// ============================================================================
// Limits
// ============================================================================

/// Maximum SSID length in bytes (802.11).
pub const MAX_SSID_LEN: usize = 32;
/// Minimum non-empty WPA2 passphrase length.
pub const MIN_PASSWORD_LEN: usize = 8;
/// Maximum WPA2 passphrase length.
pub const MAX_PASSWORD_LEN: usize = 64;
/// Highest 2.4 GHz channel accepted for the soft AP.
pub const MAX_AP_CHANNEL: i64 = 13;
/// Highest soft-AP client limit.
pub const MAX_AP_CONNECTIONS: i64 = 10;
/// Highest configurable number of station association attempts.
pub const MAX_STA_CONNECT_ATTEMPTS: i64 = 10;
/// Maximum DNS host name length.
pub const MAX_HOST_LEN: usize = 253;
/// Maximum MQTT 3.1 client id length.
pub const MAX_CLIENT_ID_LEN: usize = 23;
/// Maximum BLE advertised name length that fits in one advertising packet.
pub const MAX_BLE_NAME_LEN: usize = 29;

// ============================================================================
// Schema Types
// ============================================================================

/// The type a parameter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    /// Integer value.
    Integer,
    /// String value.
    String,
    /// Boolean value.
    Bool,
    /// List of strings.
    StringList,
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamType::Integer => write!(f, "integer"),
            ParamType::String => write!(f, "string"),
            ParamType::Bool => write!(f, "bool"),
            ParamType::StringList => write!(f, "list<string>"),
        }
    }
}

/// Schema entry for one parameter.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ParamDef {
    /// Parameter key as it appears in requests.
    pub key: &'static str,
    /// Accepted type.
    #[serde(rename = "type")]
    pub kind: ParamType,
    /// Accepted values.
    pub rule: &'static str,
    /// What an omitted parameter becomes.
    pub default: &'static str,
    /// Human-readable description.
    pub description: &'static str,
}

impl ParamDef {
    const fn new(key: &'static str, kind: ParamType) -> Self {
        Self {
            key,
            kind,
            rule: "",
            default: "",
            description: "",
        }
    }

    const fn with_rule(mut self, rule: &'static str) -> Self {
        self.rule = rule;
        self
    }

    const fn with_default(mut self, default: &'static str) -> Self {
        self.default = default;
        self
    }

    const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }
}

// ============================================================================
// Schema Tables
// ============================================================================

const WIFI_AP_PARAMS: &[ParamDef] = &[
    ParamDef::new("ssid", ParamType::String)
        .with_rule("1-32 bytes")
        .with_default("<project_slug>_AP")
        .with_description("Network name broadcast by the soft AP"),
    ParamDef::new("password", ParamType::String)
        .with_rule("empty or 8-64 characters")
        .with_default("\"\" (open network)")
        .with_description("WPA2 passphrase (validated only; clients are not simulated)"),
    ParamDef::new("channel", ParamType::Integer)
        .with_rule("1-13")
        .with_default("1")
        .with_description("2.4 GHz channel"),
    ParamDef::new("max_connections", ParamType::Integer)
        .with_rule("1-10")
        .with_default("4")
        .with_description("Maximum simultaneous clients (validated only; clients are not simulated)"),
    ParamDef::new("hidden", ParamType::Bool)
        .with_default("false")
        .with_description("Suppress the SSID in beacons (validated only; beacons are not simulated)"),
];

const WIFI_STA_PARAMS: &[ParamDef] = &[
    ParamDef::new("ssid", ParamType::String)
        .with_rule("0-32 bytes")
        .with_default("\"\"")
        .with_description("Network to join; empty fails at association"),
    ParamDef::new("password", ParamType::String)
        .with_rule("empty or 8-64 characters")
        .with_default("\"\"")
        .with_description("WPA2 passphrase (validated only; association always succeeds)"),
    ParamDef::new("connect_attempts", ParamType::Integer)
        .with_rule("1-10")
        .with_default("3")
        .with_description("Association attempts logged before the link comes up"),
];

const TCP_SERVER_PARAMS: &[ParamDef] = &[ParamDef::new("port", ParamType::Integer)
    .with_rule("1-65535")
    .with_default("8080")
    .with_description("Listening port")];

const HTTP_SERVER_PARAMS: &[ParamDef] = &[
    ParamDef::new("port", ParamType::Integer)
        .with_rule("1-65535")
        .with_default("80")
        .with_description("Listening port"),
    ParamDef::new("routes", ParamType::StringList)
        .with_rule("non-empty, each starting with '/'")
        .with_default("[\"/\"]")
        .with_description("Registered request paths"),
];

const MQTT_CLIENT_PARAMS: &[ParamDef] = &[
    ParamDef::new("broker_host", ParamType::String)
        .with_rule("1-253 bytes")
        .with_default("none (client stalls)")
        .with_description("Broker host name or address"),
    ParamDef::new("broker_port", ParamType::Integer)
        .with_rule("1-65535")
        .with_default("1883")
        .with_description("Broker port"),
    ParamDef::new("client_id", ParamType::String)
        .with_rule("1-23 bytes")
        .with_default("esp32-<project_slug>")
        .with_description("MQTT client identifier"),
];

const BLE_PERIPHERAL_PARAMS: &[ParamDef] = &[
    ParamDef::new("device_name", ParamType::String)
        .with_rule("1-29 bytes")
        .with_default("ESP32")
        .with_description("Advertised device name"),
    ParamDef::new("service_uuid", ParamType::String)
        .with_rule("16-bit (4 hex digits) or 128-bit UUID")
        .with_default(DEFAULT_BLE_SERVICE_UUID)
        .with_description("Advertised primary service"),
];

/// The parameter schema of a capability.
pub fn schema(capability: Capability) -> &'static [ParamDef] {
    match capability {
        Capability::WifiAp => WIFI_AP_PARAMS,
        Capability::WifiSta => WIFI_STA_PARAMS,
        Capability::TcpServer => TCP_SERVER_PARAMS,
        Capability::HttpServer => HTTP_SERVER_PARAMS,
        Capability::MqttClient => MQTT_CLIENT_PARAMS,
        Capability::BlePeripheral => BLE_PERIPHERAL_PARAMS,
    }
}

/// Look up one parameter of a capability.
pub fn param_def(capability: Capability, key: &str) -> Option<&'static ParamDef> {
    schema(capability).iter().find(|def| def.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_capability_has_schema() {
        for cap in Capability::ALL {
            assert!(!schema(cap).is_empty(), "{} has no parameters", cap);
        }
    }

    #[test]
    fn test_keys_unique_per_capability() {
        for cap in Capability::ALL {
            let defs = schema(cap);
            for (i, a) in defs.iter().enumerate() {
                for b in &defs[i + 1..] {
                    assert_ne!(a.key, b.key, "duplicate key in {}", cap);
                }
            }
        }
    }

    #[test]
    fn test_unsimulated_params_say_so() {
        for (cap, key) in [
            (Capability::WifiAp, "password"),
            (Capability::WifiAp, "max_connections"),
            (Capability::WifiAp, "hidden"),
            (Capability::WifiSta, "password"),
        ] {
            let def = param_def(cap, key).unwrap();
            assert!(def.description.contains("validated only"), "{}.{}", cap, key);
        }
    }

    #[test]
    fn test_param_lookup() {
        assert_eq!(param_def(Capability::TcpServer, "port").unwrap().kind, ParamType::Integer);
        assert!(param_def(Capability::TcpServer, "routes").is_none());
    }
}
