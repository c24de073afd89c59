//! Request validation.
//!
//! [`validate`] turns a raw [`SimulateRequest`] plus its feature list into a
//! [`FeatureDescriptor`]. It is a pure function: it never looks anything up and
//! never touches the outside world. Checks run in a fixed order and the first
//! failure is returned.

use crate::descriptor::{
    project_slug, BlePeripheralConfig, CapabilityConfig, FeatureDescriptor, HttpServerConfig,
    MqttClientConfig, TcpServerConfig, WifiApConfig, WifiStaConfig,
};
use crate::error::ValidationError;
use crate::params::{
    param_def, ParamValue, DEFAULT_AP_SSID_SUFFIX, DEFAULT_MQTT_CLIENT_PREFIX, MAX_AP_CHANNEL,
    MAX_AP_CONNECTIONS, MAX_BLE_NAME_LEN, MAX_CLIENT_ID_LEN, MAX_HOST_LEN, MAX_PASSWORD_LEN,
    MAX_SSID_LEN, MAX_STA_CONNECT_ATTEMPTS, MIN_PASSWORD_LEN,
};
use crate::request::{FeatureRequest, SimulateRequest};
use espsim_common::{Board, Capability};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;
use tracing::debug;

/// Maximum project name length.
pub const MAX_PROJECT_NAME_LEN: usize = 100;

const PORT_RANGE: RangeInclusive<i64> = 1..=65535;

static EMPTY_PARAMS: BTreeMap<String, ParamValue> = BTreeMap::new();

impl SimulateRequest {
    /// Validate a request that carries its features inline.
    pub fn validate(&self) -> Result<FeatureDescriptor, ValidationError> {
        match &self.features {
            Some(features) => validate(self, features),
            None => Err(ValidationError::invalid_field(
                "features",
                "no features supplied for the project",
            )),
        }
    }
}

/// Validate a request against a feature list and build the descriptor.
///
/// `features` is passed separately so callers can supply a list resolved from
/// elsewhere (the project catalog) when the request has none inline; any inline
/// list on `request` is ignored.
pub fn validate(
    request: &SimulateRequest,
    features: &[FeatureRequest],
) -> Result<FeatureDescriptor, ValidationError> {
    let project_name = validate_project_name(&request.project_name)?;
    let board: Board = request.board_name().parse().map_err(|_| {
        ValidationError::invalid_field(
            "board_type",
            format!(
                "unknown board '{}', expected one of: {}",
                request.board_name(),
                Board::ACCEPTED_NAMES.join(", ")
            ),
        )
    })?;

    if features.is_empty() {
        return Err(ValidationError::invalid_field(
            "features",
            "at least one capability is required",
        ));
    }

    // Resolve names first so an unknown capability is reported before any
    // cross-capability or parameter problem.
    let mut resolved: Vec<(Capability, &BTreeMap<String, ParamValue>)> =
        Vec::with_capacity(features.len());
    for feature in features {
        let capability: Capability = feature
            .name()
            .parse()
            .map_err(|_| ValidationError::UnknownCapability(feature.name().to_string()))?;
        resolved.push((capability, feature.params().unwrap_or(&EMPTY_PARAMS)));
    }

    let mut seen = BTreeSet::new();
    for (capability, _) in &resolved {
        if !seen.insert(*capability) {
            return Err(ValidationError::invalid_param(
                *capability,
                "features",
                "capability requested more than once",
            ));
        }
    }

    if seen.contains(&Capability::WifiAp) && seen.contains(&Capability::WifiSta) {
        return Err(ValidationError::ConflictingCapabilities {
            first: Capability::WifiAp,
            second: Capability::WifiSta,
        });
    }

    if seen.contains(&Capability::BlePeripheral) && !board.has_bluetooth() {
        return Err(ValidationError::invalid_param(
            Capability::BlePeripheral,
            "board_type",
            format!("{} has no Bluetooth controller", board),
        ));
    }

    let slug = project_slug(&project_name);
    let mut capabilities = BTreeMap::new();
    for (capability, params) in resolved {
        let reader = ParamReader::new(capability, params)?;
        let config = build_config(capability, &reader, &slug)?;
        capabilities.insert(capability, config);
    }

    debug!(
        project = %project_name,
        board = %board,
        capabilities = capabilities.len(),
        "validated feature descriptor"
    );

    Ok(FeatureDescriptor::new(project_name, board, capabilities))
}

/// Check a project name and return it trimmed.
///
/// Names become directory slugs, so only ASCII letters, digits, spaces, `-` and
/// `_` are allowed.
pub fn validate_project_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::invalid_field(
            "project_name",
            "project name cannot be empty",
        ));
    }
    if trimmed.chars().count() > MAX_PROJECT_NAME_LEN {
        return Err(ValidationError::invalid_field(
            "project_name",
            format!("project name too long (max {} characters)", MAX_PROJECT_NAME_LEN),
        ));
    }
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_');
    if !trimmed.chars().all(allowed) {
        return Err(ValidationError::invalid_field(
            "project_name",
            "project name may only contain letters, digits, spaces, '-' and '_'",
        ));
    }
    Ok(trimmed.to_string())
}

fn build_config(
    capability: Capability,
    reader: &ParamReader<'_>,
    slug: &str,
) -> Result<CapabilityConfig, ValidationError> {
    let config = match capability {
        Capability::WifiAp => {
            let default_ssid = truncate(&format!("{}{}", slug, DEFAULT_AP_SSID_SUFFIX), MAX_SSID_LEN);
            let mut ap = WifiApConfig::with_ssid(default_ssid);
            if let Some(ssid) = reader.string("ssid")? {
                reader.check_len("ssid", &ssid, 1, MAX_SSID_LEN)?;
                ap.ssid = ssid;
            }
            if let Some(password) = reader.string("password")? {
                reader.check_password("password", &password)?;
                ap.password = password;
            }
            if let Some(channel) = reader.integer("channel", 1..=MAX_AP_CHANNEL)? {
                ap.channel = channel as u8;
            }
            if let Some(max) = reader.integer("max_connections", 1..=MAX_AP_CONNECTIONS)? {
                ap.max_connections = max as u8;
            }
            if let Some(hidden) = reader.bool("hidden")? {
                ap.hidden = hidden;
            }
            CapabilityConfig::WifiAp(ap)
        }
        Capability::WifiSta => {
            let mut sta = WifiStaConfig::default();
            if let Some(ssid) = reader.string("ssid")? {
                // Empty is accepted here; it fails later, at association time.
                reader.check_len("ssid", &ssid, 0, MAX_SSID_LEN)?;
                sta.ssid = ssid;
            }
            if let Some(password) = reader.string("password")? {
                reader.check_password("password", &password)?;
                sta.password = password;
            }
            if let Some(attempts) =
                reader.integer("connect_attempts", 1..=MAX_STA_CONNECT_ATTEMPTS)?
            {
                sta.connect_attempts = attempts as u32;
            }
            CapabilityConfig::WifiSta(sta)
        }
        Capability::TcpServer => {
            let mut tcp = TcpServerConfig::default();
            if let Some(port) = reader.integer("port", PORT_RANGE)? {
                tcp.port = port as u16;
            }
            CapabilityConfig::TcpServer(tcp)
        }
        Capability::HttpServer => {
            let mut http = HttpServerConfig::default();
            if let Some(port) = reader.integer("port", PORT_RANGE)? {
                http.port = port as u16;
            }
            if let Some(routes) = reader.string_list("routes")? {
                if routes.is_empty() {
                    return Err(reader.invalid("routes", "at least one route is required"));
                }
                if let Some(bad) = routes.iter().find(|r| !r.starts_with('/')) {
                    return Err(reader.invalid("routes", format!("route '{}' must start with '/'", bad)));
                }
                http.routes = routes;
            }
            CapabilityConfig::HttpServer(http)
        }
        Capability::MqttClient => {
            let default_id = truncate(&format!("{}{}", DEFAULT_MQTT_CLIENT_PREFIX, slug), MAX_CLIENT_ID_LEN);
            let mut mqtt = MqttClientConfig::with_client_id(default_id);
            if let Some(host) = reader.string("broker_host")? {
                let host = host.trim().to_string();
                reader.check_len("broker_host", &host, 1, MAX_HOST_LEN)?;
                mqtt.broker_host = Some(host);
            }
            if let Some(port) = reader.integer("broker_port", PORT_RANGE)? {
                mqtt.broker_port = port as u16;
            }
            if let Some(client_id) = reader.string("client_id")? {
                reader.check_len("client_id", &client_id, 1, MAX_CLIENT_ID_LEN)?;
                mqtt.client_id = client_id;
            }
            CapabilityConfig::MqttClient(mqtt)
        }
        Capability::BlePeripheral => {
            let mut ble = BlePeripheralConfig::default();
            if let Some(name) = reader.string("device_name")? {
                reader.check_len("device_name", &name, 1, MAX_BLE_NAME_LEN)?;
                ble.device_name = name;
            }
            if let Some(uuid) = reader.string("service_uuid")? {
                if !is_valid_uuid(&uuid) {
                    return Err(reader.invalid(
                        "service_uuid",
                        format!("'{}' is not a 16-bit or 128-bit UUID", uuid),
                    ));
                }
                ble.service_uuid = uuid.to_ascii_lowercase();
            }
            CapabilityConfig::BlePeripheral(ble)
        }
    };
    Ok(config)
}

/// Truncate to at most `max` bytes on a character boundary.
fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}

/// Accepts `180f` style 16-bit UUIDs and `8-4-4-4-12` 128-bit UUIDs.
fn is_valid_uuid(s: &str) -> bool {
    let hex = |c: char| c.is_ascii_hexdigit();
    if s.len() == 4 {
        return s.chars().all(hex);
    }
    if s.len() != 36 {
        return false;
    }
    s.char_indices().all(|(i, c)| match i {
        8 | 13 | 18 | 23 => c == '-',
        _ => hex(c),
    })
}

// ============================================================================
// Parameter Reader
// ============================================================================

/// Typed access to one capability's raw parameters.
struct ParamReader<'a> {
    capability: Capability,
    params: &'a BTreeMap<String, ParamValue>,
}

impl<'a> ParamReader<'a> {
    /// Wrap `params`, rejecting any key the capability's schema does not list.
    fn new(
        capability: Capability,
        params: &'a BTreeMap<String, ParamValue>,
    ) -> Result<Self, ValidationError> {
        if let Some(key) = params.keys().find(|k| param_def(capability, k).is_none()) {
            return Err(ValidationError::invalid_param(
                capability,
                key.as_str(),
                "unknown parameter",
            ));
        }
        Ok(ParamReader { capability, params })
    }

    fn invalid(&self, key: &str, reason: impl Into<String>) -> ValidationError {
        ValidationError::invalid_param(self.capability, key, reason)
    }

    fn type_mismatch(&self, key: &str, expected: &str, value: &ParamValue) -> ValidationError {
        self.invalid(key, format!("expected {}, got {}", expected, value.type_name()))
    }

    /// Null and missing both mean "use the default".
    fn get(&self, key: &str) -> Option<&'a ParamValue> {
        self.params.get(key).filter(|v| !v.is_null())
    }

    fn string(&self, key: &str) -> Result<Option<String>, ValidationError> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_str()
                .map(|s| Some(s.to_string()))
                .ok_or_else(|| self.type_mismatch(key, "string", value)),
        }
    }

    fn integer(&self, key: &str, range: RangeInclusive<i64>) -> Result<Option<i64>, ValidationError> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => {
                let n = value
                    .as_i64()
                    .ok_or_else(|| self.type_mismatch(key, "integer", value))?;
                if !range.contains(&n) {
                    return Err(self.invalid(
                        key,
                        format!("{} is out of range {}-{}", n, range.start(), range.end()),
                    ));
                }
                Ok(Some(n))
            }
        }
    }

    fn bool(&self, key: &str) -> Result<Option<bool>, ValidationError> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_bool()
                .map(Some)
                .ok_or_else(|| self.type_mismatch(key, "bool", value)),
        }
    }

    fn string_list(&self, key: &str) -> Result<Option<Vec<String>>, ValidationError> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => {
                let items = value
                    .as_list()
                    .ok_or_else(|| self.type_mismatch(key, "list of strings", value))?;
                items
                    .iter()
                    .map(|item| {
                        item.as_str()
                            .map(str::to_string)
                            .ok_or_else(|| self.type_mismatch(key, "list of strings", item))
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Some)
            }
        }
    }

    fn check_len(&self, key: &str, value: &str, min: usize, max: usize) -> Result<(), ValidationError> {
        let len = value.len();
        if len < min || len > max {
            return Err(self.invalid(
                key,
                format!("length {} is outside {}-{} bytes", len, min, max),
            ));
        }
        Ok(())
    }

    fn check_password(&self, key: &str, password: &str) -> Result<(), ValidationError> {
        let len = password.chars().count();
        if len != 0 && !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
            return Err(self.invalid(
                key,
                format!(
                    "password must be empty or {}-{} characters",
                    MIN_PASSWORD_LEN, MAX_PASSWORD_LEN
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationErrorKind;

    fn request(board: &str) -> SimulateRequest {
        SimulateRequest::new("Comms Hub").with_board(board)
    }

    fn ap(params: &[(&str, ParamValue)]) -> FeatureRequest {
        FeatureRequest::with_params("wifi_ap", params.iter().cloned())
    }

    #[test]
    fn test_defaults_filled() {
        let descriptor = validate(
            &request("esp32"),
            &[
                FeatureRequest::named("tcp_server"),
                FeatureRequest::named("wifi_ap"),
                FeatureRequest::named("mqtt_client"),
            ],
        )
        .unwrap();

        assert_eq!(descriptor.board(), Board::Esp32);
        let caps: Vec<_> = descriptor.capabilities().collect();
        assert_eq!(
            caps,
            vec![Capability::WifiAp, Capability::TcpServer, Capability::MqttClient]
        );

        match descriptor.config(Capability::WifiAp) {
            Some(CapabilityConfig::WifiAp(ap)) => {
                assert_eq!(ap.ssid, "comms_hub_AP");
                assert_eq!(ap.channel, 1);
                assert_eq!(ap.max_connections, 4);
                assert!(ap.password.is_empty());
            }
            other => panic!("unexpected config: {:?}", other),
        }
        match descriptor.config(Capability::TcpServer) {
            Some(CapabilityConfig::TcpServer(tcp)) => assert_eq!(tcp.port, 8080),
            other => panic!("unexpected config: {:?}", other),
        }
        match descriptor.config(Capability::MqttClient) {
            Some(CapabilityConfig::MqttClient(mqtt)) => {
                assert_eq!(mqtt.broker_host, None);
                assert_eq!(mqtt.broker_port, 1883);
                assert_eq!(mqtt.client_id, "esp32-comms_hub");
            }
            other => panic!("unexpected config: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_capability_named() {
        let err = validate(
            &request("esp32"),
            &[FeatureRequest::named("wifi_ap"), FeatureRequest::named("lora_radio")],
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::UnknownCapability("lora_radio".to_string()));
    }

    #[test]
    fn test_unknown_capability_reported_before_conflict() {
        let err = validate(
            &request("esp32"),
            &[
                FeatureRequest::named("wifi_ap"),
                FeatureRequest::named("wifi_sta"),
                FeatureRequest::named("zigbee"),
            ],
        )
        .unwrap_err();
        assert_eq!(err.kind(), ValidationErrorKind::UnknownCapability);
    }

    #[test]
    fn test_ap_and_sta_conflict_in_either_order() {
        for features in [
            [FeatureRequest::named("wifi_ap"), FeatureRequest::named("wifi_sta")],
            [FeatureRequest::named("wifi_sta"), FeatureRequest::named("wifi_ap")],
        ] {
            let err = validate(&request("esp32"), &features).unwrap_err();
            assert_eq!(
                err,
                ValidationError::ConflictingCapabilities {
                    first: Capability::WifiAp,
                    second: Capability::WifiSta,
                }
            );
        }
    }

    #[test]
    fn test_unknown_board() {
        let err = validate(&request("esp8266"), &[FeatureRequest::named("wifi_ap")]).unwrap_err();
        assert_eq!(err.field(), Some("board_type"));
        assert_eq!(err.kind(), ValidationErrorKind::InvalidParameter);
        assert!(err.to_string().contains("s2, esp32s3"), "{}", err);
    }

    #[test]
    fn test_empty_feature_list() {
        let err = validate(&request("esp32"), &[]).unwrap_err();
        assert_eq!(err.field(), Some("features"));
        let err = request("esp32").validate().unwrap_err();
        assert_eq!(err.field(), Some("features"));
    }

    #[test]
    fn test_duplicate_capability() {
        let err = validate(
            &request("esp32"),
            &[FeatureRequest::named("tcp_server"), FeatureRequest::named("tcp_server")],
        )
        .unwrap_err();
        assert_eq!(err.capability(), Some(Capability::TcpServer));
    }

    #[test]
    fn test_ble_rejected_on_s2() {
        let err = validate(&request("esp32-s2"), &[FeatureRequest::named("ble_peripheral")])
            .unwrap_err();
        assert_eq!(err.capability(), Some(Capability::BlePeripheral));
        assert_eq!(err.field(), Some("board_type"));

        assert!(validate(&request("esp32-c6"), &[FeatureRequest::named("ble_peripheral")]).is_ok());
    }

    #[test]
    fn test_project_name_rules() {
        for bad in ["", "   ", "bad/name", "emoji🙂"] {
            let err = validate(&SimulateRequest::new(bad), &[FeatureRequest::named("wifi_ap")])
                .unwrap_err();
            assert_eq!(err.field(), Some("project_name"), "name {:?}", bad);
        }
        let long = "a".repeat(MAX_PROJECT_NAME_LEN + 1);
        assert!(validate(&SimulateRequest::new(long), &[FeatureRequest::named("wifi_ap")]).is_err());
    }

    #[test]
    fn test_ssid_length() {
        let err = validate(&request("esp32"), &[ap(&[("ssid", "".into())])]).unwrap_err();
        assert_eq!(err.field(), Some("ssid"));

        let err = validate(&request("esp32"), &[ap(&[("ssid", "x".repeat(33).into())])]).unwrap_err();
        assert_eq!(err.field(), Some("ssid"));

        assert!(validate(&request("esp32"), &[ap(&[("ssid", "x".repeat(32).into())])]).is_ok());
    }

    #[test]
    fn test_password_rules() {
        assert!(validate(&request("esp32"), &[ap(&[("password", "".into())])]).is_ok());
        assert!(validate(&request("esp32"), &[ap(&[("password", "12345678".into())])]).is_ok());
        let err = validate(&request("esp32"), &[ap(&[("password", "short".into())])]).unwrap_err();
        assert_eq!(err.field(), Some("password"));
        let err = validate(&request("esp32"), &[ap(&[("password", "p".repeat(65).into())])]).unwrap_err();
        assert_eq!(err.field(), Some("password"));
    }

    #[test]
    fn test_port_range_and_type() {
        for port in [0i64, 65536, -1] {
            let err = validate(
                &request("esp32"),
                &[FeatureRequest::with_params("tcp_server", [("port", port)])],
            )
            .unwrap_err();
            assert_eq!(err.field(), Some("port"));
        }

        let err = validate(
            &request("esp32"),
            &[FeatureRequest::with_params("tcp_server", [("port", "8080")])],
        )
        .unwrap_err();
        assert!(err.to_string().contains("expected integer"), "{}", err);

        let err = validate(
            &request("esp32"),
            &[FeatureRequest::with_params("tcp_server", [("port", ParamValue::Float(80.5))])],
        )
        .unwrap_err();
        assert!(err.to_string().contains("got float"), "{}", err);
    }

    #[test]
    fn test_unknown_parameter_rejected() {
        let err = validate(
            &request("esp32"),
            &[FeatureRequest::with_params("tcp_server", [("backlog", 5i64)])],
        )
        .unwrap_err();
        assert_eq!(err.field(), Some("backlog"));
        assert_eq!(err.capability(), Some(Capability::TcpServer));
    }

    #[test]
    fn test_null_means_default() {
        let descriptor = validate(
            &request("esp32"),
            &[FeatureRequest::with_params("tcp_server", [("port", ParamValue::Null)])],
        )
        .unwrap();
        assert_eq!(
            descriptor.config(Capability::TcpServer),
            Some(&CapabilityConfig::TcpServer(TcpServerConfig { port: 8080 }))
        );
    }

    #[test]
    fn test_empty_sta_ssid_passes_validation() {
        let descriptor = validate(
            &request("esp32"),
            &[FeatureRequest::with_params("wifi_sta", [("ssid", "")])],
        )
        .unwrap();
        match descriptor.config(Capability::WifiSta) {
            Some(CapabilityConfig::WifiSta(sta)) => {
                assert!(sta.ssid.is_empty());
                assert_eq!(sta.connect_attempts, 3);
            }
            other => panic!("unexpected config: {:?}", other),
        }
    }

    #[test]
    fn test_http_routes() {
        let err = validate(
            &request("esp32"),
            &[FeatureRequest::with_params(
                "http_server",
                [("routes", ParamValue::from(Vec::<String>::new()))],
            )],
        )
        .unwrap_err();
        assert_eq!(err.field(), Some("routes"));

        let err = validate(
            &request("esp32"),
            &[FeatureRequest::with_params(
                "http_server",
                [("routes", ParamValue::from(vec!["/", "status"]))],
            )],
        )
        .unwrap_err();
        assert!(err.to_string().contains("'status'"), "{}", err);
    }

    #[test]
    fn test_ble_uuid_forms() {
        for uuid in ["180F", "4FAFC201-1FB5-459E-8FCC-C5C9C331914B"] {
            let descriptor = validate(
                &request("esp32"),
                &[FeatureRequest::with_params("ble_peripheral", [("service_uuid", uuid)])],
            )
            .unwrap();
            match descriptor.config(Capability::BlePeripheral) {
                Some(CapabilityConfig::BlePeripheral(ble)) => {
                    assert_eq!(ble.service_uuid, uuid.to_ascii_lowercase())
                }
                other => panic!("unexpected config: {:?}", other),
            }
        }
        assert!(validate(
            &request("esp32"),
            &[FeatureRequest::with_params("ble_peripheral", [("service_uuid", "not-a-uuid")])],
        )
        .is_err());
    }

    #[test]
    fn test_default_ssid_truncated() {
        let name = "a".repeat(40);
        let descriptor =
            validate(&SimulateRequest::new(name), &[FeatureRequest::named("wifi_ap")]).unwrap();
        match descriptor.config(Capability::WifiAp) {
            Some(CapabilityConfig::WifiAp(ap)) => assert_eq!(ap.ssid.len(), MAX_SSID_LEN),
            other => panic!("unexpected config: {:?}", other),
        }
    }
}
