//! Simulation reports.
//!
//! [`build`] projects a finished [`DeviceSession`] into the response body of
//! `/api/simulate`. Identity fields a session did not produce are omitted from
//! the JSON rather than written as `null`.

use crate::session::DeviceSession;
use serde::{Deserialize, Serialize};

/// Overall outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Every peripheral reached `Ready`.
    Success,
    /// At least one peripheral failed or never finished booting.
    PartialFailure,
}

impl ReportStatus {
    /// The status as it appears in the report.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Success => "success",
            ReportStatus::PartialFailure => "partial_failure",
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The externally visible result of a simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Overall outcome.
    pub status: ReportStatus,
    /// Board display name.
    pub board_type: String,
    /// Device IPv4 address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Soft-AP SSID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ap_ssid: Option<String>,
    /// Whether an HTTP server is running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_server: Option<bool>,
    /// Short description of the listening server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_banner: Option<String>,
    /// Rendered event log, in emission order.
    pub logs: Vec<String>,
}

impl SimulationReport {
    /// Whether the run was a full success.
    pub fn is_success(&self) -> bool {
        self.status == ReportStatus::Success
    }

    /// Plain-text rendering: a summary header followed by the log lines.
    pub fn to_text(&self) -> String {
        let mut out = format!("status: {}\nboard: {}\n", self.status, self.board_type);
        if let Some(ip) = &self.ip_address {
            out.push_str(&format!("ip_address: {}\n", ip));
        }
        if let Some(ssid) = &self.ap_ssid {
            out.push_str(&format!("ap_ssid: {}\n", ssid));
        }
        if let Some(web) = self.web_server {
            out.push_str(&format!("web_server: {}\n", web));
        }
        if let Some(banner) = &self.server_banner {
            out.push_str(&format!("server_banner: {}\n", banner));
        }
        out.push('\n');
        for line in &self.logs {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

/// Build the report of a finished session.
pub fn build(session: &DeviceSession) -> SimulationReport {
    let status = if session.all_ready() {
        ReportStatus::Success
    } else {
        ReportStatus::PartialFailure
    };
    let identity = session.identity().clone();

    SimulationReport {
        status,
        board_type: session.board().display_name().to_string(),
        ip_address: identity.ip_address,
        ap_ssid: identity.ap_ssid,
        web_server: identity.web_server,
        server_banner: identity.server_banner,
        logs: session.events().iter().map(|e| e.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler;
    use espsim_model::{validate, FeatureRequest, SimulateRequest};

    fn report(board: &str, features: &[FeatureRequest]) -> SimulationReport {
        let descriptor =
            validate(&SimulateRequest::new("Report").with_board(board), features).unwrap();
        build(&scheduler::run(DeviceSession::new(descriptor), 20))
    }

    #[test]
    fn test_absent_fields_are_omitted() {
        let report = report("esp32-c3", &[FeatureRequest::named("ble_peripheral")]);
        let json = serde_json::to_value(&report).unwrap();
        let obj = json.as_object().unwrap();

        assert_eq!(obj["status"], "success");
        assert_eq!(obj["board_type"], "ESP32-C3");
        for key in ["ip_address", "ap_ssid", "web_server", "server_banner"] {
            assert!(!obj.contains_key(key), "{} should be omitted", key);
        }
        assert_eq!(obj["logs"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_partial_failure_when_not_all_ready() {
        let report = report(
            "esp32",
            &[FeatureRequest::named("wifi_ap"), FeatureRequest::named("mqtt_client")],
        );
        assert_eq!(report.status, ReportStatus::PartialFailure);
        assert_eq!(report.ip_address.as_deref(), Some("192.168.4.1"));
        assert!(report
            .logs
            .contains(&"[1] mqtt_client: no broker host configured".to_string()));
    }

    #[test]
    fn test_http_identity_and_status_serialization() {
        let report = report(
            "esp32-s3",
            &[FeatureRequest::named("wifi_ap"), FeatureRequest::named("http_server")],
        );
        assert!(report.is_success());
        assert_eq!(report.web_server, Some(true));
        assert_eq!(report.server_banner.as_deref(), Some("HTTP server on port 80"));

        let json = serde_json::to_string(&ReportStatus::PartialFailure).unwrap();
        assert_eq!(json, "\"partial_failure\"");
    }

    #[test]
    fn test_text_rendering() {
        let report = report("esp32", &[FeatureRequest::named("wifi_ap")]);
        let text = report.to_text();
        assert!(text.starts_with("status: success\nboard: ESP32\n"));
        assert!(text.contains("ap_ssid: report_AP\n"));
        assert!(text.ends_with("[1] wifi_ap: access point up at 192.168.4.1\n"));
    }
}
