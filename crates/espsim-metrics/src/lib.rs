//! Metrics for the ESP32 project simulator.
//!
//! Every metric the engine and the HTTP service record is declared here as a
//! [`Metric`] constant, so names and label keys live in one place. The `metrics`
//! crate is re-exported; install any recorder to collect them. Without one,
//! recording is a no-op.
//!
//! # Example
//!
//! ```rust,ignore
//! use espsim_metrics::{metric_defs, describe_metrics, SimulationLabels};
//!
//! describe_metrics();
//!
//! let labels = SimulationLabels::new("ESP32");
//! metrics::counter!(
//!     metric_defs::SIMULATION_RUNS.name,
//!     &labels.with(&[("status", "success".to_string())])
//! )
//! .increment(1);
//! ```

pub use metrics;

use metrics::{describe_counter, describe_histogram, Unit};

/// The kind of metric (counter or histogram).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// A monotonically increasing counter.
    Counter,
    /// A histogram for recording distributions.
    Histogram,
}

impl MetricKind {
    /// Returns the kind as a lowercase string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric declaration with its metadata.
///
/// Built with the const constructors so declarations can be `const` items:
///
/// ```rust
/// use espsim_metrics::{Metric, MetricKind};
/// use metrics::Unit;
///
/// const BOOTS: Metric = Metric::counter("espsim.example.boots")
///     .with_description("Example boots")
///     .with_unit(Unit::Count)
///     .with_labels(&["board"]);
///
/// assert_eq!(BOOTS.kind, MetricKind::Counter);
/// ```
#[derive(Debug, Clone)]
pub struct Metric {
    /// The metric name (e.g., "espsim.simulation.runs").
    pub name: &'static str,
    /// The kind of metric (counter or histogram).
    pub kind: MetricKind,
    /// Human-readable description of the metric.
    pub description: &'static str,
    /// The unit of measurement (optional).
    pub unit: Option<Unit>,
    /// Expected label keys for this metric.
    pub labels: &'static [&'static str],
}

impl Metric {
    const fn new(name: &'static str, kind: MetricKind) -> Self {
        Self {
            name,
            kind,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    /// Creates a new counter metric with the given name.
    pub const fn counter(name: &'static str) -> Self {
        Self::new(name, MetricKind::Counter)
    }

    /// Creates a new histogram metric with the given name.
    pub const fn histogram(name: &'static str) -> Self {
        Self::new(name, MetricKind::Histogram)
    }

    /// Sets the description for the metric.
    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Sets the unit for the metric.
    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Sets the expected label keys for the metric.
    pub const fn with_labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    /// Registers this metric's description with the installed recorder.
    pub fn describe(&self) {
        match (self.kind, self.unit) {
            (MetricKind::Counter, Some(unit)) => {
                describe_counter!(self.name, unit, self.description);
            }
            (MetricKind::Counter, None) => {
                describe_counter!(self.name, self.description);
            }
            (MetricKind::Histogram, Some(unit)) => {
                describe_histogram!(self.name, unit, self.description);
            }
            (MetricKind::Histogram, None) => {
                describe_histogram!(self.name, self.description);
            }
        }
    }

    /// Returns the unit as a human-readable string, empty if unset.
    pub fn unit_str(&self) -> &'static str {
        self.unit.map(|u| u.as_str()).unwrap_or("")
    }
}

/// All metric definitions for the simulator.
pub mod metric_defs {
    use super::{Metric, Unit};

    // ========================================================================
    // Simulation Engine
    // ========================================================================

    /// Completed simulation runs.
    ///
    /// Labels: board, status (`success` or `partial_failure`)
    pub const SIMULATION_RUNS: Metric = Metric::counter("espsim.simulation.runs")
        .with_description("Completed simulation runs")
        .with_unit(Unit::Count)
        .with_labels(&["board", "status"]);

    /// Ticks executed per run.
    ///
    /// Labels: board
    pub const SIMULATION_TICKS: Metric = Metric::histogram("espsim.simulation.ticks")
        .with_description("Ticks executed before the run ended")
        .with_unit(Unit::Count)
        .with_labels(&["board"]);

    /// Events emitted by peripherals.
    ///
    /// Labels: capability, severity
    pub const SIMULATION_EVENTS: Metric = Metric::counter("espsim.simulation.events")
        .with_description("Events emitted by virtual peripherals")
        .with_unit(Unit::Count)
        .with_labels(&["capability", "severity"]);

    /// Final peripheral states.
    ///
    /// Labels: capability, state (`ready`, `failed`, `initializing`)
    pub const PERIPHERAL_OUTCOMES: Metric = Metric::counter("espsim.peripheral.outcomes")
        .with_description("Final state of each peripheral when a run ends")
        .with_unit(Unit::Count)
        .with_labels(&["capability", "state"]);

    // ========================================================================
    // Validation
    // ========================================================================

    /// Rejected requests.
    ///
    /// Labels: kind (`UnknownCapability`, `ConflictingCapabilities`, `InvalidParameter`)
    pub const VALIDATION_REJECTED: Metric = Metric::counter("espsim.validation.rejected")
        .with_description("Requests rejected by the validator")
        .with_unit(Unit::Count)
        .with_labels(&["kind"]);

    // ========================================================================
    // HTTP Service
    // ========================================================================

    /// HTTP requests handled.
    ///
    /// Labels: route, status (numeric HTTP status)
    pub const HTTP_REQUESTS: Metric = Metric::counter("espsim.http.requests")
        .with_description("HTTP requests handled by the simulation service")
        .with_unit(Unit::Count)
        .with_labels(&["route", "status"]);

    /// Returns a slice of all defined metrics.
    pub const ALL: &[&Metric] = &[
        &SIMULATION_RUNS,
        &SIMULATION_TICKS,
        &SIMULATION_EVENTS,
        &PERIPHERAL_OUTCOMES,
        &VALIDATION_REJECTED,
        &HTTP_REQUESTS,
    ];
}

/// Labels shared by all metrics recorded for one simulation run.
#[derive(Debug, Clone)]
pub struct SimulationLabels {
    /// Board display name (e.g. "ESP32-C3").
    pub board: String,
}

impl SimulationLabels {
    /// Labels for a run on `board`.
    pub fn new(board: impl Into<String>) -> Self {
        Self {
            board: board.into(),
        }
    }

    /// Converts the labels to the metrics crate label format.
    pub fn to_labels(&self) -> Vec<(&'static str, String)> {
        vec![("board", self.board.clone())]
    }

    /// Returns labels with additional key-value pairs.
    pub fn with(&self, extra: &[(&'static str, String)]) -> Vec<(&'static str, String)> {
        let mut labels = self.to_labels();
        labels.extend_from_slice(extra);
        labels
    }
}

/// Describes all metrics used in the simulator.
///
/// Call once at startup, after installing a recorder.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulation_labels() {
        let labels = SimulationLabels::new("ESP32-S3");
        assert_eq!(labels.to_labels(), vec![("board", "ESP32-S3".to_string())]);

        let extended = labels.with(&[("status", "success".to_string())]);
        assert_eq!(extended.len(), 2);
        assert!(extended.contains(&("status", "success".to_string())));
    }

    #[test]
    fn test_metric_definitions() {
        assert_eq!(metric_defs::SIMULATION_RUNS.name, "espsim.simulation.runs");
        assert_eq!(metric_defs::SIMULATION_RUNS.labels, &["board", "status"]);
        assert_eq!(metric_defs::SIMULATION_TICKS.kind, MetricKind::Histogram);
        assert_eq!(metric_defs::HTTP_REQUESTS.name, "espsim.http.requests");
        assert_eq!(metric_defs::VALIDATION_REJECTED.labels, &["kind"]);
    }

    #[test]
    fn test_all_metrics_unique() {
        assert_eq!(metric_defs::ALL.len(), 6);
        for (i, a) in metric_defs::ALL.iter().enumerate() {
            assert!(a.name.starts_with("espsim."), "{}", a.name);
            assert!(!a.description.is_empty(), "{} has no description", a.name);
            for b in &metric_defs::ALL[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn test_metric_minimal() {
        const MINIMAL: Metric = Metric::histogram("minimal");

        assert_eq!(MINIMAL.kind, MetricKind::Histogram);
        assert_eq!(MINIMAL.description, "");
        assert_eq!(MINIMAL.unit, None);
        assert_eq!(MINIMAL.unit_str(), "");
        assert_eq!(MINIMAL.labels, &[] as &[&str]);
    }

    #[test]
    fn test_every_kind_is_declared() {
        for kind in [MetricKind::Counter, MetricKind::Histogram] {
            assert!(metric_defs::ALL.iter().any(|m| m.kind == kind), "{}", kind);
        }
    }

    #[test]
    fn test_describe_without_recorder() {
        describe_metrics();
    }
}
