//! Metric recording for runs, rejections and HTTP requests.

use crate::report::SimulationReport;
use crate::session::DeviceSession;
use espsim_metrics::{metric_defs, SimulationLabels};
use espsim_model::ValidationError;
use espsim_peripherals::Peripheral;

/// Record the outcome of a finished run.
pub fn record_run(session: &DeviceSession, report: &SimulationReport) {
    let labels = SimulationLabels::new(session.board().display_name());

    metrics::counter!(
        metric_defs::SIMULATION_RUNS.name,
        &labels.with(&[("status", report.status.as_str().to_string())])
    )
    .increment(1);
    metrics::histogram!(metric_defs::SIMULATION_TICKS.name, &labels.to_labels())
        .record(f64::from(session.ticks_run()));

    for event in session.events() {
        metrics::counter!(
            metric_defs::SIMULATION_EVENTS.name,
            "capability" => event.source.as_str(),
            "severity" => event.severity.as_str()
        )
        .increment(1);
    }
    for peripheral in session.peripherals() {
        metrics::counter!(
            metric_defs::PERIPHERAL_OUTCOMES.name,
            "capability" => peripheral.capability().as_str(),
            "state" => peripheral.state().as_str()
        )
        .increment(1);
    }
}

/// Record a rejected request.
pub fn record_rejection(err: &ValidationError) {
    metrics::counter!(
        metric_defs::VALIDATION_REJECTED.name,
        "kind" => err.kind().as_str()
    )
    .increment(1);
}

/// Record a handled HTTP request.
pub fn record_http(route: &'static str, status: u16) {
    metrics::counter!(
        metric_defs::HTTP_REQUESTS.name,
        "route" => route,
        "status" => status.to_string()
    )
    .increment(1);
}
