//! The simulation clock.

use crate::session::DeviceSession;
use espsim_peripherals::Peripheral;
use tracing::{info, warn};

/// Tick bound used when none is configured.
pub const DEFAULT_MAX_TICKS: u32 = 20;

/// Run a session until every peripheral is terminal or `max_ticks` ticks have run.
///
/// Each tick advances every non-terminal peripheral exactly once in canonical
/// order. Hitting the bound is not an error: the session is returned with
/// whatever state it reached, and its identity is derived either way.
pub fn run(mut session: DeviceSession, max_ticks: u32) -> DeviceSession {
    info!(
        session = %session.id(),
        board = %session.board(),
        peripherals = session.peripherals().len(),
        max_ticks,
        "starting simulation"
    );

    while session.ticks_run() < max_ticks && !session.all_terminal() {
        session.step();
    }

    if !session.all_terminal() {
        let pending: Vec<_> = session
            .peripherals()
            .iter()
            .filter(|p| !p.state().is_terminal())
            .map(|p| p.capability().as_str())
            .collect();
        warn!(
            session = %session.id(),
            ticks = session.ticks_run(),
            pending = %pending.join(","),
            "tick bound reached with peripherals still initializing"
        );
    }

    session.finish();
    info!(
        session = %session.id(),
        ticks = session.ticks_run(),
        events = session.events().len(),
        "simulation finished"
    );
    session
}
