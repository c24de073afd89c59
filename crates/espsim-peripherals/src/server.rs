//! Network servers: raw TCP and HTTP.
//!
//! Both follow the same network rule. While the radio is still coming up they
//! wait without logging. Once the link is up they take two ticks to start. If
//! there is no radio, or it failed, they log a single warning and stay
//! `Initializing` for the rest of the run.

use crate::{NetworkLink, Peripheral, NO_NETWORK_MESSAGE};
use espsim_common::{Capability, IdentityContribution, PeripheralState, SimulationEvent, Tick};
use espsim_model::{HttpServerConfig, TcpServerConfig};

/// Outcome of checking the link before a network-bound step.
pub(crate) enum LinkGate {
    /// The link is up; proceed.
    Open,
    /// Keep waiting, with these events for this tick.
    Wait(Vec<SimulationEvent>),
}

/// Apply the shared network rule. `warned` records the one-time warning.
pub(crate) fn gate(
    capability: Capability,
    tick: Tick,
    link: NetworkLink,
    state: &mut PeripheralState,
    warned: &mut bool,
) -> LinkGate {
    match link {
        NetworkLink::Up => LinkGate::Open,
        NetworkLink::Pending => {
            *state = PeripheralState::Initializing;
            LinkGate::Wait(Vec::new())
        }
        NetworkLink::Absent | NetworkLink::Down => {
            *state = PeripheralState::Initializing;
            if *warned {
                return LinkGate::Wait(Vec::new());
            }
            *warned = true;
            tracing::warn!(%capability, tick = tick.get(), "stalled without a network link");
            LinkGate::Wait(vec![SimulationEvent::warning(
                tick,
                capability,
                NO_NETWORK_MESSAGE,
            )])
        }
    }
}

// ============================================================================
// TCP Server
// ============================================================================

/// Socket state of the simulated TCP listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    /// No socket yet.
    Closed,
    /// `bind()` issued.
    Binding,
    /// Accepting connections.
    Listening,
}

/// Raw TCP server.
#[derive(Debug, Clone)]
pub struct TcpServer {
    config: TcpServerConfig,
    state: PeripheralState,
    listener: ListenerState,
    warned: bool,
}

impl TcpServer {
    /// Create a server with a closed listener.
    pub fn new(config: TcpServerConfig) -> Self {
        TcpServer {
            config,
            state: PeripheralState::Uninitialized,
            listener: ListenerState::Closed,
            warned: false,
        }
    }

    /// Current listener state.
    pub fn listener(&self) -> ListenerState {
        self.listener
    }
}

impl Peripheral for TcpServer {
    fn capability(&self) -> Capability {
        Capability::TcpServer
    }

    fn state(&self) -> PeripheralState {
        self.state
    }

    fn boot(&mut self, tick: Tick, link: NetworkLink) -> Vec<SimulationEvent> {
        if self.state.is_terminal() {
            return Vec::new();
        }
        if let LinkGate::Wait(events) = gate(
            Capability::TcpServer,
            tick,
            link,
            &mut self.state,
            &mut self.warned,
        ) {
            return events;
        }

        match self.listener {
            ListenerState::Closed => {
                self.listener = ListenerState::Binding;
                self.state = PeripheralState::Initializing;
                vec![SimulationEvent::info(
                    tick,
                    Capability::TcpServer,
                    format!("binding port {}", self.config.port),
                )]
            }
            ListenerState::Binding => {
                self.listener = ListenerState::Listening;
                self.state = PeripheralState::Ready;
                Vec::new()
            }
            ListenerState::Listening => Vec::new(),
        }
    }

    fn steady_state(&self, tick: Tick) -> Option<SimulationEvent> {
        (self.listener == ListenerState::Listening).then(|| {
            SimulationEvent::success(
                tick,
                Capability::TcpServer,
                format!("listening on port {}", self.config.port),
            )
        })
    }

    fn identity_contribution(&self) -> IdentityContribution {
        IdentityContribution {
            server_banner: Some(format!("TCP server on port {}", self.config.port)),
            ..IdentityContribution::none()
        }
    }
}

// ============================================================================
// HTTP Server
// ============================================================================

/// Startup phase of the simulated web server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpServerPhase {
    /// Not started.
    Stopped,
    /// Handlers registered, socket opening.
    Starting,
    /// Serving requests.
    Serving,
}

/// HTTP web server.
#[derive(Debug, Clone)]
pub struct HttpServer {
    config: HttpServerConfig,
    state: PeripheralState,
    phase: HttpServerPhase,
    warned: bool,
}

impl HttpServer {
    /// Create a stopped server.
    pub fn new(config: HttpServerConfig) -> Self {
        HttpServer {
            config,
            state: PeripheralState::Uninitialized,
            phase: HttpServerPhase::Stopped,
            warned: false,
        }
    }

    /// Current startup phase.
    pub fn phase(&self) -> HttpServerPhase {
        self.phase
    }
}

impl Peripheral for HttpServer {
    fn capability(&self) -> Capability {
        Capability::HttpServer
    }

    fn state(&self) -> PeripheralState {
        self.state
    }

    fn boot(&mut self, tick: Tick, link: NetworkLink) -> Vec<SimulationEvent> {
        if self.state.is_terminal() {
            return Vec::new();
        }
        if let LinkGate::Wait(events) = gate(
            Capability::HttpServer,
            tick,
            link,
            &mut self.state,
            &mut self.warned,
        ) {
            return events;
        }

        match self.phase {
            HttpServerPhase::Stopped => {
                self.phase = HttpServerPhase::Starting;
                self.state = PeripheralState::Initializing;
                vec![SimulationEvent::info(
                    tick,
                    Capability::HttpServer,
                    format!(
                        "starting web server on port {} ({} routes)",
                        self.config.port,
                        self.config.routes.len()
                    ),
                )]
            }
            HttpServerPhase::Starting => {
                self.phase = HttpServerPhase::Serving;
                self.state = PeripheralState::Ready;
                Vec::new()
            }
            HttpServerPhase::Serving => Vec::new(),
        }
    }

    fn steady_state(&self, tick: Tick) -> Option<SimulationEvent> {
        (self.phase == HttpServerPhase::Serving).then(|| {
            SimulationEvent::success(
                tick,
                Capability::HttpServer,
                format!(
                    "serving {} on port {}",
                    self.config.root_path(),
                    self.config.port
                ),
            )
        })
    }

    fn identity_contribution(&self) -> IdentityContribution {
        IdentityContribution {
            web_server: Some(true),
            server_banner: Some(format!("HTTP server on port {}", self.config.port)),
            ..IdentityContribution::none()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use espsim_common::Severity;

    #[test]
    fn test_tcp_waits_silently_while_pending() {
        let mut tcp = TcpServer::new(TcpServerConfig::default());
        for t in 1..=3 {
            assert!(tcp.boot(Tick::new(t), NetworkLink::Pending).is_empty());
            assert_eq!(tcp.state(), PeripheralState::Initializing);
            assert_eq!(tcp.listener(), ListenerState::Closed);
        }

        let events = tcp.boot(Tick::new(4), NetworkLink::Up);
        assert_eq!(events[0].message, "binding port 8080");
        assert_eq!(tcp.listener(), ListenerState::Binding);

        tcp.boot(Tick::new(5), NetworkLink::Up);
        assert_eq!(tcp.state(), PeripheralState::Ready);
        assert_eq!(tcp.listener(), ListenerState::Listening);
    }

    #[test]
    fn test_tcp_warns_once_without_network() {
        let mut tcp = TcpServer::new(TcpServerConfig { port: 8080 });

        let first = tcp.boot(Tick::new(1), NetworkLink::Absent);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].severity, Severity::Warning);
        assert_eq!(first[0].message, NO_NETWORK_MESSAGE);

        for t in 2..=10 {
            assert!(tcp.boot(Tick::new(t), NetworkLink::Absent).is_empty());
        }
        assert_eq!(tcp.state(), PeripheralState::Initializing);
        assert!(tcp.steady_state(Tick::new(10)).is_none());
    }

    #[test]
    fn test_tcp_stalls_when_radio_down() {
        let mut tcp = TcpServer::new(TcpServerConfig::default());
        let events = tcp.boot(Tick::new(1), NetworkLink::Down);
        assert_eq!(events[0].message, NO_NETWORK_MESSAGE);
        assert!(!tcp.state().is_terminal());
    }

    #[test]
    fn test_http_start_sequence_and_identity() {
        let mut http = HttpServer::new(HttpServerConfig {
            port: 80,
            routes: vec!["/".to_string(), "/status".to_string()],
        });

        let e1 = http.boot(Tick::new(1), NetworkLink::Up);
        assert_eq!(e1[0].message, "starting web server on port 80 (2 routes)");
        assert_eq!(http.phase(), HttpServerPhase::Starting);

        http.boot(Tick::new(2), NetworkLink::Up);
        assert_eq!(http.state(), PeripheralState::Ready);
        assert_eq!(
            http.steady_state(Tick::new(2)).unwrap().message,
            "serving / on port 80"
        );

        let identity = http.identity_contribution();
        assert_eq!(identity.web_server, Some(true));
        assert_eq!(identity.server_banner.as_deref(), Some("HTTP server on port 80"));
        assert!(identity.ip_address.is_none());
    }
}
