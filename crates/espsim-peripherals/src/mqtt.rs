//! MQTT client.

use crate::server::{gate, LinkGate};
use crate::{NetworkLink, Peripheral};
use espsim_common::{Capability, IdentityContribution, PeripheralState, SimulationEvent, Tick};
use espsim_model::MqttClientConfig;

/// Connection state of the simulated broker session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerConnection {
    /// No CONNECT sent.
    Disconnected,
    /// CONNECT sent, waiting for CONNACK.
    Connecting,
    /// Session established.
    Connected,
}

/// MQTT client. Needs a broker host and a network link.
#[derive(Debug, Clone)]
pub struct MqttClient {
    config: MqttClientConfig,
    state: PeripheralState,
    connection: BrokerConnection,
    warned: bool,
}

impl MqttClient {
    /// Create a disconnected client.
    pub fn new(config: MqttClientConfig) -> Self {
        MqttClient {
            config,
            state: PeripheralState::Uninitialized,
            connection: BrokerConnection::Disconnected,
            warned: false,
        }
    }

    /// Current broker connection state.
    pub fn connection(&self) -> BrokerConnection {
        self.connection
    }
}

impl Peripheral for MqttClient {
    fn capability(&self) -> Capability {
        Capability::MqttClient
    }

    fn state(&self) -> PeripheralState {
        self.state
    }

    fn boot(&mut self, tick: Tick, link: NetworkLink) -> Vec<SimulationEvent> {
        if self.state.is_terminal() {
            return Vec::new();
        }
        let Some(host) = self.config.broker_host.as_deref() else {
            self.state = PeripheralState::Initializing;
            if self.warned {
                return Vec::new();
            }
            self.warned = true;
            tracing::warn!(tick = tick.get(), "mqtt client has no broker host");
            return vec![SimulationEvent::warning(
                tick,
                Capability::MqttClient,
                "no broker host configured",
            )];
        };

        if let LinkGate::Wait(events) = gate(
            Capability::MqttClient,
            tick,
            link,
            &mut self.state,
            &mut self.warned,
        ) {
            return events;
        }

        match self.connection {
            BrokerConnection::Disconnected => {
                self.connection = BrokerConnection::Connecting;
                self.state = PeripheralState::Initializing;
                vec![SimulationEvent::info(
                    tick,
                    Capability::MqttClient,
                    format!("connecting to broker {}:{}", host, self.config.broker_port),
                )]
            }
            BrokerConnection::Connecting => {
                self.connection = BrokerConnection::Connected;
                self.state = PeripheralState::Ready;
                Vec::new()
            }
            BrokerConnection::Connected => Vec::new(),
        }
    }

    fn steady_state(&self, tick: Tick) -> Option<SimulationEvent> {
        if self.connection != BrokerConnection::Connected {
            return None;
        }
        let host = self.config.broker_host.as_deref()?;
        Some(SimulationEvent::success(
            tick,
            Capability::MqttClient,
            format!(
                "connected to broker {}:{} as {}",
                host, self.config.broker_port, self.config.client_id
            ),
        ))
    }

    fn identity_contribution(&self) -> IdentityContribution {
        IdentityContribution::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use espsim_common::Severity;

    fn client(host: Option<&str>) -> MqttClient {
        let mut config = MqttClientConfig::with_client_id("esp32-hub");
        config.broker_host = host.map(str::to_string);
        MqttClient::new(config)
    }

    #[test]
    fn test_no_broker_warns_once_and_stays_initializing() {
        let mut mqtt = client(None);
        let events = mqtt.boot(Tick::new(1), NetworkLink::Up);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].severity, Severity::Warning);
        assert_eq!(events[0].message, "no broker host configured");

        assert!(mqtt.boot(Tick::new(2), NetworkLink::Up).is_empty());
        assert_eq!(mqtt.state(), PeripheralState::Initializing);
        assert_eq!(mqtt.connection(), BrokerConnection::Disconnected);
    }

    #[test]
    fn test_connects_once_link_up() {
        let mut mqtt = client(Some("broker.local"));
        assert!(mqtt.boot(Tick::new(1), NetworkLink::Pending).is_empty());

        let e = mqtt.boot(Tick::new(2), NetworkLink::Up);
        assert_eq!(e[0].message, "connecting to broker broker.local:1883");

        mqtt.boot(Tick::new(3), NetworkLink::Up);
        assert_eq!(mqtt.state(), PeripheralState::Ready);
        assert_eq!(
            mqtt.steady_state(Tick::new(3)).unwrap().message,
            "connected to broker broker.local:1883 as esp32-hub"
        );
        assert!(mqtt.identity_contribution().is_empty());
    }

    #[test]
    fn test_broker_without_network_stalls() {
        let mut mqtt = client(Some("broker.local"));
        let events = mqtt.boot(Tick::new(1), NetworkLink::Absent);
        assert_eq!(events[0].message, crate::NO_NETWORK_MESSAGE);
        assert!(mqtt.boot(Tick::new(2), NetworkLink::Absent).is_empty());
    }
}
