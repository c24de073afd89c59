//! Bluetooth LE advertiser.

use crate::{NetworkLink, Peripheral};
use espsim_common::{Capability, IdentityContribution, PeripheralState, SimulationEvent, Tick};
use espsim_model::BlePeripheralConfig;

/// BLE peripheral. Starts advertising on its first tick.
#[derive(Debug, Clone)]
pub struct BlePeripheral {
    config: BlePeripheralConfig,
    state: PeripheralState,
}

impl BlePeripheral {
    /// Create an advertiser that has not started.
    pub fn new(config: BlePeripheralConfig) -> Self {
        BlePeripheral {
            config,
            state: PeripheralState::Uninitialized,
        }
    }
}

impl Peripheral for BlePeripheral {
    fn capability(&self) -> Capability {
        Capability::BlePeripheral
    }

    fn state(&self) -> PeripheralState {
        self.state
    }

    fn boot(&mut self, _tick: Tick, _link: NetworkLink) -> Vec<SimulationEvent> {
        self.state = PeripheralState::Ready;
        Vec::new()
    }

    fn steady_state(&self, tick: Tick) -> Option<SimulationEvent> {
        (self.state == PeripheralState::Ready).then(|| {
            SimulationEvent::success(
                tick,
                Capability::BlePeripheral,
                format!(
                    "advertising \"{}\" with service {}",
                    self.config.device_name, self.config.service_uuid
                ),
            )
        })
    }

    fn identity_contribution(&self) -> IdentityContribution {
        IdentityContribution::none()
    }
}
