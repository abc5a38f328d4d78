//! Action factory context.
//!
//! An action factory receives an [`ActionFactoryContext`] and uses it for
//! all one-time, non-realtime resolution: reading the server configuration,
//! resolving declared slot names to [`RealtimeSlotId`]s and declared signal
//! names to [`SignalId`]s. Nothing here may be called from the cycle.

use crate::error::ControlResult;
use crate::signals::{SignalId, SignalMap};
use crate::slots::{RealtimeSlotId, SlotMap};
use helix::consts::CYCLE_TIME_US;
use serde::{Deserialize, Serialize};

/// One configured slot of the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotConfig {
    /// Slot name, unique within the server.
    pub name: String,
    /// Hardware module backing the slot.
    pub module: String,
    /// Number of joints the slot drives.
    pub dof: usize,
}

/// Server configuration visible to action factories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Control cycle period [µs].
    #[serde(default = "default_cycle_time_us")]
    pub cycle_time_us: u64,
    /// Configured slots.
    #[serde(default)]
    pub slots: Vec<SlotConfig>,
}

fn default_cycle_time_us() -> u64 {
    CYCLE_TIME_US
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            cycle_time_us: CYCLE_TIME_US,
            slots: Vec::new(),
        }
    }
}

/// Slot resolution result: the dense ID plus the slot's joint count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSlot {
    /// Dense slot ID for cycle-time lookup.
    pub slot_id: RealtimeSlotId,
    /// Number of joints the slot drives.
    pub dof: usize,
}

/// One-time resolution surface handed to action factories.
pub struct ActionFactoryContext<'a> {
    server_config: &'a ServerConfig,
    slot_map: &'a SlotMap,
    signal_map: &'a SignalMap,
}

impl<'a> ActionFactoryContext<'a> {
    /// Bundle the resolution surfaces for one action construction.
    pub fn new(
        server_config: &'a ServerConfig,
        slot_map: &'a SlotMap,
        signal_map: &'a SignalMap,
    ) -> Self {
        Self {
            server_config,
            slot_map,
            signal_map,
        }
    }

    /// The server configuration.
    pub fn server_config(&self) -> &ServerConfig {
        self.server_config
    }

    /// Resolve a slot name the action's signature requires.
    pub fn slot_info(&self, slot_name: &str) -> ControlResult<ResolvedSlot> {
        let slot_id = self.slot_map.slot_id(slot_name)?;
        let dof = self
            .slot_map
            .feature_interfaces_for_slot(slot_id)
            .map(|s| s.dof())
            .unwrap_or(0);
        Ok(ResolvedSlot { slot_id, dof })
    }

    /// Resolve a signal name the action's signature declares.
    pub fn realtime_signal_id(&self, signal_name: &str) -> ControlResult<SignalId> {
        self.signal_map.signal_id(signal_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::{ActionSignature, SignalRole};
    use crate::slots::SlotInterfaces;

    #[test]
    fn context_resolves_slots_and_signals() {
        let config = ServerConfig::default();
        let mut slot_map = SlotMap::new();
        slot_map.add_slot(SlotInterfaces::new("arm", 6));

        let sig = ActionSignature::new("test.move").with_signal("done", SignalRole::Output);
        let signal_map = SignalMap::from_signature(&sig).unwrap();

        let ctx = ActionFactoryContext::new(&config, &slot_map, &signal_map);
        assert_eq!(ctx.server_config().cycle_time_us, CYCLE_TIME_US);

        let slot = ctx.slot_info("arm").unwrap();
        assert_eq!(slot.slot_id, RealtimeSlotId(0));
        assert_eq!(slot.dof, 6);

        assert_eq!(ctx.realtime_signal_id("done").unwrap(), SignalId(0));
        assert!(ctx.slot_info("rail").is_err());
        assert!(ctx.realtime_signal_id("grip_force").is_err());
    }

    #[test]
    fn server_config_toml_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.cycle_time_us, CYCLE_TIME_US);
        assert!(config.slots.is_empty());
    }
}
