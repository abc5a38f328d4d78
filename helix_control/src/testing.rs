//! Test doubles for the action API.
//!
//! [`FakeSignalFabric`] implements the same two-phase contract as the real
//! runtime (resolve names once, then indexed cycle-time access) over a
//! plain array seeded from an [`ActionSignature`], so action unit tests
//! never require a real shared-memory segment.

use crate::error::ControlResult;
use crate::signals::{SignalAccess, SignalId, SignalMap, SignalValue};
use crate::signature::ActionSignature;

/// In-memory signal resolution + storage seeded from a signature.
pub struct FakeSignalFabric {
    map: SignalMap,
    access: SignalAccess,
}

impl FakeSignalFabric {
    /// Build the fabric for an action type's signature.
    ///
    /// # Panics
    /// Panics on signatures with duplicate signal declarations; that is a
    /// test fixture bug, not a runtime condition.
    pub fn new(signature: &ActionSignature) -> Self {
        let map = SignalMap::from_signature(signature)
            .expect("test signature declares duplicate signals");
        let access = SignalAccess::for_map(&map);
        Self { map, access }
    }

    /// Resolve a signal name, exactly like the runtime's factory context.
    pub fn signal_id(&self, name: &str) -> ControlResult<SignalId> {
        self.map.signal_id(name)
    }

    /// The cycle-time access half, to hand to the action under test.
    pub fn access_mut(&mut self) -> &mut SignalAccess {
        &mut self.access
    }

    /// Assert or clear a signal by name, as a reaction would.
    ///
    /// # Panics
    /// Panics on unknown names (a test fixture bug).
    pub fn set(&mut self, name: &str, asserted: bool, cycle: u64) {
        let id = self.signal_id(name).expect("unknown signal in test");
        self.access
            .post(
                id,
                SignalValue {
                    asserted,
                    set_in_cycle: cycle,
                },
            )
            .expect("signal id out of range");
    }

    /// Read a signal by name.
    ///
    /// # Panics
    /// Panics on unknown names (a test fixture bug).
    pub fn get(&self, name: &str) -> SignalValue {
        let id = self.map.signal_id(name).expect("unknown signal in test");
        self.access.read(id).expect("signal id out of range")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::SignalRole;

    fn fabric() -> FakeSignalFabric {
        FakeSignalFabric::new(
            &ActionSignature::new("test.clamp")
                .with_signal("clamp_open", SignalRole::Output)
                .with_signal("clamp_closed", SignalRole::Output),
        )
    }

    #[test]
    fn fabric_mirrors_runtime_resolution() {
        let fabric = fabric();
        assert_eq!(fabric.signal_id("clamp_open").unwrap(), SignalId(0));
        assert_eq!(fabric.signal_id("clamp_closed").unwrap(), SignalId(1));
        assert!(fabric.signal_id("grip_force").is_err());
    }

    #[test]
    fn set_and_get_by_name() {
        let mut fabric = fabric();
        fabric.set("clamp_open", true, 4);
        assert!(fabric.get("clamp_open").asserted);
        assert_eq!(fabric.get("clamp_open").set_in_cycle, 4);
        assert!(!fabric.get("clamp_closed").asserted);
    }

    #[test]
    fn access_half_reads_like_the_runtime() {
        let mut fabric = fabric();
        fabric.set("clamp_closed", true, 1);
        let id = fabric.signal_id("clamp_closed").unwrap();
        assert!(fabric.access_mut().read(id).unwrap().asserted);
    }
}
