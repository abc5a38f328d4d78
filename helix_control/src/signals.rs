//! Realtime signal resolution and access.
//!
//! Two-phase design:
//!
//! - **Resolution phase** (non-realtime, once per action instance):
//!   [`SignalMap::from_signature`] assigns dense IDs `0..N-1` in declaration
//!   order; [`SignalMap::signal_id`] resolves names and enumerates all
//!   declared names on failure, so a misconfigured action is diagnosable
//!   immediately.
//! - **Access phase** (realtime, every cycle): [`SignalAccess`] is a
//!   pre-sized array indexed by ID: no hashing, no allocation, no locking.
//!   Out-of-range IDs return a realtime-safe error instead of trapping.

use crate::error::{ControlError, ControlResult};
use crate::signature::ActionSignature;
use helix::rt::{RtCode, RtResult};
use helix::rt_err;
use std::collections::HashMap;

/// Dense integer handle substituting for a signal name in the control cycle.
///
/// Stable for the lifetime of the action instance that resolved it; never
/// reused for a different signal within that instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignalId(
    /// Dense index value.
    pub u64,
);

impl SignalId {
    /// Raw index value.
    pub const fn value(self) -> u64 {
        self.0
    }
}

/// Current value of a realtime signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalValue {
    /// Whether the signal is asserted.
    pub asserted: bool,
    /// Control cycle in which the value was last posted.
    pub set_in_cycle: u64,
}

/// Factory-time name→ID map for one action instance.
pub struct SignalMap {
    action_type: String,
    order: Vec<String>,
    ids: HashMap<String, SignalId>,
}

impl SignalMap {
    /// Assign dense IDs to the signature's declared signals, in declaration
    /// order. Fails on duplicate declarations.
    pub fn from_signature(signature: &ActionSignature) -> ControlResult<Self> {
        let mut ids = HashMap::new();
        let mut order = Vec::with_capacity(signature.realtime_signals.len());
        for (index, info) in signature.realtime_signals.iter().enumerate() {
            if ids
                .insert(info.name.clone(), SignalId(index as u64))
                .is_some()
            {
                return Err(ControlError::DuplicateSignal {
                    action_type: signature.action_type_name.clone(),
                    name: info.name.clone(),
                });
            }
            order.push(info.name.clone());
        }
        Ok(Self {
            action_type: signature.action_type_name.clone(),
            order,
            ids,
        })
    }

    /// Resolve a signal name to its dense ID.
    ///
    /// The error enumerates every declared name. Calling this twice for the
    /// same name returns the same ID both times.
    pub fn signal_id(&self, name: &str) -> ControlResult<SignalId> {
        self.ids
            .get(name)
            .copied()
            .ok_or_else(|| ControlError::UnknownSignal {
                action_type: self.action_type.clone(),
                name: name.to_string(),
                declared: self.order.clone(),
            })
    }

    /// Number of declared signals.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True if the signature declares no signals.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Declared names in ID order.
    pub fn names(&self) -> &[String] {
        &self.order
    }
}

/// Cycle-time signal storage: direct indexed access, allocation-free.
pub struct SignalAccess {
    values: Box<[SignalValue]>,
}

impl SignalAccess {
    /// Pre-size storage for every signal in `map`. Called once, at action
    /// construction (non-realtime).
    pub fn for_map(map: &SignalMap) -> Self {
        Self {
            values: vec![SignalValue::default(); map.len()].into_boxed_slice(),
        }
    }

    /// Read a signal value by ID. O(1), no allocation.
    ///
    /// Out-of-range IDs return NotFound rather than trapping: a realtime
    /// cycle must be able to produce this error without touching the heap.
    #[inline]
    pub fn read(&self, id: SignalId) -> RtResult<SignalValue> {
        match self.values.get(id.value() as usize) {
            Some(value) => Ok(*value),
            None => Err(rt_err!(
                RtCode::NotFound,
                "no realtime signal found with id: {}",
                id.value()
            )),
        }
    }

    /// Post a signal value by ID. O(1), no allocation.
    #[inline]
    pub fn post(&mut self, id: SignalId, value: SignalValue) -> RtResult<()> {
        match self.values.get_mut(id.value() as usize) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(rt_err!(
                RtCode::NotFound,
                "no realtime signal found with id: {}",
                id.value()
            )),
        }
    }

    /// Number of signal slots.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if no signals are stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::SignalRole;

    fn clamp_signature() -> ActionSignature {
        ActionSignature::new("test.clamp")
            .with_signal("clamp_open", SignalRole::Output)
            .with_signal("clamp_closed", SignalRole::Output)
    }

    #[test]
    fn ids_are_dense_and_in_declaration_order() {
        let map = SignalMap::from_signature(&clamp_signature()).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.signal_id("clamp_open").unwrap(), SignalId(0));
        assert_eq!(map.signal_id("clamp_closed").unwrap(), SignalId(1));
    }

    #[test]
    fn resolution_is_stable_across_calls() {
        let map = SignalMap::from_signature(&clamp_signature()).unwrap();
        let first = map.signal_id("clamp_open").unwrap();
        let second = map.signal_id("clamp_open").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_signal_enumerates_declared_names() {
        let map = SignalMap::from_signature(&clamp_signature()).unwrap();
        let err = map.signal_id("grip_force").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("grip_force"));
        assert!(message.contains("clamp_open, clamp_closed"));
    }

    #[test]
    fn duplicate_declaration_is_rejected() {
        let sig = ActionSignature::new("test.dup")
            .with_signal("done", SignalRole::Output)
            .with_signal("done", SignalRole::Input);
        assert!(matches!(
            SignalMap::from_signature(&sig),
            Err(ControlError::DuplicateSignal { .. })
        ));
    }

    #[test]
    fn access_reads_and_posts_by_index() {
        let map = SignalMap::from_signature(&clamp_signature()).unwrap();
        let mut access = SignalAccess::for_map(&map);

        let id = map.signal_id("clamp_closed").unwrap();
        assert_eq!(access.read(id).unwrap(), SignalValue::default());

        access
            .post(
                id,
                SignalValue {
                    asserted: true,
                    set_in_cycle: 12,
                },
            )
            .unwrap();
        let value = access.read(id).unwrap();
        assert!(value.asserted);
        assert_eq!(value.set_in_cycle, 12);
    }

    #[test]
    fn out_of_range_id_is_rt_not_found() {
        let map = SignalMap::from_signature(&clamp_signature()).unwrap();
        let access = SignalAccess::for_map(&map);

        let err = access.read(SignalId(99)).unwrap_err();
        assert_eq!(err.code(), RtCode::NotFound);
        assert!(err.message().contains("99"));
    }
}
