//! Slot map: per-slot feature interface resolution and cycle-time lookup.
//!
//! Slots are the runtime's attachment points for actions (one slot per
//! controlled part). Resolution happens once, before the cycle starts;
//! afterwards actions look up their slot bundles by dense integer ID.

use crate::error::{ControlError, ControlResult};
use crate::features::{
    JointLimitsSource, JointPositionCommand, JointPositionSensor, ShmJointLimitsSource,
    ShmJointPositionCommand, ShmJointPositionSensor,
};
use helix::rt::{RtCode, RtResult};
use helix::rt_err;
use helix_shm::SegmentRegistry;
use helix_shm::interfaces::{JointCommand, JointLimits, JointState};

/// Dense integer handle substituting for a slot name in the control cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RealtimeSlotId(
    /// Dense index value.
    pub u64,
);

impl RealtimeSlotId {
    /// Raw index value.
    pub const fn value(self) -> u64 {
        self.0
    }
}

/// The feature interfaces one slot offers to actions.
///
/// Each feature is optional: a sensor-only slot has no command interface,
/// a fixed-tool slot may have no limits. Actions check for what they need
/// at construction time.
pub struct SlotInterfaces {
    name: String,
    dof: usize,
    position_sensor: Option<Box<dyn JointPositionSensor>>,
    position_command: Option<Box<dyn JointPositionCommand>>,
    joint_limits: Option<Box<dyn JointLimitsSource>>,
}

impl std::fmt::Debug for SlotInterfaces {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotInterfaces")
            .field("name", &self.name)
            .field("dof", &self.dof)
            .field("position_sensor", &self.position_sensor.is_some())
            .field("position_command", &self.position_command.is_some())
            .field("joint_limits", &self.joint_limits.is_some())
            .finish()
    }
}

impl SlotInterfaces {
    /// An empty bundle for a slot with `dof` joints.
    pub fn new(name: impl Into<String>, dof: usize) -> Self {
        Self {
            name: name.into(),
            dof,
            position_sensor: None,
            position_command: None,
            joint_limits: None,
        }
    }

    /// Resolve the standard feature interfaces over a module's registry.
    ///
    /// Wires up whatever the module publishes: `joint_state` (strict),
    /// `joint_command` (strict, only on read-write registries) and
    /// `joint_limits`. Non-realtime; called once per slot.
    pub fn over_module(
        name: impl Into<String>,
        registry: &SegmentRegistry,
        dof: usize,
    ) -> ControlResult<Self> {
        let mut slot = Self::new(name, dof);

        if let Ok(handle) = registry.get_strict::<JointState>("joint_state") {
            slot.position_sensor = Some(Box::new(ShmJointPositionSensor::new(handle, dof)));
        }
        if let Ok(handle) = registry.get_strict_mut::<JointCommand>("joint_command") {
            slot.position_command = Some(Box::new(ShmJointPositionCommand::new(handle, dof)));
        }
        if let Ok(handle) = registry.get::<JointLimits>("joint_limits") {
            slot.joint_limits = Some(Box::new(ShmJointLimitsSource::new(handle)));
        }

        tracing::debug!(
            slot = %slot.name,
            module = registry.module(),
            sensor = slot.position_sensor.is_some(),
            command = slot.position_command.is_some(),
            limits = slot.joint_limits.is_some(),
            "resolved slot feature interfaces"
        );
        Ok(slot)
    }

    /// Install a position sensor.
    pub fn with_position_sensor(mut self, sensor: Box<dyn JointPositionSensor>) -> Self {
        self.position_sensor = Some(sensor);
        self
    }

    /// Install a position command sink.
    pub fn with_position_command(mut self, command: Box<dyn JointPositionCommand>) -> Self {
        self.position_command = Some(command);
        self
    }

    /// Install a joint limits source.
    pub fn with_joint_limits(mut self, limits: Box<dyn JointLimitsSource>) -> Self {
        self.joint_limits = Some(limits);
        self
    }

    /// Slot name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of joints this slot drives.
    pub fn dof(&self) -> usize {
        self.dof
    }

    /// The slot's position sensor, if it has one.
    pub fn position_sensor(&self) -> Option<&dyn JointPositionSensor> {
        self.position_sensor.as_deref()
    }

    /// The slot's position command sink, if it has one.
    pub fn position_command(&mut self) -> Option<&mut (dyn JointPositionCommand + 'static)> {
        self.position_command.as_deref_mut()
    }

    /// The slot's joint limits source, if it has one.
    pub fn joint_limits(&self) -> Option<&dyn JointLimitsSource> {
        self.joint_limits.as_deref()
    }
}

/// Slot-ID–indexed lookup of per-slot feature interfaces.
///
/// Built once at startup; cycle-time lookups are direct indexing with a
/// realtime-safe error on out-of-range IDs.
#[derive(Default)]
pub struct SlotMap {
    slots: Vec<SlotInterfaces>,
}

impl SlotMap {
    /// An empty slot map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a slot; IDs are assigned densely in insertion order.
    pub fn add_slot(&mut self, slot: SlotInterfaces) -> RealtimeSlotId {
        let id = RealtimeSlotId(self.slots.len() as u64);
        self.slots.push(slot);
        id
    }

    /// Resolve a slot name to its ID (non-realtime; resolution phase).
    ///
    /// The error enumerates all available slot names.
    pub fn slot_id(&self, name: &str) -> ControlResult<RealtimeSlotId> {
        self.slots
            .iter()
            .position(|s| s.name() == name)
            .map(|i| RealtimeSlotId(i as u64))
            .ok_or_else(|| ControlError::UnknownSlot {
                name: name.to_string(),
                available: self.slots.iter().map(|s| s.name().to_string()).collect(),
            })
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if no slots are registered.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Feature interfaces for `slot_id`. O(1), allocation-free.
    #[inline]
    pub fn feature_interfaces_for_slot(&self, slot_id: RealtimeSlotId) -> RtResult<&SlotInterfaces> {
        match self.slots.get(slot_id.value() as usize) {
            Some(slot) => Ok(slot),
            None => Err(rt_err!(
                RtCode::NotFound,
                "no slot found with id: {}",
                slot_id.value()
            )),
        }
    }

    /// Mutable feature interfaces for `slot_id`. O(1), allocation-free.
    #[inline]
    pub fn mutable_feature_interfaces_for_slot(
        &mut self,
        slot_id: RealtimeSlotId,
    ) -> RtResult<&mut SlotInterfaces> {
        match self.slots.get_mut(slot_id.value() as usize) {
            Some(slot) => Ok(slot),
            None => Err(rt_err!(
                RtCode::NotFound,
                "no slot found with id: {}",
                slot_id.value()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_ids_are_dense_in_insertion_order() {
        let mut map = SlotMap::new();
        let arm = map.add_slot(SlotInterfaces::new("arm", 6));
        let gripper = map.add_slot(SlotInterfaces::new("gripper", 1));

        assert_eq!(arm, RealtimeSlotId(0));
        assert_eq!(gripper, RealtimeSlotId(1));
        assert_eq!(map.slot_id("arm").unwrap(), arm);
        assert_eq!(map.slot_id("gripper").unwrap(), gripper);
    }

    #[test]
    fn unknown_slot_enumerates_available_names() {
        let mut map = SlotMap::new();
        map.add_slot(SlotInterfaces::new("arm", 6));

        let err = map.slot_id("rail").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("rail"));
        assert!(message.contains("arm"));
    }

    #[test]
    fn out_of_range_slot_id_is_rt_not_found() {
        let map = SlotMap::new();
        let err = map
            .feature_interfaces_for_slot(RealtimeSlotId(3))
            .unwrap_err();
        assert_eq!(err.code(), RtCode::NotFound);
    }

    #[test]
    fn empty_slot_has_no_features() {
        let mut map = SlotMap::new();
        let id = map.add_slot(SlotInterfaces::new("bare", 2));
        let slot = map.feature_interfaces_for_slot(id).unwrap();
        assert!(slot.position_sensor().is_none());
        assert!(slot.joint_limits().is_none());
        assert_eq!(slot.dof(), 2);
    }
}
