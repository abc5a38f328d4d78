//! Joint limits interface — the variable-layout payload.
//!
//! Six per-joint `f64` vectors sized by `num_dof` at build time, plus
//! `has_*` flags saying which limit classes are configured. The payload is
//! built once at a fixed size; only element values and flags change
//! afterwards. A structural verifier runs at handle construction before
//! any accessor is trusted.

use crate::error::{ShmError, ShmResult};
use crate::interface::Interface;
use crate::varbuf;
use helix::consts::MAX_DOF;

/// Field indices within the varbuf payload.
const META: usize = 0;
const MIN_POSITION: usize = 1;
const MAX_POSITION: usize = 2;
const MAX_VELOCITY: usize = 3;
const MAX_ACCELERATION: usize = 4;
const MAX_JERK: usize = 5;
const MAX_EFFORT: usize = 6;
const FIELD_COUNT: usize = 7;

/// Meta field layout: num_dof u32 at 0, then one flag byte per limit class.
const META_LEN: usize = 8;
const FLAG_VELOCITY: usize = 4;
const FLAG_ACCELERATION: usize = 5;
const FLAG_JERK: usize = 6;
const FLAG_EFFORT: usize = 7;

/// Marker type for the joint limits interface.
///
/// Access goes through [`JointLimitsView`] / [`JointLimitsMut`]; the marker
/// itself is never instantiated.
#[derive(Debug, Clone, Copy)]
pub struct JointLimits;

impl JointLimits {
    /// Build a fresh payload for `num_dof` joints: all vectors zeroed and
    /// every `has_*_limits` flag false.
    pub fn build(buf: &mut [u8], num_dof: usize) -> ShmResult<()> {
        if num_dof > MAX_DOF {
            return Err(ShmError::ValidationError {
                interface: "joint_limits".to_string(),
                reason: format!("num_dof {num_dof} exceeds MAX_DOF {MAX_DOF}"),
            });
        }
        let mut builder = varbuf::Builder::new(buf, FIELD_COUNT)?;
        builder.add_field(META_LEN)?;
        for _ in MIN_POSITION..=MAX_EFFORT {
            builder.add_field(num_dof * 8)?;
        }
        builder.finish()?;
        varbuf::write_u32(buf, META, 0, num_dof as u32);
        Ok(())
    }
}

impl Interface for JointLimits {
    const TYPE_ID: &'static str = "helix.joint_limits";
    // Header + field table + meta + six MAX_DOF vectors. Field data is
    // 8-aligned throughout, so no per-field padding beyond this.
    const MAX_SIZE: usize = 8 + FIELD_COUNT * 8 + META_LEN + 6 * MAX_DOF * 8;

    type View<'a> = JointLimitsView<'a>;
    type ViewMut<'a> = JointLimitsMut<'a>;

    fn init(buf: &mut [u8]) -> ShmResult<()> {
        Self::build(buf, MAX_DOF)
    }

    fn validate(buf: &[u8], interface_name: &str) -> ShmResult<()> {
        varbuf::verify(buf, FIELD_COUNT, interface_name)?;

        let reject = |reason: String| ShmError::ValidationError {
            interface: interface_name.to_string(),
            reason,
        };

        if varbuf::field_len(buf, META) < META_LEN {
            return Err(reject("meta field is too short".to_string()));
        }
        let num_dof = varbuf::read_u32(buf, META, 0) as usize;
        if num_dof > MAX_DOF {
            return Err(reject(format!("num_dof {num_dof} exceeds MAX_DOF {MAX_DOF}")));
        }
        for field in MIN_POSITION..=MAX_EFFORT {
            let len = varbuf::field_len(buf, field);
            if len != num_dof * 8 {
                return Err(reject(format!(
                    "limit vector {field} holds {} elements but num_dof is {num_dof}",
                    len / 8
                )));
            }
        }
        Ok(())
    }

    fn view(buf: &[u8]) -> Self::View<'_> {
        JointLimitsView { buf }
    }

    fn view_mut(buf: &mut [u8]) -> Self::ViewMut<'_> {
        JointLimitsMut { buf }
    }
}

/// Read-only view over a validated joint limits payload.
#[derive(Clone, Copy)]
pub struct JointLimitsView<'a> {
    buf: &'a [u8],
}

impl JointLimitsView<'_> {
    /// Number of joints the vectors are sized for.
    pub fn num_dof(&self) -> usize {
        varbuf::read_u32(self.buf, META, 0) as usize
    }

    /// Whether velocity limits are configured.
    pub fn has_velocity_limits(&self) -> bool {
        varbuf::read_u8(self.buf, META, FLAG_VELOCITY) != 0
    }

    /// Whether acceleration limits are configured.
    pub fn has_acceleration_limits(&self) -> bool {
        varbuf::read_u8(self.buf, META, FLAG_ACCELERATION) != 0
    }

    /// Whether jerk limits are configured.
    pub fn has_jerk_limits(&self) -> bool {
        varbuf::read_u8(self.buf, META, FLAG_JERK) != 0
    }

    /// Whether effort limits are configured.
    pub fn has_effort_limits(&self) -> bool {
        varbuf::read_u8(self.buf, META, FLAG_EFFORT) != 0
    }

    /// Minimum position limit for `joint` [rad].
    pub fn min_position(&self, joint: usize) -> f64 {
        varbuf::read_f64(self.buf, MIN_POSITION, joint)
    }

    /// Maximum position limit for `joint` [rad].
    pub fn max_position(&self, joint: usize) -> f64 {
        varbuf::read_f64(self.buf, MAX_POSITION, joint)
    }

    /// Maximum velocity limit for `joint` [rad/s].
    pub fn max_velocity(&self, joint: usize) -> f64 {
        varbuf::read_f64(self.buf, MAX_VELOCITY, joint)
    }

    /// Maximum acceleration limit for `joint` [rad/s²].
    pub fn max_acceleration(&self, joint: usize) -> f64 {
        varbuf::read_f64(self.buf, MAX_ACCELERATION, joint)
    }

    /// Maximum jerk limit for `joint` [rad/s³].
    pub fn max_jerk(&self, joint: usize) -> f64 {
        varbuf::read_f64(self.buf, MAX_JERK, joint)
    }

    /// Maximum effort limit for `joint` [Nm].
    pub fn max_effort(&self, joint: usize) -> f64 {
        varbuf::read_f64(self.buf, MAX_EFFORT, joint)
    }
}

/// Mutable view over a validated joint limits payload.
///
/// Mutation is element-wise only; vector sizes are fixed at build time.
pub struct JointLimitsMut<'a> {
    buf: &'a mut [u8],
}

impl JointLimitsMut<'_> {
    /// Read-only view of the same payload.
    pub fn as_view(&self) -> JointLimitsView<'_> {
        JointLimitsView { buf: self.buf }
    }

    /// Number of joints the vectors are sized for.
    pub fn num_dof(&self) -> usize {
        self.as_view().num_dof()
    }

    /// Set the position limit band for `joint`.
    pub fn set_position_limits(&mut self, joint: usize, min: f64, max: f64) {
        varbuf::write_f64(self.buf, MIN_POSITION, joint, min);
        varbuf::write_f64(self.buf, MAX_POSITION, joint, max);
    }

    /// Set the velocity limit for `joint` and mark velocity limits present.
    pub fn set_max_velocity(&mut self, joint: usize, value: f64) {
        varbuf::write_f64(self.buf, MAX_VELOCITY, joint, value);
        varbuf::write_u8(self.buf, META, FLAG_VELOCITY, 1);
    }

    /// Set the acceleration limit for `joint` and mark acceleration limits
    /// present.
    pub fn set_max_acceleration(&mut self, joint: usize, value: f64) {
        varbuf::write_f64(self.buf, MAX_ACCELERATION, joint, value);
        varbuf::write_u8(self.buf, META, FLAG_ACCELERATION, 1);
    }

    /// Set the jerk limit for `joint` and mark jerk limits present.
    pub fn set_max_jerk(&mut self, joint: usize, value: f64) {
        varbuf::write_f64(self.buf, MAX_JERK, joint, value);
        varbuf::write_u8(self.buf, META, FLAG_JERK, 1);
    }

    /// Set the effort limit for `joint` and mark effort limits present.
    pub fn set_max_effort(&mut self, joint: usize, value: f64) {
        varbuf::write_f64(self.buf, MAX_EFFORT, joint, value);
        varbuf::write_u8(self.buf, META, FLAG_EFFORT, 1);
    }

    /// Clear all `has_*_limits` flags.
    pub fn clear_limit_flags(&mut self) {
        for flag in [FLAG_VELOCITY, FLAG_ACCELERATION, FLAG_JERK, FLAG_EFFORT] {
            varbuf::write_u8(self.buf, META, flag, 0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn built(num_dof: usize) -> Vec<u8> {
        let mut buf = vec![0u8; JointLimits::MAX_SIZE];
        JointLimits::build(&mut buf, num_dof).unwrap();
        buf
    }

    #[test]
    fn default_build_is_zeroed_with_flags_false() {
        let buf = built(6);
        JointLimits::validate(&buf, "joint_limits").unwrap();

        let view = JointLimits::view(&buf);
        assert_eq!(view.num_dof(), 6);
        assert!(!view.has_velocity_limits());
        assert!(!view.has_acceleration_limits());
        assert!(!view.has_jerk_limits());
        assert!(!view.has_effort_limits());
        for joint in 0..6 {
            assert_eq!(view.min_position(joint), 0.0);
            assert_eq!(view.max_position(joint), 0.0);
            assert_eq!(view.max_velocity(joint), 0.0);
        }
    }

    #[test]
    fn element_mutation_roundtrip() {
        let mut buf = built(3);

        let mut limits = JointLimits::view_mut(&mut buf);
        limits.set_position_limits(1, -1.5, 1.5);
        limits.set_max_velocity(1, 2.0);

        let view = JointLimits::view(&buf);
        assert_eq!(view.min_position(1), -1.5);
        assert_eq!(view.max_position(1), 1.5);
        assert_eq!(view.max_velocity(1), 2.0);
        assert!(view.has_velocity_limits());
        assert!(!view.has_effort_limits());
        // Untouched joints stay zeroed.
        assert_eq!(view.min_position(0), 0.0);
    }

    #[test]
    fn build_rejects_excess_dof() {
        let mut buf = vec![0u8; JointLimits::MAX_SIZE];
        assert!(JointLimits::build(&mut buf, MAX_DOF + 1).is_err());
    }

    #[test]
    fn validate_rejects_inconsistent_vector_length() {
        let mut buf = built(4);
        // Claim more joints than the vectors hold.
        varbuf::write_u32(&mut buf, META, 0, 9);
        let result = JointLimits::validate(&buf, "joint_limits");
        assert!(matches!(result, Err(ShmError::ValidationError { .. })));
    }

    #[test]
    fn validate_mentions_version_skew() {
        let mut buf = built(4);
        varbuf::write_u32(&mut buf, META, 0, 9);
        let message = JointLimits::validate(&buf, "joint_limits")
            .unwrap_err()
            .to_string();
        assert!(message.contains("version mismatch"));
    }

    #[test]
    fn max_size_fits_full_dof_build() {
        let mut buf = vec![0u8; JointLimits::MAX_SIZE];
        JointLimits::build(&mut buf, MAX_DOF).unwrap();
        JointLimits::validate(&buf, "joint_limits").unwrap();
    }
}
