//! Module info interface.
//!
//! A reserved, well-known segment enumerates all interfaces a module
//! publishes and which of them are required. External tooling reads this to
//! validate a module's completeness before attaching.

use crate::error::{ShmError, ShmResult};
use crate::fixed_interface;
use crate::interfaces::impl_default_zeroed;
use helix::consts::{MAX_INTERFACES, MAX_INTERFACE_NAME};

/// One published interface: NUL-padded name plus required flag.
#[derive(Clone, Copy)]
#[repr(C)]
pub struct ModuleInfoEntry {
    name: [u8; MAX_INTERFACE_NAME],
    required: u8,
    _pad: [u8; 7],
}

impl ModuleInfoEntry {
    fn name(&self) -> &str {
        let end = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.name.len());
        core::str::from_utf8(&self.name[..end]).unwrap_or("")
    }
}

/// Enumeration of a module's published interfaces.
#[derive(Clone, Copy)]
#[repr(C, align(8))]
pub struct ModuleInfo {
    count: u32,
    _pad: u32,
    entries: [ModuleInfoEntry; MAX_INTERFACES],
}

impl_default_zeroed!(ModuleInfoEntry, ModuleInfo);

fixed_interface!(ModuleInfo, "helix.module_info");

impl ModuleInfo {
    /// Append an interface entry.
    pub fn push(&mut self, name: &str, required: bool) -> ShmResult<()> {
        if name.len() >= MAX_INTERFACE_NAME {
            return Err(ShmError::ValidationError {
                interface: name.to_string(),
                reason: format!("interface name exceeds {} bytes", MAX_INTERFACE_NAME - 1),
            });
        }
        if (self.count as usize) >= MAX_INTERFACES {
            return Err(ShmError::ValidationError {
                interface: name.to_string(),
                reason: format!("module already publishes {MAX_INTERFACES} interfaces"),
            });
        }
        if self.contains(name) {
            return Err(ShmError::AlreadyExists {
                name: name.to_string(),
            });
        }

        let entry = &mut self.entries[self.count as usize];
        entry.name = [0; MAX_INTERFACE_NAME];
        entry.name[..name.len()].copy_from_slice(name.as_bytes());
        entry.required = required as u8;
        self.count += 1;
        Ok(())
    }

    /// Number of published interfaces.
    pub fn len(&self) -> usize {
        self.count as usize
    }

    /// True if no interfaces are published.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// True if `name` is among the published interfaces.
    pub fn contains(&self, name: &str) -> bool {
        self.iter().any(|(n, _)| n == name)
    }

    /// Iterate over `(name, required)` entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries[..self.count as usize]
            .iter()
            .map(|e| (e.name(), e.required != 0))
    }

    /// Names of all published interfaces.
    pub fn interface_names(&self) -> Vec<String> {
        self.iter().map(|(n, _)| n.to_string()).collect()
    }

    /// Names of the interfaces marked required.
    ///
    /// Subset of [`ModuleInfo::interface_names`].
    pub fn required_interface_names(&self) -> Vec<String> {
        self.iter()
            .filter(|&(_, required)| required)
            .map(|(n, _)| n.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_enumerate() {
        let mut info = ModuleInfo::default();
        info.push("joint_state", true).unwrap();
        info.push("joint_command", true).unwrap();
        info.push("imu", false).unwrap();

        assert_eq!(info.len(), 3);
        assert_eq!(
            info.interface_names(),
            vec!["joint_state", "joint_command", "imu"]
        );
        assert_eq!(
            info.required_interface_names(),
            vec!["joint_state", "joint_command"]
        );
        assert!(info.contains("imu"));
        assert!(!info.contains("gripper"));
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut info = ModuleInfo::default();
        info.push("joint_state", true).unwrap();
        assert!(matches!(
            info.push("joint_state", false),
            Err(ShmError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn overlong_name_is_rejected() {
        let mut info = ModuleInfo::default();
        let long = "x".repeat(MAX_INTERFACE_NAME);
        assert!(info.push(&long, false).is_err());
    }

    #[test]
    fn capacity_is_bounded() {
        let mut info = ModuleInfo::default();
        for i in 0..MAX_INTERFACES {
            info.push(&format!("iface_{i}"), false).unwrap();
        }
        assert!(info.push("one_too_many", false).is_err());
    }
}
