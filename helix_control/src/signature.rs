//! Action signatures.
//!
//! An [`ActionSignature`] is static and immutable per action type: it is
//! created when the action type registers itself and only read afterwards.
//! Signal IDs are assigned in declaration order the first time an instance
//! resolves its signature, so the order of `realtime_signals` matters.

use serde::{Deserialize, Serialize};

/// Role of a realtime signal within an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalRole {
    /// The action asserts the signal (e.g. a condition became true).
    Output,
    /// The action reads the signal (e.g. a reaction armed it).
    Input,
}

/// One declared realtime signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalInfo {
    /// Signal name, unique within the signature.
    pub name: String,
    /// Whether the action reads or asserts the signal.
    pub role: SignalRole,
}

/// Static description of an action type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSignature {
    /// Unique action type name, e.g. `"helix.point_to_point_move"`.
    pub action_type_name: String,
    /// Human-readable description for tooling.
    #[serde(default)]
    pub description: String,
    /// Declared realtime signals; declaration order is signal ID order.
    #[serde(default)]
    pub realtime_signals: Vec<SignalInfo>,
    /// Names of the slots an instance must be given.
    #[serde(default)]
    pub required_slots: Vec<String>,
}

impl ActionSignature {
    /// A signature with the given type name and no declarations.
    pub fn new(action_type_name: impl Into<String>) -> Self {
        Self {
            action_type_name: action_type_name.into(),
            description: String::new(),
            realtime_signals: Vec::new(),
            required_slots: Vec::new(),
        }
    }

    /// Add a declared realtime signal.
    pub fn with_signal(mut self, name: impl Into<String>, role: SignalRole) -> Self {
        self.realtime_signals.push(SignalInfo {
            name: name.into(),
            role,
        });
        self
    }

    /// Add a required slot.
    pub fn with_required_slot(mut self, name: impl Into<String>) -> Self {
        self.required_slots.push(name.into());
        self
    }

    /// Names of all declared signals, in declaration order.
    pub fn signal_names(&self) -> Vec<String> {
        self.realtime_signals
            .iter()
            .map(|s| s.name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_preserves_declaration_order() {
        let sig = ActionSignature::new("test.action")
            .with_signal("clamp_open", SignalRole::Output)
            .with_signal("clamp_closed", SignalRole::Output)
            .with_required_slot("arm");

        assert_eq!(sig.signal_names(), vec!["clamp_open", "clamp_closed"]);
        assert_eq!(sig.required_slots, vec!["arm"]);
    }

    #[test]
    fn signature_is_serde_roundtrippable() {
        let sig = ActionSignature::new("test.action").with_signal("done", SignalRole::Input);
        let json = serde_json::to_string(&sig).unwrap();
        let back: ActionSignature = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sig);
    }
}
