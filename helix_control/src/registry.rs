//! Action type registry.
//!
//! Action types register a static signature plus a factory; a host process
//! enumerates and instantiates them without compile-time coupling to any
//! concrete action. Constructed at startup, populated via `register()`, and
//! passed to the control runtime by value. No global state, so it is testable in
//! isolation.

use crate::action::RealtimeAction;
use crate::context::ActionFactoryContext;
use crate::error::{ControlError, ControlResult};
use crate::signature::ActionSignature;
use std::collections::HashMap;

/// Factory building an action instance from a factory context.
pub type ActionFactory =
    fn(&ActionFactoryContext<'_>) -> ControlResult<Box<dyn RealtimeAction>>;

/// Registry of available action types.
pub struct ActionRegistry {
    entries: HashMap<String, (ActionSignature, ActionFactory)>,
}

impl ActionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register an action type.
    ///
    /// # Panics
    /// Panics if an action type with the same name is already registered.
    pub fn register(&mut self, signature: ActionSignature, factory: ActionFactory) {
        let name = signature.action_type_name.clone();
        if self.entries.contains_key(&name) {
            panic!("Action type '{name}' is already registered");
        }
        self.entries.insert(name, (signature, factory));
    }

    /// The signature of a registered action type.
    pub fn signature(&self, action_type: &str) -> Option<&ActionSignature> {
        self.entries.get(action_type).map(|(sig, _)| sig)
    }

    /// All registered signatures.
    pub fn signatures(&self) -> Vec<&ActionSignature> {
        self.entries.values().map(|(sig, _)| sig).collect()
    }

    /// All registered action type names.
    pub fn action_type_names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Instantiate an action type against a factory context.
    ///
    /// # Errors
    /// Returns `ControlError::UnknownActionType` if no such type is
    /// registered; forwards the factory's own resolution errors.
    pub fn create(
        &self,
        action_type: &str,
        context: &ActionFactoryContext<'_>,
    ) -> ControlResult<Box<dyn RealtimeAction>> {
        let (_, factory) =
            self.entries
                .get(action_type)
                .ok_or_else(|| ControlError::UnknownActionType {
                    name: action_type.to_string(),
                })?;
        factory(context)
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::CycleContext;
    use crate::context::ServerConfig;
    use crate::signals::SignalMap;
    use crate::slots::SlotMap;
    use helix::rt::RtResult;

    struct NoopAction;

    impl RealtimeAction for NoopAction {
        fn cycle(&mut self, _ctx: &mut CycleContext<'_>) -> RtResult<()> {
            Ok(())
        }
    }

    fn noop_factory(
        _ctx: &ActionFactoryContext<'_>,
    ) -> ControlResult<Box<dyn RealtimeAction>> {
        Ok(Box::new(NoopAction))
    }

    fn empty_context_parts() -> (ServerConfig, SlotMap, SignalMap) {
        let config = ServerConfig::default();
        let slots = SlotMap::new();
        let signals = SignalMap::from_signature(&ActionSignature::new("noop")).unwrap();
        (config, slots, signals)
    }

    #[test]
    fn register_and_create() {
        let mut registry = ActionRegistry::new();
        registry.register(ActionSignature::new("test.noop"), noop_factory);

        let (config, slots, signals) = empty_context_parts();
        let ctx = ActionFactoryContext::new(&config, &slots, &signals);
        assert!(registry.create("test.noop", &ctx).is_ok());
    }

    #[test]
    fn unknown_type_is_an_error() {
        let registry = ActionRegistry::new();
        let (config, slots, signals) = empty_context_parts();
        let ctx = ActionFactoryContext::new(&config, &slots, &signals);
        assert!(matches!(
            registry.create("test.missing", &ctx),
            Err(ControlError::UnknownActionType { .. })
        ));
    }

    #[test]
    fn signatures_are_enumerable() {
        let mut registry = ActionRegistry::new();
        registry.register(ActionSignature::new("test.a"), noop_factory);
        registry.register(ActionSignature::new("test.b"), noop_factory);

        let mut names = registry.action_type_names();
        names.sort();
        assert_eq!(names, vec!["test.a", "test.b"]);
        assert!(registry.signature("test.a").is_some());
        assert!(registry.signature("test.c").is_none());
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn duplicate_registration_panics() {
        let mut registry = ActionRegistry::new();
        registry.register(ActionSignature::new("test.dup"), noop_factory);
        registry.register(ActionSignature::new("test.dup"), noop_factory);
    }
}
