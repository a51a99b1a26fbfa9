//! Startup-time pipe type registry.
//!
//! The declarative pipe definitions reference implementing types by a
//! string locator (`PIPE_MODULE.PIPE_CLASS`). Rather than reflective
//! lookup, every constructible type is registered here as a plain
//! constructor function keyed by its locator.

use crate::error::{Error, Result};
use crate::pipeline::pipe::Pipe;
use serde_json::Value;
use std::collections::HashMap;

/// Constructor function: parameter object in, boxed pipe out.
pub type PipeConstructor = fn(&Value) -> Result<Box<dyn Pipe>>;

/// Registry mapping type locators to constructors.
#[derive(Default)]
pub struct PipeRegistry {
    constructors: HashMap<String, PipeConstructor>,
}

impl PipeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-populated with every built-in pipe type.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::pipes::register_builtins(&mut registry);
        registry
    }

    /// Register a constructor under a locator. Re-registering a locator
    /// replaces the previous constructor.
    pub fn register(&mut self, locator: impl Into<String>, constructor: PipeConstructor) {
        self.constructors.insert(locator.into(), constructor);
    }

    /// Construct a pipe from its locator and declared parameters.
    pub fn construct(&self, locator: &str, params: &Value) -> Result<Box<dyn Pipe>> {
        let constructor = self.constructors.get(locator).ok_or_else(|| {
            Error::Config(format!("no pipe type registered for locator '{locator}'"))
        })?;
        constructor(params)
    }

    pub fn contains(&self, locator: &str) -> bool {
        self.constructors.contains_key(locator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::packet::{Payload, SignalPacket};
    use crate::pipeline::role::Role;
    use serde_json::json;

    struct Null;

    impl Pipe for Null {
        fn role(&self) -> Role {
            Role::Logger
        }
        fn locator(&self) -> &str {
            "test.Null"
        }
        fn params(&self) -> Value {
            json!({})
        }
        fn process(&mut self, _packet: SignalPacket) -> Result<Option<Payload>> {
            Ok(None)
        }
    }

    fn make_null(_params: &Value) -> Result<Box<dyn Pipe>> {
        Ok(Box::new(Null))
    }

    #[test]
    fn test_register_and_construct() {
        let mut registry = PipeRegistry::new();
        registry.register("test.Null", make_null);
        assert!(registry.contains("test.Null"));

        let pipe = registry.construct("test.Null", &json!({})).unwrap();
        assert_eq!(pipe.role(), Role::Logger);
    }

    #[test]
    fn test_unknown_locator_is_config_error() {
        let registry = PipeRegistry::new();
        let err = registry.construct("nope.Missing", &json!({})).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("nope.Missing"));
    }

    #[test]
    fn test_builtins_registered() {
        let registry = PipeRegistry::with_builtins();
        assert!(registry.contains("randgen.MvarNoiseSource"));
        assert!(registry.contains("preproc.CommonAvgRef"));
        assert!(registry.contains("adjacency.PearsonCorrelation"));
        assert!(registry.contains("topo.GlobalMean"));
        assert!(registry.contains("topo.NodeStrength"));
        assert!(registry.contains("topo.EdgeThreshold"));
        assert!(registry.contains("logger.Console"));
        assert!(registry.contains("logger.JsonlCache"));
    }
}
