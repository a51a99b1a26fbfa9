//! The pipe contract every processing stage implements.
//!
//! A pipe declares its [`Role`], a qualified type locator, and a snapshot of
//! its constructor parameters; the engine derives its identity hash from the
//! latter two. Sources implement [`Pipe::next_payload`], flow pipes
//! implement [`Pipe::process`], terminal sinks implement `process` with a
//! side effect and return `Ok(None)`. Linking, tagging, verification, and
//! the driving loops live in [`crate::pipeline::graph`].

use crate::error::{Error, Result};
use crate::pipeline::identity::IdentityHash;
use crate::pipeline::packet::{Payload, SignalPacket};
use crate::pipeline::role::Role;
use serde_json::Value;

/// A unit of computation in the pipeline graph.
///
/// Rules carried over from the engine's contract:
/// 1. `params()` must report every declared constructor parameter — the
///    identity hash is computed from the full set.
/// 2. `process` must have no externally observable side effects beyond its
///    return value, except for `Logger` pipes, whose side effect is the
///    point.
pub trait Pipe {
    /// The role fixing this pipe's packet schema and legal downstreams.
    fn role(&self) -> Role;

    /// Qualified type locator in `module.Class` form, matching the
    /// `PIPE_MODULE`/`PIPE_CLASS` fields of the pipe definition document.
    fn locator(&self) -> &str;

    /// Snapshot of the constructor parameters as a JSON object.
    fn params(&self) -> Value;

    /// Produce the next payload (source pipes only). `Ok(None)` signals
    /// exhaustion and triggers the close cascade.
    fn next_payload(&mut self) -> Result<Option<Payload>> {
        Err(Error::processing(
            self.locator().to_string(),
            "pipe cannot be driven as a source",
        ))
    }

    /// Transform one inbound packet (flow pipes). The packet is this
    /// branch's isolated copy; the single-key envelope is visible so that
    /// sinks can record the upstream identity. `Ok(None)` is an explicit
    /// drop: nothing is forwarded and no error is raised.
    fn process(&mut self, packet: SignalPacket) -> Result<Option<Payload>> {
        let _ = packet;
        Err(Error::processing(
            self.locator().to_string(),
            "pipe cannot be driven as a flow",
        ))
    }

    /// Called exactly once when the pipe receives a close signal. Sinks
    /// release any held resource here rather than at process exit.
    fn on_close(&mut self) {}

    /// Stable content fingerprint over {locator, constructor parameters}.
    /// Pure and callable repeatedly.
    fn identity(&self) -> IdentityHash {
        IdentityHash::compute(self.locator(), &self.params())
    }
}

impl std::fmt::Debug for dyn Pipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipe")
            .field("locator", &self.locator())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Stub;

    impl Pipe for Stub {
        fn role(&self) -> Role {
            Role::Preproc
        }
        fn locator(&self) -> &str {
            "test.Stub"
        }
        fn params(&self) -> Value {
            json!({"alpha": 2})
        }
        fn process(&mut self, packet: SignalPacket) -> Result<Option<Payload>> {
            Ok(Some(packet.payload))
        }
    }

    #[test]
    fn test_identity_repeatable() {
        let pipe = Stub;
        assert_eq!(pipe.identity(), pipe.identity());
        assert_eq!(
            pipe.identity(),
            IdentityHash::compute("test.Stub", &json!({"alpha": 2}))
        );
    }

    #[test]
    fn test_default_source_is_error() {
        let mut pipe = Stub;
        assert!(pipe.next_payload().is_err());
    }
}
