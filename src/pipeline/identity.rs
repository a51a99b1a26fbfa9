//! Content-derived pipe identity.
//!
//! Every pipe instance is fingerprinted by hashing its qualified type
//! locator together with a canonical serialization of its constructor
//! parameters. Two instances with identical type and parameters always
//! yield the same hash; changing any single parameter changes it. The hash
//! tags packets and lineage records — it is a stable content fingerprint,
//! not a security boundary.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha224};
use std::fmt;

/// Hex-encoded SHA-224 digest identifying a pipe's type + parameters.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityHash(String);

impl IdentityHash {
    /// Compute the identity hash for a pipe.
    ///
    /// `locator` is the qualified type locator (`module.Class` form);
    /// `params` is the constructor parameter snapshot. Object keys are
    /// serialized in sorted order at every level (serde_json's default map
    /// is ordered), so the digest is independent of declaration order.
    pub fn compute(locator: &str, params: &Value) -> Self {
        let canonical = canonical_json(params);
        let mut hasher = Sha224::new();
        hasher.update(locator.as_bytes());
        hasher.update(b": ");
        hasher.update(canonical.as_bytes());
        let digest = hasher.finalize();
        let mut hex = String::with_capacity(digest.len() * 2);
        for byte in digest {
            use std::fmt::Write;
            let _ = write!(hex, "{byte:02x}");
        }
        IdentityHash(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for IdentityHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdentityHash({})", &self.0[..8.min(self.0.len())])
    }
}

impl fmt::Display for IdentityHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Serialize a JSON value with object keys sorted at every nesting level.
pub fn canonical_json(value: &Value) -> String {
    fn sort(value: &Value) -> Value {
        match value {
            Value::Object(map) => {
                // serde_json::Map is BTreeMap-backed by default; rebuilding
                // recursively canonicalizes nested objects inside arrays too.
                let mut out = serde_json::Map::new();
                for (k, v) in map {
                    out.insert(k.clone(), sort(v));
                }
                Value::Object(out)
            }
            Value::Array(items) => Value::Array(items.iter().map(sort).collect()),
            other => other.clone(),
        }
    }
    sort(value).to_string()
}
