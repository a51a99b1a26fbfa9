//! Declarative run configuration.
//!
//! Two JSON documents define a run: the pipe definitions (which pipes to
//! instantiate, by type locator, with which constructor parameters) and the
//! pipeline topology (which pipe feeds which, in order). Both are parsed
//! once and immutable thereafter.

use crate::error::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// One pipe to instantiate.
#[derive(Debug, Clone, Deserialize)]
pub struct PipeDef {
    /// Unique pipe name, referenced by the topology document.
    #[serde(rename = "PIPE_NAME")]
    pub name: String,
    /// Module part of the type locator.
    #[serde(rename = "PIPE_MODULE")]
    pub module: String,
    /// Type name within the module.
    #[serde(rename = "PIPE_CLASS")]
    pub class: String,
    /// Constructor argument mapping.
    #[serde(rename = "PIPE_PARAM", default = "empty_params")]
    pub params: Value,
}

fn empty_params() -> Value {
    Value::Object(serde_json::Map::new())
}

impl PipeDef {
    /// Full type locator used for registry lookup and identity hashing.
    pub fn locator(&self) -> String {
        format!("{}.{}", self.module, self.class)
    }
}

/// Raw pipe definitions document: either a flat list or partitioned into
/// SOURCE / FLOW / LOG groups.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PipeDefsDocument {
    Flat(Vec<PipeDef>),
    Grouped {
        #[serde(rename = "SOURCE", default)]
        source: Vec<PipeDef>,
        #[serde(rename = "FLOW", default)]
        flow: Vec<PipeDef>,
        #[serde(rename = "LOG", default)]
        log: Vec<PipeDef>,
    },
}

/// Validated pipe instantiation specification.
#[derive(Debug, Clone)]
pub struct PipeDefs {
    defs: Vec<PipeDef>,
}

impl PipeDefs {
    /// Parse and validate a pipe definitions document.
    pub fn from_json(json: &str) -> Result<Self> {
        let document: PipeDefsDocument = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("failed to parse pipe definitions: {e}")))?;

        let defs = match document {
            PipeDefsDocument::Flat(defs) => defs,
            PipeDefsDocument::Grouped { source, flow, log } => {
                let mut defs = source;
                defs.extend(flow);
                defs.extend(log);
                defs
            }
        };

        if defs.is_empty() {
            return Err(Error::Config(
                "pipe definitions document declares no pipes".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for def in &defs {
            if !seen.insert(def.name.as_str()) {
                return Err(Error::Config(format!(
                    "duplicate pipe name '{}' in pipe definitions",
                    def.name
                )));
            }
            if !def.params.is_object() {
                return Err(Error::Config(format!(
                    "PIPE_PARAM for '{}' must be an object",
                    def.name
                )));
            }
        }

        Ok(Self { defs })
    }

    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read pipe definitions {path:?}: {e}"))
        })?;
        Self::from_json(&content)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PipeDef> {
        self.defs.iter()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.defs.iter().any(|d| d.name == name)
    }
}

/// Pipeline topology: upstream pipe name → ordered downstream pipe names.
/// An empty sequence (or an absent entry) marks a terminal branch.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct Topology {
    edges: BTreeMap<String, Vec<String>>,
}

impl Topology {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("failed to parse topology: {e}")))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read topology {path:?}: {e}")))?;
        Self::from_json(&content)
    }

    /// Every name mentioned anywhere in the topology must be declared.
    pub fn validate_against(&self, defs: &PipeDefs) -> Result<()> {
        for (upstream, downstream) in &self.edges {
            if !defs.contains(upstream) {
                return Err(Error::Config(format!(
                    "topology references undeclared pipe '{upstream}'"
                )));
            }
            for name in downstream {
                if !defs.contains(name) {
                    return Err(Error::Config(format!(
                        "topology references undeclared pipe '{name}' downstream of '{upstream}'"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Declared downstream names for a pipe; empty slice if terminal.
    pub fn downstream_of(&self, name: &str) -> &[String] {
        self.edges.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.edges.iter()
    }
}
