//! Role taxonomy and per-role schema verification.
//!
//! Each pipe owns exactly one [`Role`]. The role fixes two contracts:
//! which roles its output may be linked to ([`Role::valid_downstream`]) and
//! the mandatory envelope shape of packets it emits ([`verify_packet`]).
//! The taxonomy is a closed enumeration with a static role→allowed-roles
//! table — no inheritance hierarchy, no virtual lookup.

use crate::error::{Error, Result};
use crate::pipeline::packet::{AxisMeta, SignalPacket};
use serde::{Deserialize, Serialize};

/// The fixed set of pipe roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Root producer of windowed multichannel signal (samples × channels).
    Interface,
    /// Signal-conditioning transform; schema-preserving.
    Preproc,
    /// Association measure; emits a square channels × channels matrix.
    Adjacency,
    /// Network-wide aggregate; emits a 1×1 matrix.
    GlobalTopo,
    /// Per-channel aggregate; emits an n×1 column vector.
    NodeTopo,
    /// Per-edge aggregate; square matrix in, square matrix out.
    EdgeTopo,
    /// Terminal, effect-only consumer.
    Logger,
}

impl Role {
    /// The set of roles a pipe of this role may link to.
    pub fn valid_downstream(self) -> &'static [Role] {
        match self {
            Role::Interface | Role::Preproc => {
                &[Role::Preproc, Role::Adjacency, Role::Logger]
            }
            Role::Adjacency => &[
                Role::GlobalTopo,
                Role::NodeTopo,
                Role::EdgeTopo,
                Role::Logger,
            ],
            Role::GlobalTopo | Role::NodeTopo | Role::EdgeTopo => &[Role::Logger],
            Role::Logger => &[],
        }
    }

    /// Whether this role can act as the graph root.
    pub fn is_source(self) -> bool {
        matches!(self, Role::Interface)
    }

    /// Whether this role is terminal (emits nothing).
    pub fn is_terminal(self) -> bool {
        matches!(self, Role::Logger)
    }
}

/// Verify that `packet` matches the mandatory envelope shape for packets
/// emitted by a pipe of role `role`. Fails fast with a [`Error::Schema`]
/// naming the first missing or mistyped field; extra optional descriptors
/// are never an error.
pub fn verify_packet(role: Role, pipe: &str, packet: &SignalPacket) -> Result<()> {
    let schema_err = |field: &'static str, detail: String| Error::Schema {
        pipe: pipe.to_string(),
        field,
        detail,
    };

    let data = &packet.payload.data;
    let meta = &packet.payload.meta;

    let require_axis = |axis: &Option<AxisMeta>,
                        field: &'static str,
                        expected_len: usize|
     -> Result<()> {
        let axis = axis
            .as_ref()
            .ok_or_else(|| schema_err(field, "missing axis descriptor".to_string()))?;
        if axis.index.len() != expected_len {
            return Err(schema_err(
                field,
                format!(
                    "axis index length {} does not match data extent {}",
                    axis.index.len(),
                    expected_len
                ),
            ));
        }
        Ok(())
    };

    let require_time = || -> Result<()> {
        if meta.time.is_none() {
            return Err(schema_err("meta.time", "missing time descriptor".to_string()));
        }
        Ok(())
    };

    match role {
        Role::Interface | Role::Preproc => {
            if data.rows() == 0 || data.cols() == 0 {
                return Err(schema_err(
                    "data",
                    format!("expected samples x channels, got {}x{}", data.rows(), data.cols()),
                ));
            }
            require_axis(&meta.axis0, "meta.ax_0", data.rows())?;
            require_axis(&meta.axis1, "meta.ax_1", data.cols())?;
        }
        Role::Adjacency | Role::EdgeTopo => {
            if !data.is_square() || data.rows() == 0 {
                return Err(schema_err(
                    "data",
                    format!(
                        "expected square channels x channels, got {}x{}",
                        data.rows(),
                        data.cols()
                    ),
                ));
            }
            require_axis(&meta.axis0, "meta.ax_0", data.rows())?;
            require_axis(&meta.axis1, "meta.ax_1", data.cols())?;
            require_time()?;
        }
        Role::GlobalTopo => {
            if data.rows() != 1 || data.cols() != 1 {
                return Err(schema_err(
                    "data",
                    format!("expected 1x1 global measurement, got {}x{}", data.rows(), data.cols()),
                ));
            }
            require_time()?;
        }
        Role::NodeTopo => {
            if data.cols() != 1 || data.rows() == 0 {
                return Err(schema_err(
                    "data",
                    format!("expected channels x 1 column vector, got {}x{}", data.rows(), data.cols()),
                ));
            }
            require_axis(&meta.axis0, "meta.ax_0", data.rows())?;
            require_time()?;
        }
        // A logger accepts anything shaped as a single-key envelope, which
        // holds by construction.
        Role::Logger => {}
    }

    Ok(())
}
