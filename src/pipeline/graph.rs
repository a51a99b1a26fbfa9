//! Pipe graph arena and the push-based execution model.
//!
//! The graph owns every pipe instance in a flat `Vec<PipeSlot>` addressed by
//! [`PipeId`] indices. Execution is a single logical thread of control:
//! the source loop pulls payloads from the root and pushes each one
//! synchronously down every declared edge. Fan-out is depth-first and
//! ordered — the first downstream (and everything reachable from it) runs
//! to completion before the next sibling is invoked. There are no queues,
//! no buffering, and no reordering.
//!
//! Shutdown is a close signal that originates when the source exhausts (or
//! aborts) and cascades top-down, once per live link; a pipe's close is
//! idempotent so non-tree topologies cannot double-close.

use crate::error::{Error, Result};
use crate::pipeline::identity::IdentityHash;
use crate::pipeline::packet::SignalPacket;
use crate::pipeline::pipe::Pipe;
use crate::pipeline::role::{verify_packet, Role};
use std::collections::HashMap;
use std::fmt;

/// Index into `PipeGraph::slots`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipeId(pub u32);

impl PipeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for PipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PipeId({})", self.0)
    }
}

/// A slot holding a constructed pipe and its link state.
pub struct PipeSlot {
    pub name: String,
    pipe: Box<dyn Pipe>,
    identity: IdentityHash,
    role: Role,
    /// Downstream handles in declared order. Filled by `link`.
    downstream: Vec<PipeId>,
    /// Whether `link` has been called (possibly with an empty list).
    linked: bool,
    /// Whether this pipe has already observed a close signal.
    closed: bool,
}

/// The directed pipe graph: instance arena plus declared edges.
#[derive(Default)]
pub struct PipeGraph {
    slots: Vec<PipeSlot>,
    names: HashMap<String, PipeId>,
}

impl PipeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a constructed pipe under a unique name. The identity hash is
    /// computed once here and reused for every tag/retag.
    pub fn add_pipe(&mut self, name: impl Into<String>, pipe: Box<dyn Pipe>) -> Result<PipeId> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(Error::Config(format!("duplicate pipe name '{name}'")));
        }
        let id = PipeId(self.slots.len() as u32);
        let identity = pipe.identity();
        let role = pipe.role();
        self.slots.push(PipeSlot {
            name: name.clone(),
            pipe,
            identity,
            role,
            downstream: Vec::new(),
            linked: false,
            closed: false,
        });
        self.names.insert(name, id);
        Ok(id)
    }

    pub fn id_of(&self, name: &str) -> Option<PipeId> {
        self.names.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn name(&self, id: PipeId) -> &str {
        &self.slots[id.index()].name
    }

    pub fn role(&self, id: PipeId) -> Role {
        self.slots[id.index()].role
    }

    pub fn identity(&self, id: PipeId) -> &IdentityHash {
        &self.slots[id.index()].identity
    }

    pub fn locator(&self, id: PipeId) -> &str {
        self.slots[id.index()].pipe.locator()
    }

    pub fn params(&self, id: PipeId) -> serde_json::Value {
        self.slots[id.index()].pipe.params()
    }

    pub fn downstream(&self, id: PipeId) -> &[PipeId] {
        &self.slots[id.index()].downstream
    }

    /// Declared edges in (upstream, downstream) order.
    pub fn edges(&self) -> impl Iterator<Item = (PipeId, PipeId)> + '_ {
        self.slots.iter().enumerate().flat_map(|(i, slot)| {
            slot.downstream
                .iter()
                .map(move |&d| (PipeId(i as u32), d))
        })
    }

    /// Link `upstream` to the given downstream pipes, in order.
    ///
    /// Every candidate's role must be a member of the upstream role's
    /// `valid_downstream` set; a violation raises a [`Error::Link`] naming
    /// the offending pipe and the allowed set. Terminal pipes are linked
    /// with an empty list. Must be called before either driving loop.
    pub fn link(&mut self, upstream: PipeId, downstream: &[PipeId]) -> Result<()> {
        let allowed = self.slots[upstream.index()].role.valid_downstream();
        for &d in downstream {
            let slot = &self.slots[d.index()];
            if !allowed.contains(&slot.role) {
                return Err(Error::Link {
                    pipe: slot.name.clone(),
                    role: slot.role,
                    allowed,
                });
            }
        }

        let up = &mut self.slots[upstream.index()];
        up.downstream = downstream.to_vec();
        up.linked = true;

        tracing::debug!(
            upstream = %up.name,
            downstream = ?downstream.iter().map(|d| d.index()).collect::<Vec<_>>(),
            "linked pipe"
        );
        Ok(())
    }

    /// Reject cyclic declarations at build time (Kahn's algorithm). A cycle
    /// would recurse without bound during execution, so it is a
    /// configuration error before the first packet flows.
    pub fn ensure_acyclic(&self) -> Result<()> {
        let n = self.slots.len();
        let mut in_degree = vec![0u32; n];
        for slot in &self.slots {
            for d in &slot.downstream {
                in_degree[d.index()] += 1;
            }
        }

        let mut queue: Vec<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut scheduled = 0;
        while let Some(node) = queue.pop() {
            scheduled += 1;
            for d in &self.slots[node].downstream {
                in_degree[d.index()] -= 1;
                if in_degree[d.index()] == 0 {
                    queue.push(d.index());
                }
            }
        }

        if scheduled != n {
            return Err(Error::Config(format!(
                "pipeline topology contains a cycle ({} of {} pipes schedulable)",
                scheduled, n
            )));
        }
        Ok(())
    }

    /// The declared root: the single Interface-role pipe with no incoming
    /// edge. Zero or multiple candidates is a configuration error.
    pub fn find_root(&self) -> Result<PipeId> {
        let mut has_incoming = vec![false; self.slots.len()];
        for slot in &self.slots {
            for d in &slot.downstream {
                has_incoming[d.index()] = true;
            }
        }

        let mut roots = (0..self.slots.len())
            .filter(|&i| self.slots[i].role.is_source() && !has_incoming[i])
            .map(|i| PipeId(i as u32));

        match (roots.next(), roots.next()) {
            (Some(root), None) => Ok(root),
            (None, _) => Err(Error::Config(
                "no source pipe without incoming edges found".to_string(),
            )),
            (Some(_), Some(_)) => Err(Error::Config(
                "multiple source pipes without incoming edges found".to_string(),
            )),
        }
    }

    /// Drive `root` as the source: repeatedly obtain the next payload, tag
    /// it with the root's identity, verify it, and push it synchronously to
    /// every downstream in declared order. On exhaustion or on an
    /// unrecoverable error, cascade exactly one close per live link.
    pub fn run_source(&mut self, root: PipeId) -> Result<()> {
        if !self.slots[root.index()].linked {
            return Err(Error::Unlinked(self.slots[root.index()].name.clone()));
        }

        tracing::info!(pipe = %self.slots[root.index()].name, "starting source pipe");
        let result = self.pump(root);
        // Both exhaustion and a branch failure end in the same top-down
        // close cascade; close is idempotent per pipe.
        self.close_downstreams(root);
        if result.is_ok() {
            tracing::info!(pipe = %self.slots[root.index()].name, "source pipe exhausted");
        }
        result
    }

    fn pump(&mut self, root: PipeId) -> Result<()> {
        let identity = self.slots[root.index()].identity.clone();
        let role = self.slots[root.index()].role;
        let name = self.slots[root.index()].name.clone();
        let downstream = self.slots[root.index()].downstream.clone();

        loop {
            let payload = match self.slots[root.index()].pipe.next_payload()? {
                Some(payload) => payload,
                None => return Ok(()),
            };

            let packet = SignalPacket::tag(identity.clone(), payload);
            verify_packet(role, &name, &packet)?;

            // Depth-first ordered fan-out: each downstream subtree runs to
            // completion before the next sibling sees the packet. Each
            // sibling gets its own payload copy.
            for &d in &downstream {
                self.deliver(d, packet.clone())?;
            }
        }
    }

    /// Resume a flow pipe with one inbound packet. The packet is this
    /// branch's isolated copy; the transform may mutate it freely.
    fn deliver(&mut self, id: PipeId, packet: SignalPacket) -> Result<()> {
        let slot = &self.slots[id.index()];
        if !slot.linked {
            return Err(Error::Unlinked(slot.name.clone()));
        }

        let upstream_key = packet.key.clone();
        let output = self.slots[id.index()].pipe.process(packet)?;
        let Some(output) = output else {
            // Explicit drop: nothing forwarded, no error.
            return Ok(());
        };

        let slot = &self.slots[id.index()];
        // The output leaves under this stage's identity, not the upstream's.
        let packet = SignalPacket::tag(upstream_key, output).retag(slot.identity.clone());
        verify_packet(slot.role, &slot.name, &packet)?;

        let downstream = self.slots[id.index()].downstream.clone();
        for &d in &downstream {
            self.deliver(d, packet.clone())?;
        }
        Ok(())
    }

    fn close_downstreams(&mut self, id: PipeId) {
        let downstream = self.slots[id.index()].downstream.clone();
        for &d in &downstream {
            self.close(d);
        }
    }

    /// Propagate a close signal into `id` and onward through its live
    /// links. A second close is a no-op.
    fn close(&mut self, id: PipeId) {
        if self.slots[id.index()].closed {
            return;
        }
        self.slots[id.index()].closed = true;
        tracing::debug!(pipe = %self.slots[id.index()].name, "closing pipe");
        self.slots[id.index()].pipe.on_close();
        self.close_downstreams(id);
    }
}
