//! The dataflow execution engine.
//!
//! Independently-implemented processing stages ("pipes") are wired into a
//! directed graph and data is pushed through it synchronously:
//!
//! ```text
//! [Interface] ──► [Preproc] ──► [Adjacency] ──► [NodeTopo] ──► [Logger]
//!                          └──► [Logger]   └──► [Logger]
//! ```
//!
//! # Design
//!
//! - **Closed role taxonomy** — [`role::Role`] plus a static
//!   role→allowed-roles table; each boundary is schema-verified.
//! - **Single-key envelopes** — every packet carries exactly one identity
//!   key mapping to its payload ([`packet::SignalPacket`]).
//! - **Content-derived identity** — SHA-224 over type locator + canonical
//!   parameter serialization ([`identity::IdentityHash`]).
//! - **Synchronous push** — one logical thread; depth-first ordered
//!   fan-out, no queues, no async runtime ([`graph::PipeGraph`]).
//! - **Declarative builds** — pipes and topology come from JSON documents,
//!   resolved through a registered constructor table
//!   ([`orchestrator::Pipeline`], [`registry::PipeRegistry`]).
//! - **Lineage** — one record per declared edge, persisted once per run
//!   ([`lineage::LineageLog`]).

pub mod graph;
pub mod identity;
pub mod lineage;
pub mod orchestrator;
pub mod packet;
pub mod pipe;
pub mod registry;
pub mod role;

pub use graph::{PipeGraph, PipeId};
pub use identity::IdentityHash;
pub use lineage::{LineageLog, LineageRecord};
pub use orchestrator::Pipeline;
pub use packet::{AxisIndex, AxisMeta, Matrix, Metadata, Payload, SignalPacket, TimeMeta};
pub use pipe::Pipe;
pub use registry::{PipeConstructor, PipeRegistry};
pub use role::{verify_packet, Role};
