//! # NetDyn: Dynamic Network Pipeline Engine
//!
//! A dataflow execution engine for dynamic-network analysis of windowed
//! multivariate signals. Independent processing stages ("pipes") are wired
//! into a directed graph from two declarative JSON documents and data is
//! pushed through synchronously, one window at a time.
//!
//! ## Architecture
//!
//! - **Pipes**: Stages implementing the [`pipeline::Pipe`] contract, each
//!   with a fixed [`pipeline::Role`] that pins its packet schema and legal
//!   downstream roles
//! - **Graph**: An arena of constructed pipes plus declared edges, driven
//!   by a synchronous depth-first push loop ([`pipeline::PipeGraph`])
//! - **Identity**: Every packet carries the SHA-224 fingerprint of the
//!   pipe that produced it ([`pipeline::IdentityHash`])
//! - **Orchestration**: Declarative pipe-definition and topology documents
//!   resolved through a constructor registry ([`pipeline::Pipeline`],
//!   [`pipeline::PipeRegistry`])
//! - **Lineage**: One CSV record per declared edge, persisted once per run
//!   ([`pipeline::LineageLog`])
//!
//! ## Example
//!
//! ```ignore
//! use netdyn::config::{PipeDefs, Topology};
//! use netdyn::pipeline::{Pipeline, PipeRegistry};
//!
//! fn main() -> netdyn::Result<()> {
//!     let defs = PipeDefs::load("pipe_defs.json")?;
//!     let topology = Topology::load("topology.json")?;
//!
//!     let registry = PipeRegistry::with_builtins();
//!     let mut pipeline = Pipeline::build(&defs, &topology, &registry)?;
//!     pipeline.run(Some("lineage.csv".as_ref()))?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod pipes;

pub use config::{PipeDefs, Topology};
pub use error::{Error, Result};
pub use pipeline::{Pipe, PipeGraph, PipeRegistry, Pipeline, Role};
