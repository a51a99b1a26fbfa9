//! Graph builder and run driver.
//!
//! Takes the two declarative documents, instantiates every declared pipe
//! through the type registry, links the graph, records lineage for every
//! declared edge, and drives the run from the declared root. The lineage
//! log is persisted exactly once, after the source loop returns.

use crate::config::{PipeDefs, Topology};
use crate::error::{Error, Result};
use crate::pipeline::graph::{PipeGraph, PipeId};
use crate::pipeline::identity::canonical_json;
use crate::pipeline::lineage::{LineageLog, LineageRecord};
use crate::pipeline::registry::PipeRegistry;
use chrono::Utc;
use std::path::Path;

/// A fully built, runnable pipeline.
pub struct Pipeline {
    graph: PipeGraph,
    lineage: LineageLog,
    root: PipeId,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Build a pipeline from its declarative documents.
    ///
    /// Pipes are all instantiated before any linking happens, so a pipe may
    /// be referenced as a downstream before its own link entry is processed;
    /// link order across independent subgraphs is unconstrained.
    pub fn build(defs: &PipeDefs, topology: &Topology, registry: &PipeRegistry) -> Result<Self> {
        topology.validate_against(defs)?;

        let mut graph = PipeGraph::new();
        for def in defs.iter() {
            let locator = def.locator();
            let pipe = registry.construct(&locator, &def.params)?;
            let id = graph.add_pipe(&def.name, pipe)?;
            tracing::debug!(pipe = %def.name, %locator, id = ?id, "instantiated pipe");
        }

        let mut lineage = LineageLog::new();
        for def in defs.iter() {
            let upstream = graph
                .id_of(&def.name)
                .expect("every declared pipe was just added");
            let downstream: Vec<PipeId> = topology
                .downstream_of(&def.name)
                .iter()
                .map(|name| {
                    graph
                        .id_of(name)
                        .expect("topology was validated against the definitions")
                })
                .collect();

            if !downstream.is_empty() {
                tracing::info!(
                    "{} ----> {:?}",
                    def.name,
                    topology.downstream_of(&def.name)
                );
            }
            graph.link(upstream, &downstream)?;

            for &d in &downstream {
                lineage.push(LineageRecord {
                    timestamp: Utc::now(),
                    downstream_name: graph.name(d).to_string(),
                    downstream_locator: graph.locator(d).to_string(),
                    downstream_params: canonical_json(&graph.params(d)),
                    upstream_hash: graph.identity(upstream).clone(),
                    downstream_hash: graph.identity(d).clone(),
                });
            }
        }

        graph.ensure_acyclic()?;
        let root = graph.find_root()?;

        Ok(Self {
            graph,
            lineage,
            root,
        })
    }

    /// The declared root pipe.
    pub fn root(&self) -> PipeId {
        self.root
    }

    pub fn graph(&self) -> &PipeGraph {
        &self.graph
    }

    pub fn lineage(&self) -> &LineageLog {
        &self.lineage
    }

    /// Drive the root's source loop to completion, then persist the lineage
    /// log (if a destination is configured) exactly once.
    ///
    /// The lineage log is written even when the run aborts: the edges were
    /// declared, and the trail is what makes the failure diagnosable.
    pub fn run(&mut self, lineage_path: Option<&Path>) -> Result<()> {
        let result = self.graph.run_source(self.root);
        if let Some(path) = lineage_path {
            self.lineage.persist(path)?;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::registry::PipeRegistry;

    const DEFS: &str = r#"{
        "SOURCE": [
            {"PIPE_NAME": "noise", "PIPE_MODULE": "randgen", "PIPE_CLASS": "MvarNoiseSource",
             "PIPE_PARAM": {"n_node": 4, "n_sample": 40, "win_width": 10, "win_shift": 10, "seed": 7}}
        ],
        "FLOW": [
            {"PIPE_NAME": "car", "PIPE_MODULE": "preproc", "PIPE_CLASS": "CommonAvgRef",
             "PIPE_PARAM": {}},
            {"PIPE_NAME": "corr", "PIPE_MODULE": "adjacency", "PIPE_CLASS": "PearsonCorrelation",
             "PIPE_PARAM": {}}
        ],
        "LOG": [
            {"PIPE_NAME": "console", "PIPE_MODULE": "logger", "PIPE_CLASS": "Console",
             "PIPE_PARAM": {"description": "adjacency"}}
        ]
    }"#;

    const TOPOLOGY: &str = r#"{
        "noise": ["car"],
        "car": ["corr"],
        "corr": ["console"]
    }"#;

    fn build() -> Pipeline {
        let defs = PipeDefs::from_json(DEFS).unwrap();
        let topology = Topology::from_json(TOPOLOGY).unwrap();
        Pipeline::build(&defs, &topology, &PipeRegistry::with_builtins()).unwrap()
    }

    #[test]
    fn test_build_records_one_lineage_record_per_edge() {
        let pipeline = build();
        assert_eq!(pipeline.lineage().len(), 3);

        let record = &pipeline.lineage().records()[0];
        assert_eq!(record.downstream_name, "car");
        assert_eq!(record.downstream_locator, "preproc.CommonAvgRef");
        let noise = pipeline.graph().id_of("noise").unwrap();
        assert_eq!(&record.upstream_hash, pipeline.graph().identity(noise));
    }

    #[test]
    fn test_root_is_the_interface_pipe() {
        let pipeline = build();
        assert_eq!(
            pipeline.graph().name(pipeline.root()),
            "noise"
        );
    }

    #[test]
    fn test_run_persists_lineage_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lineage.csv");

        let mut pipeline = build();
        pipeline.run(Some(&path)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        // Header plus one row per declared edge.
        assert_eq!(content.lines().count(), 4);
    }

    #[test]
    fn test_unknown_locator_fails_build() {
        let defs = PipeDefs::from_json(
            r#"[{"PIPE_NAME": "x", "PIPE_MODULE": "missing", "PIPE_CLASS": "Nope", "PIPE_PARAM": {}}]"#,
        )
        .unwrap();
        let topology = Topology::from_json("{}").unwrap();
        let err = Pipeline::build(&defs, &topology, &PipeRegistry::with_builtins()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_cyclic_topology_fails_build() {
        let defs = PipeDefs::from_json(
            r#"[
                {"PIPE_NAME": "noise", "PIPE_MODULE": "randgen", "PIPE_CLASS": "MvarNoiseSource",
                 "PIPE_PARAM": {"n_node": 2, "n_sample": 20, "win_width": 10, "win_shift": 10}},
                {"PIPE_NAME": "a", "PIPE_MODULE": "preproc", "PIPE_CLASS": "CommonAvgRef", "PIPE_PARAM": {}},
                {"PIPE_NAME": "b", "PIPE_MODULE": "preproc", "PIPE_CLASS": "CommonAvgRef", "PIPE_PARAM": {}}
            ]"#,
        )
        .unwrap();
        let topology =
            Topology::from_json(r#"{"noise": ["a"], "a": ["b"], "b": ["a"]}"#).unwrap();
        let err = Pipeline::build(&defs, &topology, &PipeRegistry::with_builtins()).unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }
}
