//! Built-in pipe implementations.
//!
//! Each submodule maps to a locator namespace: `randgen` (sources),
//! `preproc` (schema-preserving cleanup), `adjacency` (association
//! measures), `topo` (graph-theoretic reductions), `logger` (terminal
//! sinks). [`register_builtins`] wires every type into a
//! [`PipeRegistry`] under its `module.Class` locator.

pub mod adjacency;
pub mod logger;
pub mod preproc;
pub mod randgen;
pub mod topo;

use crate::pipeline::registry::PipeRegistry;

/// Register every built-in pipe type under its qualified locator.
pub fn register_builtins(registry: &mut PipeRegistry) {
    registry.register("randgen.MvarNoiseSource", randgen::MvarNoiseSource::from_params);
    registry.register("preproc.CommonAvgRef", preproc::CommonAvgRef::from_params);
    registry.register(
        "adjacency.PearsonCorrelation",
        adjacency::PearsonCorrelation::from_params,
    );
    registry.register("topo.GlobalMean", topo::GlobalMean::from_params);
    registry.register("topo.NodeStrength", topo::NodeStrength::from_params);
    registry.register("topo.EdgeThreshold", topo::EdgeThreshold::from_params);
    registry.register("logger.Console", logger::Console::from_params);
    registry.register("logger.JsonlCache", logger::JsonlCache::from_params);
}
