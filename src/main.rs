//! NetDyn pipeline runner - Main Entry Point
//!
//! Builds a pipeline from a pipe-definition document and a topology
//! document, runs it to exhaustion, and optionally persists the lineage
//! log as CSV.

use anyhow::{bail, Context};
use netdyn::config::{PipeDefs, Topology};
use netdyn::pipeline::{PipeRegistry, Pipeline};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

struct Args {
    pipe_defs: PathBuf,
    topology: PathBuf,
    lineage: Option<PathBuf>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut positional = Vec::new();
    let mut lineage = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--lineage" => {
                let Some(path) = args.next() else {
                    bail!("--lineage requires a path argument");
                };
                lineage = Some(PathBuf::from(path));
            }
            "--help" | "-h" => {
                eprintln!("Usage: netdyn <pipe_defs.json> <topology.json> [--lineage <path>]");
                std::process::exit(0);
            }
            other => positional.push(PathBuf::from(other)),
        }
    }

    let [pipe_defs, topology] = <[PathBuf; 2]>::try_from(positional)
        .map_err(|_| anyhow::anyhow!(
            "expected exactly two positional arguments: <pipe_defs.json> <topology.json>"
        ))?;

    Ok(Args {
        pipe_defs,
        topology,
        lineage,
    })
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,netdyn=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = parse_args()?;

    tracing::info!("Starting NetDyn pipeline runner");

    let defs = PipeDefs::load(&args.pipe_defs)
        .with_context(|| format!("loading pipe definitions from {:?}", args.pipe_defs))?;
    let topology = Topology::load(&args.topology)
        .with_context(|| format!("loading topology from {:?}", args.topology))?;

    let registry = PipeRegistry::with_builtins();
    let mut pipeline = Pipeline::build(&defs, &topology, &registry)?;
    tracing::info!(
        pipes = pipeline.graph().len(),
        root = pipeline.graph().name(pipeline.root()),
        "pipeline built"
    );

    pipeline.run(args.lineage.as_deref())?;

    tracing::info!("Pipeline run complete");
    Ok(())
}
