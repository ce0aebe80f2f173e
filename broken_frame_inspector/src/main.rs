use anyhow::Context;
use clap::Parser;
use frame_catalog::{logging, PipelineArgs, PipelineConfig};
use helpers::{entity_ids_or_default, inspect_entities};

pub mod helpers;

/// Georeference known-bad photographs once per corner rotation
///
/// Every rotation is written side by side for visual comparison; none is picked
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    pipeline: PipelineArgs,
    /// Entity to inspect, may be repeated. Defaults to the known broken set
    #[arg(long = "entity-id")]
    entity_ids: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let args = Args::parse();
    let config = PipelineConfig::from(args.pipeline);
    let entity_ids = entity_ids_or_default(args.entity_ids);

    inspect_entities(&config, &entity_ids)
        .with_context(|| format!("inspecting into {}", config.inspect_broken_dir().display()))?;
    Ok(())
}
