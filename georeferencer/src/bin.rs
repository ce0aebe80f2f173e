use anyhow::Context;
use clap::Parser;
use frame_catalog::{logging, PipelineArgs, PipelineConfig};

#[derive(Parser)]
#[command(
    version,
    about,
    long_about = "Attach corner ground control points to every downloaded photograph"
)]
struct Args {
    #[command(flatten)]
    pipeline: PipelineArgs,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let args = Args::parse();
    let config = PipelineConfig::from(args.pipeline);

    georeferencer::georeference_catalog(&config)
        .with_context(|| format!("georeferencing {}", config.catalog.display()))?;
    Ok(())
}
