use anyhow::Context;
use clap::Parser;
use frame_catalog::{logging, PipelineArgs, PipelineConfig};

/// Merge the fixed-grid warps of each frame into one raster per frame
///
/// The output directory is always rebuilt from scratch
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    pipeline: PipelineArgs,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let args = Args::parse();
    let config = PipelineConfig::from(args.pipeline);

    compositor::composite_catalog(&config)
        .with_context(|| format!("compositing {}", config.warped_fixed_dir().display()))?;
    Ok(())
}
