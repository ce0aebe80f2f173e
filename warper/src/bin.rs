use anyhow::Context;
use clap::Parser;
use frame_catalog::{logging, PipelineArgs, PipelineConfig};
use warper::WarpSettings;

#[derive(Parser)]
#[command(
    version,
    about,
    long_about = "Reproject georeferenced photographs onto per-image and shared UTM grids"
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
    let settings = WarpSettings::builder().build();

    warper::warp_catalog(&config, &settings)
        .with_context(|| format!("warping {}", config.georeferenced_dir().display()))?;
    Ok(())
}
