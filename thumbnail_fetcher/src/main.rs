use anyhow::Context;
use clap::Parser;
use frame_catalog::{logging, PipelineArgs, PipelineConfig};
use helpers::{default_threads, fetch_catalog, HttpThumbnailSource, DEFAULT_BASE_URL};

pub mod helpers;

/// Download the browse thumbnail of every catalog entity
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    pipeline: PipelineArgs,
    /// Server root; thumbnails live under `<base-url>/<camera code>/<entity id>.jpg`
    #[arg(long, env = "THUMBNAIL_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,
    /// Concurrent downloads, four per core by default
    #[arg(long)]
    threads: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let args = Args::parse();
    let config = PipelineConfig::from(args.pipeline);
    let source = HttpThumbnailSource::new().context("building HTTP client")?;

    let fetched = fetch_catalog(
        &config,
        &source,
        &args.base_url,
        args.threads.unwrap_or_else(default_threads),
    )
    .with_context(|| format!("downloading into {}", config.raw_dir().display()))?;

    tracing::debug!(count = fetched.len(), "Downloads finished");
    Ok(())
}
