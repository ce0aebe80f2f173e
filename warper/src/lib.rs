pub mod grid;
pub mod warp;

use std::path::PathBuf;

use frame_catalog::{
    prepare_output_dir, raster_file_name, warped_file_name, FeatureCatalog, PipelineConfig,
};
use tracing::{debug, info};

pub use grid::{mean_resolution, Grid, Resolution};
pub use warp::{
    creation_options, create_gray_alpha, estimate_resolution, warp_fixed, warp_naive, WarpError,
    WarpResult, WarpSettings, WarpSettingsBuilder, ALPHA_BAND, GRAY_BAND, OPAQUE,
};

/// Paths written by one [warp_catalog] run, in catalog order.
#[derive(Debug, Default)]
pub struct WarpedOutputs {
    pub naive: Vec<PathBuf>,
    pub fixed: Vec<PathBuf>,
}

/// Warps every georeferenced image twice: onto its own footprint and onto
/// the grid covering the whole catalog.
pub fn warp_catalog(config: &PipelineConfig, settings: &WarpSettings) -> WarpResult<WarpedOutputs> {
    let naive_dir = config.warped_naive_dir();
    let fixed_dir = config.warped_fixed_dir();
    prepare_output_dir(&naive_dir, config.refusing_policy())?;
    prepare_output_dir(&fixed_dir, config.refusing_policy())?;

    let catalog = FeatureCatalog::open(&config.catalog)?;
    let entity_ids = catalog.entity_ids()?;
    let georeferenced_dir = config.georeferenced_dir();
    let sources: Vec<PathBuf> = entity_ids
        .iter()
        .map(|id| georeferenced_dir.join(raster_file_name(id)))
        .collect();

    let resolution = estimate_resolution(&sources, settings)?;
    let bounds = catalog.bounds_in(&settings.target_srs()?)?;
    let grid = Grid::covering(&bounds, resolution);
    debug!(
        xres = resolution.x,
        yres = resolution.y,
        cols = grid.cols,
        rows = grid.rows,
        "Fixed grid"
    );

    let mut outputs = WarpedOutputs::default();
    for (entity_id, source) in entity_ids.iter().zip(&sources) {
        let filename = warped_file_name(entity_id);

        let naive = naive_dir.join(&filename);
        warp_naive(source, &naive, resolution, settings)?;
        info!(path = %naive.display(), "Warped");
        outputs.naive.push(naive);

        let fixed = fixed_dir.join(&filename);
        warp_fixed(source, &fixed, &grid, settings)?;
        info!(path = %fixed.display(), "Warped");
        outputs.fixed.push(fixed);
    }

    Ok(outputs)
}
