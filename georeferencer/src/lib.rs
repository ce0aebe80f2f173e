pub mod gdal_call;
pub mod ground_control;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

use std::path::PathBuf;

use frame_catalog::{
    prepare_output_dir, raster_file_name, FeatureCatalog, PipelineConfig, GEOREFERENCE_COLUMNS,
};
use tracing::info;

pub use ground_control::{
    attach_gcps, gcp_spatial_ref, gcps_for_corners, georeference_copy, read_gcps, Gcp,
    GeoreferenceError, GeoreferenceResult,
};

/// Attaches corner GCPs to a copy of every raw photograph in the catalog.
pub fn georeference_catalog(config: &PipelineConfig) -> GeoreferenceResult<Vec<PathBuf>> {
    let outdir = config.georeferenced_dir();
    prepare_output_dir(&outdir, config.refusing_policy())?;

    let catalog = FeatureCatalog::open(&config.catalog)?;
    let raw_dir = config.raw_dir();

    catalog
        .features()?
        .iter()
        .map(|feature| {
            let filename = raster_file_name(&feature.entity_id);
            let path = georeference_copy(
                &raw_dir.join(&filename),
                &outdir.join(&filename),
                feature,
                &GEOREFERENCE_COLUMNS,
            )?;
            info!(path = %path.display(), "Georeferenced");
            Ok(path)
        })
        .collect()
}
