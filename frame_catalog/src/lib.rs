pub mod catalog;
pub mod config;
pub mod errors;
pub mod frames;
pub mod logging;
pub mod models;
pub mod output_dir;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use catalog::{Bounds, FeatureCatalog};
pub use config::{raster_file_name, warped_file_name, PipelineArgs, PipelineConfig};
pub use errors::{CatalogError, CatalogResult};
pub use models::{
    pairs_tag, ColumnPair, CornerColumns, CornerCoordinates, Feature, GEOREFERENCE_COLUMNS,
};
pub use output_dir::{prepare_output_dir, OutputPolicy};
