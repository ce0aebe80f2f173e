use std::path::PathBuf;

use gdal::errors::GdalError;

#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error(transparent)]
    Gdal(#[from] GdalError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{message}: {}", path.display())]
    OutputExists { path: PathBuf, message: &'static str },

    #[error("feature {entity_id:?} has no value for field {field:?}")]
    MissingField { entity_id: String, field: String },

    #[error("feature {entity_id:?} has an unusable value for field {field:?}: {value}")]
    InvalidField {
        entity_id: String,
        field: String,
        value: String,
    },

    #[error("vector source has no spatial reference: {}", .0.display())]
    MissingSpatialRef(PathBuf),

    #[error("expected exactly one feature for {entity_id}, found {count}")]
    FeatureCount { entity_id: String, count: usize },

    #[error("frame {0} has no entity IDs")]
    EmptyFrame(u32),

    #[error("Frame {frame} has too many entity IDs: {}", entity_ids.join(", "))]
    TooManyEntities { frame: u32, entity_ids: Vec<String> },
}

pub type CatalogResult<T> = Result<T, CatalogError>;
