use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use gdal::spatial_ref::{CoordTransform, SpatialRef};
use gdal::vector::{FieldValue, LayerAccess};
use gdal::Dataset;
use gdal_sys::OSRAxisMappingStrategy;
use tracing::debug;

use crate::errors::{CatalogError, CatalogResult};
use crate::models::Feature;

/// Points added along each edge when reprojecting an extent.
const DENSIFY_POINTS: i32 = 21;

/// An axis aligned extent `(xmin, ymin, xmax, ymax)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }
}

/// The vector source every stage reads: one feature per photograph.
pub struct FeatureCatalog {
    path: PathBuf,
    dataset: Dataset,
}

impl FeatureCatalog {
    pub fn open<P: AsRef<Path>>(path: P) -> CatalogResult<FeatureCatalog> {
        let path = path.as_ref().to_path_buf();
        let dataset = Dataset::open(&path)?;
        Ok(FeatureCatalog { path, dataset })
    }

    /// All features in source order.
    pub fn features(&self) -> CatalogResult<Vec<Feature>> {
        let mut layer = self.dataset.layer(0)?;

        let features = layer
            .features()
            .map(|feature| {
                let attributes = feature
                    .fields()
                    .filter_map(|(name, value)| value.and_then(field_text).map(|v| (name, v)))
                    .collect::<BTreeMap<String, String>>();
                Feature::from_attributes(attributes)
            })
            .collect::<CatalogResult<Vec<Feature>>>()?;

        debug!(count = features.len(), path = %self.path.display(), "read catalog");
        Ok(features)
    }

    pub fn entity_ids(&self) -> CatalogResult<Vec<String>> {
        Ok(self
            .features()?
            .into_iter()
            .map(|f| f.entity_id)
            .collect())
    }

    /// The one feature carrying `entity_id`. Zero or several matches mean the
    /// catalog is corrupt.
    pub fn find_unique(&self, entity_id: &str) -> CatalogResult<Feature> {
        let mut matches: Vec<Feature> = self
            .features()?
            .into_iter()
            .filter(|f| f.entity_id == entity_id)
            .collect();

        match matches.len() {
            1 => Ok(matches.remove(0)),
            count => Err(CatalogError::FeatureCount {
                entity_id: entity_id.to_string(),
                count,
            }),
        }
    }

    /// Extent of the whole layer, reprojected into `target`.
    pub fn bounds_in(&self, target: &SpatialRef) -> CatalogResult<Bounds> {
        let layer = self.dataset.layer(0)?;
        let envelope = layer.get_extent()?;
        let source = layer
            .spatial_ref()
            .ok_or_else(|| CatalogError::MissingSpatialRef(self.path.clone()))?;

        source.set_axis_mapping_strategy(OSRAxisMappingStrategy::OAMS_TRADITIONAL_GIS_ORDER);
        target.set_axis_mapping_strategy(OSRAxisMappingStrategy::OAMS_TRADITIONAL_GIS_ORDER);

        let transform = CoordTransform::new(&source, target)?;
        let [xmin, ymin, xmax, ymax] = transform.transform_bounds(
            &[envelope.MinX, envelope.MinY, envelope.MaxX, envelope.MaxY],
            DENSIFY_POINTS,
        )?;

        Ok(Bounds {
            xmin,
            ymin,
            xmax,
            ymax,
        })
    }
}

fn field_text(value: FieldValue) -> Option<String> {
    match value {
        FieldValue::StringValue(s) => Some(s),
        FieldValue::IntegerValue(v) => Some(v.to_string()),
        FieldValue::Integer64Value(v) => Some(v.to_string()),
        FieldValue::RealValue(v) => Some(v.to_string()),
        _ => None,
    }
}
