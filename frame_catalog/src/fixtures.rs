//! Writes small shapefile catalogs so stage tests can run against the real
//! vector driver.

use std::path::{Path, PathBuf};

use gdal::spatial_ref::SpatialRef;
use gdal::vector::{FieldValue, Geometry, LayerAccess, OGRFieldType};
use gdal::{DriverManager, LayerOptions};

use crate::errors::CatalogResult;
use crate::models::{CornerCoordinates, ENTITY_ID_FIELD, FRAME_FIELD, GEOREFERENCE_COLUMNS};

pub const SQUARE_SIDE_DEGREES: f64 = 0.01;

#[derive(Clone, Debug)]
pub struct CatalogRow {
    pub entity_id: String,
    pub frame: u32,
    pub corners: CornerCoordinates,
}

impl CatalogRow {
    /// A north-up square footprint whose lower-left corner sits at `origin` (lon, lat).
    pub fn square(entity_id: &str, frame: u32, origin: (f64, f64)) -> CatalogRow {
        let (x, y) = origin;
        let side = SQUARE_SIDE_DEGREES;
        CatalogRow {
            entity_id: entity_id.to_string(),
            frame,
            corners: CornerCoordinates {
                upper_left: (x, y + side),
                lower_left: (x, y),
                lower_right: (x + side, y),
                upper_right: (x + side, y + side),
            },
        }
    }

    fn footprint_wkt(&self) -> String {
        let c = &self.corners;
        format!(
            "POLYGON(({} {}, {} {}, {} {}, {} {}, {} {}))",
            c.upper_left.0,
            c.upper_left.1,
            c.upper_right.0,
            c.upper_right.1,
            c.lower_right.0,
            c.lower_right.1,
            c.lower_left.0,
            c.lower_left.1,
            c.upper_left.0,
            c.upper_left.1,
        )
    }
}

/// Writes `squiggle.shp` (EPSG:4326) into `dir` and returns its path.
/// Frame numbers are stored as text, like the production catalog.
pub fn write_catalog(dir: &Path, rows: &[CatalogRow]) -> CatalogResult<PathBuf> {
    let path = dir.join("squiggle.shp");
    let columns = GEOREFERENCE_COLUMNS.ordered();

    let mut field_defs = vec![
        (ENTITY_ID_FIELD, OGRFieldType::OFTString),
        (FRAME_FIELD, OGRFieldType::OFTString),
    ];
    for pair in &columns {
        field_defs.push((pair.x, OGRFieldType::OFTReal));
        field_defs.push((pair.y, OGRFieldType::OFTReal));
    }
    let field_names: Vec<&str> = field_defs.iter().map(|(name, _)| *name).collect();

    let driver = DriverManager::get_driver_by_name("ESRI Shapefile")?;
    let mut dataset = driver.create_vector_only(&path)?;
    let srs = SpatialRef::from_epsg(4326)?;
    let mut layer = dataset.create_layer(LayerOptions {
        name: "squiggle",
        srs: Some(&srs),
        ty: gdal_sys::OGRwkbGeometryType::wkbPolygon,
        ..Default::default()
    })?;
    layer.create_defn_fields(&field_defs)?;

    for row in rows {
        let c = &row.corners;
        let points = [c.upper_left, c.lower_left, c.lower_right, c.upper_right];
        let mut values = vec![
            FieldValue::StringValue(row.entity_id.clone()),
            FieldValue::StringValue(row.frame.to_string()),
        ];
        for (x, y) in points {
            values.push(FieldValue::RealValue(x));
            values.push(FieldValue::RealValue(y));
        }

        let geometry = Geometry::from_wkt(&row.footprint_wkt())?;
        layer.create_feature_fields(geometry, &field_names, &values)?;
    }

    Ok(path)
}
