use std::collections::BTreeMap;

use crate::errors::{CatalogError, CatalogResult};

pub const ENTITY_ID_FIELD: &str = "Entity ID";
pub const FRAME_FIELD: &str = "Frame";

/// Names of the attribute columns holding one corner's x and y coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ColumnPair {
    pub x: &'static str,
    pub y: &'static str,
}

impl ColumnPair {
    pub const fn new(x: &'static str, y: &'static str) -> ColumnPair {
        ColumnPair { x, y }
    }

    /// `x--y`, used to name inspection outputs.
    pub fn tag(&self) -> String {
        format!("{}--{}", self.x, self.y)
    }
}

/// Which attribute columns feed which pixel corner of a photograph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CornerColumns {
    pub upper_left: ColumnPair,
    pub lower_left: ColumnPair,
    pub lower_right: ColumnPair,
    pub upper_right: ColumnPair,
}

/// The assignment that matches how the photographs are actually oriented.
/// The compass labels in the column names do not line up with the pixel
/// corners and must stay this way.
pub const GEOREFERENCE_COLUMNS: CornerColumns = CornerColumns {
    upper_left: ColumnPair::new("NE Corne_3", "NE Corne_2"),
    lower_left: ColumnPair::new("NW Corne_2", "NW Cormer"),
    lower_right: ColumnPair::new("SW Corne_3", "SW Corne_2"),
    upper_right: ColumnPair::new("SE Corne_3", "SE Corne_2"),
};

impl CornerColumns {
    /// Pairs ordered upper-left, lower-left, lower-right, upper-right.
    pub fn ordered(&self) -> [ColumnPair; 4] {
        [
            self.upper_left,
            self.lower_left,
            self.lower_right,
            self.upper_right,
        ]
    }
}

/// Pair tags joined by `__`, in the order given.
pub fn pairs_tag(pairs: &[ColumnPair]) -> String {
    pairs
        .iter()
        .map(ColumnPair::tag)
        .collect::<Vec<_>>()
        .join("__")
}

/// Plane coordinates of the four pixel corners, in the same order as [CornerColumns].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CornerCoordinates {
    pub upper_left: (f64, f64),
    pub lower_left: (f64, f64),
    pub lower_right: (f64, f64),
    pub upper_right: (f64, f64),
}

/// One row of the vector catalog. Attribute values are kept as text and
/// parsed on demand.
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    pub entity_id: String,
    pub frame: u32,
    pub attributes: BTreeMap<String, String>,
}

impl Feature {
    pub fn from_attributes(attributes: BTreeMap<String, String>) -> CatalogResult<Feature> {
        let entity_id = attributes
            .get(ENTITY_ID_FIELD)
            .cloned()
            .ok_or_else(|| CatalogError::MissingField {
                entity_id: String::new(),
                field: ENTITY_ID_FIELD.to_string(),
            })?;

        let frame_text = attributes
            .get(FRAME_FIELD)
            .ok_or_else(|| CatalogError::MissingField {
                entity_id: entity_id.clone(),
                field: FRAME_FIELD.to_string(),
            })?;
        let frame = frame_text
            .trim()
            .parse::<u32>()
            .map_err(|_| CatalogError::InvalidField {
                entity_id: entity_id.clone(),
                field: FRAME_FIELD.to_string(),
                value: frame_text.clone(),
            })?;

        Ok(Feature {
            entity_id,
            frame,
            attributes,
        })
    }

    pub fn value(&self, field: &str) -> CatalogResult<f64> {
        let text = self
            .attributes
            .get(field)
            .ok_or_else(|| CatalogError::MissingField {
                entity_id: self.entity_id.clone(),
                field: field.to_string(),
            })?;

        text.trim()
            .parse::<f64>()
            .map_err(|_| CatalogError::InvalidField {
                entity_id: self.entity_id.clone(),
                field: field.to_string(),
                value: text.clone(),
            })
    }

    fn point(&self, pair: &ColumnPair) -> CatalogResult<(f64, f64)> {
        Ok((self.value(pair.x)?, self.value(pair.y)?))
    }

    pub fn corner_coordinates(&self, columns: &CornerColumns) -> CatalogResult<CornerCoordinates> {
        Ok(CornerCoordinates {
            upper_left: self.point(&columns.upper_left)?,
            lower_left: self.point(&columns.lower_left)?,
            lower_right: self.point(&columns.lower_right)?,
            upper_right: self.point(&columns.upper_right)?,
        })
    }
}
