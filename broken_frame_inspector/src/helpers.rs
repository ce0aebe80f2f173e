use std::path::PathBuf;

use frame_catalog::{
    pairs_tag, prepare_output_dir, raster_file_name, ColumnPair, CornerColumns, FeatureCatalog,
    PipelineConfig, GEOREFERENCE_COLUMNS,
};
use georeferencer::{georeference_copy, GeoreferenceResult};
use tracing::info;

/// Frames whose georeferenced output came out visibly wrong.
pub const DEFAULT_BROKEN_IDS: [&str; 24] = [
    "DS1117-2059DF054",
    "DS1117-2059DF053",
    "DS1117-2059DF052",
    "DS1117-2059DF051",
    "DS1117-2059DF050",
    "DS1117-2059DF049",
    "DS1117-2059DF048",
    "DS1117-2059DF047",
    "DS1117-2059DF046",
    "DS1117-2059DF045",
    "DS1117-2059DF044",
    "DS1117-2059DF043",
    "DS1117-2059DA053",
    "DS1117-2059DA052",
    "DS1117-2059DA051",
    "DS1117-2059DA050",
    "DS1117-2059DA049",
    "DS1117-2059DA048",
    "DS1117-2059DA047",
    "DS1117-2059DA046",
    "DS1117-2059DA045",
    "DS1117-2059DA044",
    "DS1117-2059DA043",
    "DS1117-2059DA042",
];

pub fn entity_ids_or_default(entity_ids: Vec<String>) -> Vec<String> {
    if entity_ids.is_empty() {
        DEFAULT_BROKEN_IDS.iter().map(|id| id.to_string()).collect()
    } else {
        entity_ids
    }
}

/// One cyclic shift of a column pair list. The pairs are read clockwise
/// from the upper-left pixel corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CornerRotation {
    pairs: [ColumnPair; 4],
}

impl CornerRotation {
    pub fn pairs(&self) -> &[ColumnPair; 4] {
        &self.pairs
    }

    pub fn columns(&self) -> CornerColumns {
        let [upper_left, upper_right, lower_right, lower_left] = self.pairs;
        CornerColumns {
            upper_left,
            lower_left,
            lower_right,
            upper_right,
        }
    }

    /// Pair tags in list order, so each shift gets its own name.
    pub fn tag(&self) -> String {
        pairs_tag(&self.pairs)
    }
}

/// The four cyclic shifts of the pair list of `columns`, taken in
/// upper-left, lower-left, lower-right, upper-right order.
pub fn rotations(columns: &CornerColumns) -> [CornerRotation; 4] {
    let rotate = |k: usize| {
        let mut pairs = columns.ordered();
        pairs.rotate_left(k);
        CornerRotation { pairs }
    };
    [rotate(0), rotate(1), rotate(2), rotate(3)]
}

pub fn inspection_file_name(entity_id: &str, rotation: &CornerRotation) -> String {
    format!("{entity_id}--{}.jpg", rotation.tag())
}

/// Writes one georeferenced copy per rotation for each entity.
pub fn inspect_entities(
    config: &PipelineConfig,
    entity_ids: &[String],
) -> GeoreferenceResult<Vec<PathBuf>> {
    let outdir = config.inspect_broken_dir();
    prepare_output_dir(&outdir, config.refusing_policy())?;

    let catalog = FeatureCatalog::open(&config.catalog)?;
    let raw_dir = config.raw_dir();

    let mut written = Vec::with_capacity(entity_ids.len() * 4);
    for entity_id in entity_ids {
        let feature = catalog.find_unique(entity_id)?;
        let raw = raw_dir.join(raster_file_name(entity_id));

        for rotation in rotations(&GEOREFERENCE_COLUMNS) {
            let output = outdir.join(inspection_file_name(entity_id, &rotation));
            let path = georeference_copy(&raw, &output, &feature, &rotation.columns())?;
            info!(path = %path.display(), "Georeferenced");
            written.push(path);
        }
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use frame_catalog::fixtures::{write_catalog, CatalogRow};
    use frame_catalog::CatalogError;
    use georeferencer::fixtures::write_raw_jpeg;
    use georeferencer::{read_gcps, GeoreferenceError};
    use std::collections::HashSet;

    fn setup(root: &std::path::Path) -> PipelineConfig {
        let rows = vec![
            CatalogRow::square("DS1117-2059DF054", 54, (2.0, 48.0)),
            CatalogRow::square("DS1117-2059DA053", 53, (2.01, 48.0)),
        ];
        let catalog = write_catalog(root, &rows).expect("catalog");
        let config = PipelineConfig::new(catalog, root.join("frames"));

        std::fs::create_dir_all(config.raw_dir()).expect("raw dir");
        for row in &rows {
            let raw = config.raw_dir().join(raster_file_name(&row.entity_id));
            write_raw_jpeg(&raw, 10, 10, |x, _| (x * 20) as u8).expect("raw jpeg");
        }
        config
    }

    #[test]
    fn default_list_is_the_broken_set() {
        let ids = entity_ids_or_default(Vec::new());

        assert_eq!(ids.len(), 24);
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 24);
        assert_eq!(ids[0], "DS1117-2059DF054");
        assert_eq!(ids[23], "DS1117-2059DA042");
    }

    #[test]
    fn explicit_ids_replace_defaults() {
        let ids = entity_ids_or_default(vec!["DS1117-2059DF099".to_string()]);

        assert_eq!(ids, vec!["DS1117-2059DF099".to_string()]);
    }

    #[test]
    fn first_rotation_keeps_the_pair_list() {
        let [first, ..] = rotations(&GEOREFERENCE_COLUMNS);

        assert_eq!(first.pairs(), &GEOREFERENCE_COLUMNS.ordered());
    }

    #[test]
    fn pairs_are_assigned_clockwise() {
        let [first, ..] = rotations(&GEOREFERENCE_COLUMNS);
        let columns = first.columns();

        assert_eq!(columns.upper_left, ColumnPair::new("NE Corne_3", "NE Corne_2"));
        assert_eq!(columns.upper_right, ColumnPair::new("NW Corne_2", "NW Cormer"));
        assert_eq!(columns.lower_right, ColumnPair::new("SW Corne_3", "SW Corne_2"));
        assert_eq!(columns.lower_left, ColumnPair::new("SE Corne_3", "SE Corne_2"));
    }

    #[test]
    fn rotations_shift_pairs_one_corner_at_a_time() {
        let [_, one, two, three] = rotations(&GEOREFERENCE_COLUMNS).map(|r| r.columns());

        assert_eq!(one.upper_left, GEOREFERENCE_COLUMNS.lower_left);
        assert_eq!(one.upper_right, GEOREFERENCE_COLUMNS.lower_right);
        assert_eq!(one.lower_left, GEOREFERENCE_COLUMNS.upper_left);
        assert_eq!(two.upper_left, GEOREFERENCE_COLUMNS.lower_right);
        assert_eq!(three.upper_left, GEOREFERENCE_COLUMNS.upper_right);
    }

    #[test]
    fn no_rotation_repeats_the_georeferencer_assignment() {
        assert!(rotations(&GEOREFERENCE_COLUMNS)
            .iter()
            .all(|r| r.columns() != GEOREFERENCE_COLUMNS));
    }

    #[test]
    fn file_names_are_distinct() {
        let names: HashSet<String> = rotations(&GEOREFERENCE_COLUMNS)
            .iter()
            .map(|rotation| inspection_file_name("DS1117-2059DF054", rotation))
            .collect();

        assert_eq!(names.len(), 4);
        assert!(names.contains(
            "DS1117-2059DF054--NE Corne_3--NE Corne_2__NW Corne_2--NW Cormer__SW Corne_3--SW Corne_2__SE Corne_3--SE Corne_2.jpg"
        ));
    }

    #[test]
    fn four_copies_per_entity() {
        let root = tempfile::tempdir().expect("tempdir");
        let config = setup(root.path());
        let ids = vec!["DS1117-2059DF054".to_string(), "DS1117-2059DA053".to_string()];

        let written = inspect_entities(&config, &ids).expect("inspect");

        assert_eq!(written.len(), 8);
        assert!(written.iter().all(|path| path.is_file()));
        assert_eq!(written.iter().collect::<HashSet<_>>().len(), 8);
    }

    #[test]
    fn rotated_copies_move_the_corner_coordinates() {
        let root = tempfile::tempdir().expect("tempdir");
        let config = setup(root.path());

        let written =
            inspect_entities(&config, &["DS1117-2059DF054".to_string()]).expect("inspect");

        let gcps = |path: &PathBuf| read_gcps(&gdal::Dataset::open(path).expect("open"));
        let first = gcps(&written[0]);
        let second = gcps(&written[1]);

        // The fixture's NE pair holds (2.0, 48.01) and its NW pair (2.0, 48.0).
        // GCPs come out upper-left, lower-left, lower-right, upper-right.
        assert!((first[0].y - 48.01).abs() < 1e-9);
        assert!((first[3].x - 2.0).abs() < 1e-9 && (first[3].y - 48.0).abs() < 1e-9);
        assert_eq!((first[3].pixel, first[3].line), (10.0, 0.0));
        assert!((second[0].x - 2.0).abs() < 1e-9 && (second[0].y - 48.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_entity_is_rejected() {
        let root = tempfile::tempdir().expect("tempdir");
        let config = setup(root.path());

        let result = inspect_entities(&config, &["DS1117-2059DF000".to_string()]);

        assert!(result.is_err_and(|e| matches!(
            e,
            GeoreferenceError::Catalog(CatalogError::FeatureCount { count: 0, .. })
        )));
    }

    #[test]
    fn second_run_refuses_existing_output() {
        let root = tempfile::tempdir().expect("tempdir");
        let config = setup(root.path());
        let ids = vec!["DS1117-2059DF054".to_string()];
        inspect_entities(&config, &ids).expect("first run");

        let second = inspect_entities(&config, &ids);

        assert!(second.is_err_and(|e| matches!(
            e,
            GeoreferenceError::Catalog(CatalogError::OutputExists { .. })
        )));
    }
}
