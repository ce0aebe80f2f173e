use std::collections::BTreeMap;

use crate::errors::{CatalogError, CatalogResult};
use crate::models::Feature;

/// Entity IDs sharing a frame, sorted ascending.
pub type FrameGroups = BTreeMap<u32, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameMembership {
    Single(String),
    Pair(String, String),
}

impl FrameMembership {
    pub fn entity_ids(&self) -> Vec<&str> {
        match self {
            FrameMembership::Single(a) => vec![a.as_str()],
            FrameMembership::Pair(a, b) => vec![a.as_str(), b.as_str()],
        }
    }
}

pub fn group_by_frame(features: &[Feature]) -> FrameGroups {
    let mut groups = FrameGroups::new();
    for feature in features {
        groups
            .entry(feature.frame)
            .or_default()
            .push(feature.entity_id.clone());
    }
    for ids in groups.values_mut() {
        ids.sort();
    }
    groups
}

/// A frame is one or two photographs of the same footprint. Anything else
/// means the catalog is not what the rest of the pipeline assumes.
pub fn validate_frame(frame: u32, entity_ids: &[String]) -> CatalogResult<FrameMembership> {
    let mut sorted = entity_ids.to_vec();
    sorted.sort();

    match sorted.as_slice() {
        [] => Err(CatalogError::EmptyFrame(frame)),
        [single] => Ok(FrameMembership::Single(single.clone())),
        [first, second] => Ok(FrameMembership::Pair(first.clone(), second.clone())),
        _ => Err(CatalogError::TooManyEntities {
            frame,
            entity_ids: sorted,
        }),
    }
}

/// Width of the largest frame number, used to zero pad output names.
pub fn frame_digits(groups: &FrameGroups) -> usize {
    groups
        .keys()
        .next_back()
        .map(|max| max.to_string().len())
        .unwrap_or(1)
}

pub fn frame_file_name(frame: u32, digits: usize) -> String {
    format!("{frame:0digits$}.tif")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(entity_id: &str, frame: u32) -> Feature {
        Feature {
            entity_id: entity_id.to_string(),
            frame,
            attributes: BTreeMap::new(),
        }
    }

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn groups_are_sorted_by_frame_and_id() {
        let features = vec![
            feature("DS1117-2059DF043", 43),
            feature("DS1117-2059DA044", 44),
            feature("DS1117-2059DA043", 43),
        ];

        let groups = group_by_frame(&features);

        assert_eq!(groups.keys().copied().collect::<Vec<_>>(), vec![43, 44]);
        assert_eq!(groups[&43], ids(&["DS1117-2059DA043", "DS1117-2059DF043"]));
    }

    #[test]
    fn three_ids_is_an_error() {
        let result = validate_frame(7, &ids(&["C", "A", "B"]));

        assert!(result.is_err_and(|e| e.to_string() == "Frame 7 has too many entity IDs: A, B, C"));
    }

    #[test]
    fn zero_ids_is_an_error() {
        let result = validate_frame(7, &[]);

        assert!(result.is_err_and(|e| matches!(e, CatalogError::EmptyFrame(7))));
    }

    #[test]
    fn one_id_is_single() {
        let result = validate_frame(7, &ids(&["A"])).expect("one id is allowed");

        assert_eq!(result, FrameMembership::Single("A".into()));
    }

    #[test]
    fn two_ids_are_ordered() {
        let result = validate_frame(7, &ids(&["B", "A"])).expect("two ids are allowed");

        assert_eq!(result, FrameMembership::Pair("A".into(), "B".into()));
        assert_eq!(result.entity_ids(), vec!["A", "B"]);
    }

    #[test]
    fn names_are_padded_to_largest_frame() {
        let mut groups = FrameGroups::new();
        groups.insert(7, ids(&["A"]));
        groups.insert(120, ids(&["B"]));

        let digits = frame_digits(&groups);

        assert_eq!(digits, 3);
        assert_eq!(frame_file_name(7, digits), "007.tif");
        assert_eq!(frame_file_name(120, digits), "120.tif");
    }
}
