use std::ffi::{c_char, c_int, CString, NulError};
use std::path::{Path, PathBuf};

use frame_catalog::{CatalogError, CornerColumns, CornerCoordinates, Feature};
use gdal::errors::GdalError;
use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, GeoTransform};
use gdal_sys::{OSRAxisMappingStrategy, GDAL_GCP};

use crate::gdal_call::{check_rc, GdalCallError};

/// GCP coordinates are longitude/latitude.
pub const GCP_EPSG: u32 = 4326;

/// Unit pixel size, no rotation. Anything baked into the source image must
/// not compete with the GCPs.
pub const IDENTITY_TRANSFORM: GeoTransform = [0.0, 1.0, 0.0, 0.0, 0.0, 1.0];

#[derive(thiserror::Error, Debug)]
pub enum GeoreferenceError {
    #[error(transparent)]
    Gdal(#[from] GdalError),

    #[error(transparent)]
    GdalCall(#[from] GdalCallError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("failed to copy {} to {}: {source}", from.display(), to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Nul(#[from] NulError),
}

pub type GeoreferenceResult<T> = Result<T, GeoreferenceError>;

/// A pixel/line position tied to a plane coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gcp {
    pub pixel: f64,
    pub line: f64,
    pub x: f64,
    pub y: f64,
}

/// GCPs for the four image corners, ordered upper-left, lower-left,
/// lower-right, upper-right. Pixel positions depend only on the image size.
pub fn gcps_for_corners(corners: &CornerCoordinates, rows: usize, cols: usize) -> [Gcp; 4] {
    let rows = rows as f64;
    let cols = cols as f64;
    let gcp = |pixel: f64, line: f64, (x, y): (f64, f64)| Gcp { pixel, line, x, y };

    [
        gcp(0.0, 0.0, corners.upper_left),
        gcp(0.0, rows, corners.lower_left),
        gcp(cols, rows, corners.lower_right),
        gcp(cols, 0.0, corners.upper_right),
    ]
}

pub fn gcp_spatial_ref() -> GeoreferenceResult<SpatialRef> {
    let srs = SpatialRef::from_epsg(GCP_EPSG)?;
    srs.set_axis_mapping_strategy(OSRAxisMappingStrategy::OAMS_TRADITIONAL_GIS_ORDER);
    Ok(srs)
}

/// Stores `gcps` on the dataset. For formats without native support (JPEG)
/// GDAL keeps them in the `.aux.xml` sidecar, written when the dataset closes.
pub fn attach_gcps(dataset: &Dataset, gcps: &[Gcp], srs: &SpatialRef) -> GeoreferenceResult<()> {
    let ids = (1..=gcps.len())
        .map(|i| CString::new(i.to_string()))
        .collect::<Result<Vec<CString>, NulError>>()?;
    let info = CString::new("")?;

    let raw: Vec<GDAL_GCP> = gcps
        .iter()
        .zip(&ids)
        .map(|(gcp, id)| GDAL_GCP {
            pszId: id.as_ptr() as *mut c_char,
            pszInfo: info.as_ptr() as *mut c_char,
            dfGCPPixel: gcp.pixel,
            dfGCPLine: gcp.line,
            dfGCPX: gcp.x,
            dfGCPY: gcp.y,
            dfGCPZ: 0.0,
        })
        .collect();

    // GDAL copies the list and the spatial reference.
    let rv = unsafe {
        gdal_sys::GDALSetGCPs2(
            dataset.c_dataset(),
            raw.len() as c_int,
            raw.as_ptr(),
            srs.to_c_hsrs(),
        )
    };
    check_rc(rv, "GDALSetGCPs2")?;
    Ok(())
}

pub fn read_gcps(dataset: &Dataset) -> Vec<Gcp> {
    let (count, list) = unsafe {
        (
            gdal_sys::GDALGetGCPCount(dataset.c_dataset()),
            gdal_sys::GDALGetGCPs(dataset.c_dataset()),
        )
    };
    if count <= 0 || list.is_null() {
        return Vec::new();
    }

    unsafe { std::slice::from_raw_parts(list, count as usize) }
        .iter()
        .map(|g| Gcp {
            pixel: g.dfGCPPixel,
            line: g.dfGCPLine,
            x: g.dfGCPX,
            y: g.dfGCPY,
        })
        .collect()
}

/// Copies `raw` to `output` and attaches corner GCPs read from `feature`
/// through `columns`. Pixel data is not touched.
pub fn georeference_copy(
    raw: &Path,
    output: &Path,
    feature: &Feature,
    columns: &CornerColumns,
) -> GeoreferenceResult<PathBuf> {
    let corners = feature.corner_coordinates(columns)?;

    std::fs::copy(raw, output).map_err(|source| GeoreferenceError::Copy {
        from: raw.to_path_buf(),
        to: output.to_path_buf(),
        source,
    })?;

    let mut dataset = Dataset::open(output)?;
    let (cols, rows) = dataset.raster_size();
    let gcps = gcps_for_corners(&corners, rows, cols);

    dataset.set_geo_transform(&IDENTITY_TRANSFORM)?;
    attach_gcps(&dataset, &gcps, &gcp_spatial_ref()?)?;

    Ok(output.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::write_raw_jpeg;
    use frame_catalog::GEOREFERENCE_COLUMNS;
    use std::collections::BTreeMap;

    fn corners() -> CornerCoordinates {
        CornerCoordinates {
            upper_left: (2.0, 48.01),
            lower_left: (2.0, 48.0),
            lower_right: (2.01, 48.0),
            upper_right: (2.01, 48.01),
        }
    }

    fn feature(corners: &CornerCoordinates) -> Feature {
        let mut attributes = BTreeMap::new();
        attributes.insert("Entity ID".to_string(), "DS1117-2059DF043".to_string());
        attributes.insert("Frame".to_string(), "43".to_string());
        let points = [
            corners.upper_left,
            corners.lower_left,
            corners.lower_right,
            corners.upper_right,
        ];
        for (pair, (x, y)) in GEOREFERENCE_COLUMNS.ordered().iter().zip(points) {
            attributes.insert(pair.x.to_string(), x.to_string());
            attributes.insert(pair.y.to_string(), y.to_string());
        }
        Feature::from_attributes(attributes).expect("valid feature")
    }

    #[test]
    fn pixel_positions_are_image_corners() {
        let gcps = gcps_for_corners(&corners(), 480, 640);

        let pixels: Vec<(f64, f64)> = gcps.iter().map(|g| (g.pixel, g.line)).collect();
        assert_eq!(
            pixels,
            vec![(0.0, 0.0), (0.0, 480.0), (640.0, 480.0), (640.0, 0.0)]
        );
    }

    #[test]
    fn pixel_positions_ignore_coordinates() {
        let mut shifted = corners();
        shifted.upper_left = (-170.0, -80.0);
        shifted.lower_right = (170.0, 80.0);

        let a = gcps_for_corners(&corners(), 10, 20);
        let b = gcps_for_corners(&shifted, 10, 20);

        for (a, b) in a.iter().zip(b.iter()) {
            assert_eq!((a.pixel, a.line), (b.pixel, b.line));
        }
    }

    #[test]
    fn plane_coordinates_follow_corner_order() {
        let gcps = gcps_for_corners(&corners(), 10, 20);

        assert_eq!((gcps[0].x, gcps[0].y), (2.0, 48.01));
        assert_eq!((gcps[1].x, gcps[1].y), (2.0, 48.0));
        assert_eq!((gcps[2].x, gcps[2].y), (2.01, 48.0));
        assert_eq!((gcps[3].x, gcps[3].y), (2.01, 48.01));
    }

    #[test]
    fn georeferenced_copy_carries_gcps() {
        let dir = tempfile::tempdir().expect("tempdir");
        let raw = dir.path().join("raw.jpg");
        let output = dir.path().join("georeferenced.jpg");
        write_raw_jpeg(&raw, 40, 30, |x, _| x as u8).expect("raw jpeg");

        georeference_copy(&raw, &output, &feature(&corners()), &GEOREFERENCE_COLUMNS)
            .expect("georeference");

        let dataset = Dataset::open(&output).expect("open output");
        let gcps = read_gcps(&dataset);
        let srs = dataset.gcp_spatial_ref().expect("gcp srs");

        assert_eq!(gcps.len(), 4);
        assert_eq!((gcps[2].pixel, gcps[2].line), (40.0, 30.0));
        assert!((gcps[0].y - 48.01).abs() < 1e-12);
        assert_eq!(srs.auth_code().expect("auth code"), 4326);
    }

    #[test]
    fn raw_image_is_left_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let raw = dir.path().join("raw.jpg");
        let output = dir.path().join("georeferenced.jpg");
        write_raw_jpeg(&raw, 8, 8, |_, _| 100).expect("raw jpeg");

        georeference_copy(&raw, &output, &feature(&corners()), &GEOREFERENCE_COLUMNS)
            .expect("georeference");

        let dataset = Dataset::open(&raw).expect("open raw");
        assert!(read_gcps(&dataset).is_empty());
    }
}
