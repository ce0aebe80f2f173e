use std::ffi::{c_int, c_void};
use std::path::{Path, PathBuf};
use std::ptr::null_mut;

use frame_catalog::CatalogError;
use gdal::cpl::CslStringList;
use gdal::errors::GdalError;
use gdal::raster::{Buffer, ColorInterpretation, RasterCreationOption};
use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, DriverManager, GeoTransform};
use gdal_sys::{GDALResampleAlg, OSRAxisMappingStrategy};
use georeferencer::gdal_call::{check_pointer, check_rc, last_error_message, GdalCallError};
use georeferencer::{attach_gcps, gcp_spatial_ref, read_gcps, GeoreferenceError};

use crate::grid::{mean_resolution, Grid, Resolution};

/// UTM zone 31N, the projected system every warp lands in.
pub const TARGET_EPSG: u32 = 32631;

pub const GRAY_BAND: isize = 1;
pub const ALPHA_BAND: isize = 2;
pub const OPAQUE: u8 = u8::MAX;

#[derive(thiserror::Error, Debug)]
pub enum WarpError {
    #[error(transparent)]
    Gdal(#[from] GdalError),

    #[error(transparent)]
    GdalCall(#[from] GdalCallError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Georeference(#[from] GeoreferenceError),

    #[error("CRS mismatch in {}: {found} != EPSG:{expected}", path.display())]
    CrsMismatch {
        path: PathBuf,
        found: String,
        expected: u32,
    },

    #[error("no georeferenced images to estimate a resolution from")]
    NoImages,
}

pub type WarpResult<T> = Result<T, WarpError>;

#[derive(Debug, Clone, PartialEq)]
pub struct WarpSettings {
    pub target_epsg: u32,
    pub resampling: GDALResampleAlg::Type,
}

impl WarpSettings {
    pub fn builder() -> WarpSettingsBuilder {
        WarpSettingsBuilder::default()
    }

    pub fn target_srs(&self) -> WarpResult<SpatialRef> {
        let srs = SpatialRef::from_epsg(self.target_epsg)?;
        srs.set_axis_mapping_strategy(OSRAxisMappingStrategy::OAMS_TRADITIONAL_GIS_ORDER);
        Ok(srs)
    }
}

#[derive(Default)]
pub struct WarpSettingsBuilder {
    pub target_epsg: Option<u32>,
    pub resampling: Option<GDALResampleAlg::Type>,
}

impl WarpSettingsBuilder {
    pub fn new() -> WarpSettingsBuilder {
        WarpSettingsBuilder::default()
    }

    pub fn set_target_epsg(mut self, epsg: u32) -> WarpSettingsBuilder {
        self.target_epsg = Some(epsg);
        self
    }

    pub fn set_resampling(mut self, resampling: GDALResampleAlg::Type) -> WarpSettingsBuilder {
        self.resampling = Some(resampling);
        self
    }

    pub fn build(self) -> WarpSettings {
        WarpSettings {
            target_epsg: self.target_epsg.unwrap_or(TARGET_EPSG),
            resampling: self.resampling.unwrap_or(GDALResampleAlg::GRA_Cubic),
        }
    }
}

pub fn creation_options() -> Vec<RasterCreationOption<'static>> {
    vec![
        RasterCreationOption {
            key: "COMPRESS",
            value: "DEFLATE",
        },
        RasterCreationOption {
            key: "PREDICTOR",
            value: "2",
        },
        RasterCreationOption {
            key: "TILED",
            value: "YES",
        },
    ]
}

/// Generic image-to-image transformer driven by the source GCPs.
struct GcpTransformer(*mut c_void);

impl GcpTransformer {
    fn options(dst_srs: Option<&SpatialRef>) -> WarpResult<CslStringList> {
        let mut options = CslStringList::new();
        options.set_name_value("SRC_METHOD", "GCP_POLYNOMIAL")?;
        if let Some(srs) = dst_srs {
            options.set_name_value("DST_SRS", &srs.to_wkt()?)?;
        }
        Ok(options)
    }

    /// Source pixels to `dst_srs` coordinates.
    fn to_srs(src: &Dataset, dst_srs: &SpatialRef) -> WarpResult<GcpTransformer> {
        let options = Self::options(Some(dst_srs))?;
        let ptr = unsafe {
            gdal_sys::GDALCreateGenImgProjTransformer2(src.c_dataset(), null_mut(), options.as_ptr())
        };
        Ok(GcpTransformer(check_pointer(ptr, "GDALCreateGenImgProjTransformer2")?))
    }

    /// Source pixels to destination pixels.
    fn between(src: &Dataset, dst: &Dataset) -> WarpResult<GcpTransformer> {
        let options = Self::options(None)?;
        let ptr = unsafe {
            gdal_sys::GDALCreateGenImgProjTransformer2(
                src.c_dataset(),
                dst.c_dataset(),
                options.as_ptr(),
            )
        };
        Ok(GcpTransformer(check_pointer(ptr, "GDALCreateGenImgProjTransformer2")?))
    }
}

impl Drop for GcpTransformer {
    fn drop(&mut self) {
        unsafe {
            gdal_sys::GDALDestroyGenImgProjTransformer(self.0);
        }
    }
}

/// The grid GDAL would pick for warping `src` into `dst_srs` unconstrained.
pub fn suggested_output(src: &Dataset, dst_srs: &SpatialRef) -> WarpResult<Grid> {
    let transformer = GcpTransformer::to_srs(src, dst_srs)?;
    let mut geo_transform: GeoTransform = [0.0; 6];
    let mut cols: c_int = 0;
    let mut rows: c_int = 0;

    let rv = unsafe {
        gdal_sys::GDALSuggestedWarpOutput(
            src.c_dataset(),
            Some(gdal_sys::GDALGenImgProjTransform),
            transformer.0,
            geo_transform.as_mut_ptr(),
            &mut cols,
            &mut rows,
        )
    };
    check_rc(rv, "GDALSuggestedWarpOutput")?;

    Ok(Grid {
        cols: cols.max(0) as usize,
        rows: rows.max(0) as usize,
        geo_transform,
    })
}

fn describe(srs: &SpatialRef) -> String {
    srs.authority()
        .or_else(|_| srs.to_proj4())
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Everything downstream assumes longitude/latitude GCPs.
pub fn check_gcp_crs(dataset: &Dataset, path: &Path) -> WarpResult<()> {
    let expected = gcp_spatial_ref()?;
    match dataset.gcp_spatial_ref() {
        Some(found) if found == expected => Ok(()),
        found => Err(WarpError::CrsMismatch {
            path: path.to_path_buf(),
            found: found.as_ref().map(describe).unwrap_or_else(|| "none".to_string()),
            expected: georeferencer::ground_control::GCP_EPSG,
        }),
    }
}

/// One cell size shared by every warp: the mean of each image's suggested resolution.
pub fn estimate_resolution(paths: &[PathBuf], settings: &WarpSettings) -> WarpResult<Resolution> {
    let target = settings.target_srs()?;

    let resolutions = paths
        .iter()
        .map(|path| {
            let dataset = Dataset::open(path)?;
            check_gcp_crs(&dataset, path)?;
            Ok(suggested_output(&dataset, &target)?.resolution())
        })
        .collect::<WarpResult<Vec<Resolution>>>()?;

    mean_resolution(&resolutions).ok_or(WarpError::NoImages)
}

/// Gray band plus a fully opaque alpha band, carrying the source GCPs.
/// Zero is a valid gray value, so voids can only be told apart through alpha.
pub fn read_with_alpha(src: &Dataset, path: &Path) -> WarpResult<Dataset> {
    check_gcp_crs(src, path)?;

    let (cols, rows) = src.raster_size();
    let gray = src
        .rasterband(GRAY_BAND)?
        .read_as::<u8>((0, 0), (cols, rows), (cols, rows), None)?;

    let mem = DriverManager::get_driver_by_name("MEM")?;
    let dataset = mem.create_with_band_type::<u8, _>("", cols as isize, rows as isize, 2)?;

    let mut gray_band = dataset.rasterband(GRAY_BAND)?;
    gray_band.write((0, 0), (cols, rows), &gray)?;

    let mut alpha_band = dataset.rasterband(ALPHA_BAND)?;
    alpha_band.write(
        (0, 0),
        (cols, rows),
        &Buffer {
            size: (cols, rows),
            data: vec![OPAQUE; cols * rows],
        },
    )?;

    attach_gcps(&dataset, &read_gcps(src), &gcp_spatial_ref()?)?;

    Ok(dataset)
}

/// Creates the 8-bit gray/alpha GeoTIFF every warp and composite is written to.
pub fn create_gray_alpha(path: &Path, grid: &Grid, srs: &SpatialRef) -> WarpResult<Dataset> {
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let mut dataset = driver.create_with_band_type_with_options::<u8, _>(
        path,
        grid.cols as isize,
        grid.rows as isize,
        2,
        &creation_options(),
    )?;
    dataset.set_geo_transform(&grid.geo_transform)?;
    dataset.set_spatial_ref(srs)?;

    dataset
        .rasterband(GRAY_BAND)?
        .set_color_interpretation(ColorInterpretation::GrayIndex)?;
    dataset
        .rasterband(ALPHA_BAND)?
        .set_color_interpretation(ColorInterpretation::AlphaBand)?;

    Ok(dataset)
}

/// Warps the gray band of `src` into `dst`, with GDAL writing destination
/// alpha wherever source pixels land.
fn warp_into(src: &Dataset, dst: &Dataset, settings: &WarpSettings) -> WarpResult<()> {
    let transformer = GcpTransformer::between(src, dst)?;
    let (cols, rows) = dst.raster_size();

    let mut str_options = CslStringList::new();
    str_options.set_name_value("INIT_DEST", "0")?;

    unsafe {
        let warp_options = check_pointer(gdal_sys::GDALCreateWarpOptions(), "GDALCreateWarpOptions")?;
        (*warp_options).papszWarpOptions = gdal_sys::CSLDuplicate(str_options.as_ptr());
        (*warp_options).hSrcDS = src.c_dataset();
        (*warp_options).hDstDS = dst.c_dataset();
        (*warp_options).nBandCount = 1;
        (*warp_options).panSrcBands = gdal_sys::CPLMalloc(std::mem::size_of::<c_int>()).cast::<c_int>();
        (*warp_options).panSrcBands.write(GRAY_BAND as c_int);
        (*warp_options).panDstBands = gdal_sys::CPLMalloc(std::mem::size_of::<c_int>()).cast::<c_int>();
        (*warp_options).panDstBands.write(GRAY_BAND as c_int);
        (*warp_options).nSrcAlphaBand = ALPHA_BAND as c_int;
        (*warp_options).nDstAlphaBand = ALPHA_BAND as c_int;
        (*warp_options).eResampleAlg = settings.resampling;
        (*warp_options).pfnTransformer = Some(gdal_sys::GDALGenImgProjTransform);
        (*warp_options).pTransformerArg = transformer.0;

        let operation = gdal_sys::GDALCreateWarpOperation(warp_options);
        let rv = if operation.is_null() {
            None
        } else {
            let rv = gdal_sys::GDALChunkAndWarpImage(operation, 0, 0, cols as c_int, rows as c_int);
            gdal_sys::GDALDestroyWarpOperation(operation);
            Some(rv)
        };

        // The transformer belongs to `transformer` and is freed on drop.
        (*warp_options).pTransformerArg = null_mut();
        gdal_sys::GDALDestroyWarpOptions(warp_options);

        match rv {
            Some(rv) => check_rc(rv, "GDALChunkAndWarpImage")?,
            None => {
                return Err(GdalCallError {
                    call: "GDALCreateWarpOperation",
                    msg: last_error_message(),
                }
                .into())
            }
        }
    }

    Ok(())
}

/// Warps onto a grid fitted to the image's own footprint at `resolution`.
pub fn warp_naive(
    georeferenced: &Path,
    output: &Path,
    resolution: Resolution,
    settings: &WarpSettings,
) -> WarpResult<Grid> {
    let src = Dataset::open(georeferenced)?;
    let target = settings.target_srs()?;

    let footprint = suggested_output(&src, &target)?.bounds();
    let grid = Grid::fitting(&footprint, resolution);

    let source = read_with_alpha(&src, georeferenced)?;
    let dst = create_gray_alpha(output, &grid, &target)?;
    warp_into(&source, &dst, settings)?;

    Ok(grid)
}

/// Warps onto the grid shared by every image, so outputs line up pixel for pixel.
pub fn warp_fixed(
    georeferenced: &Path,
    output: &Path,
    grid: &Grid,
    settings: &WarpSettings,
) -> WarpResult<()> {
    let src = Dataset::open(georeferenced)?;
    let target = settings.target_srs()?;

    let source = read_with_alpha(&src, georeferenced)?;
    let dst = create_gray_alpha(output, grid, &target)?;
    warp_into(&source, &dst, settings)
}
