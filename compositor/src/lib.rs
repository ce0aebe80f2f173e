use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use frame_catalog::frames::{
    frame_digits, frame_file_name, group_by_frame, validate_frame, FrameMembership,
};
use frame_catalog::{
    prepare_output_dir, warped_file_name, CatalogError, FeatureCatalog, OutputPolicy,
    PipelineConfig,
};
use gdal::errors::GdalError;
use gdal::raster::{Buffer, GdalDataType};
use gdal::spatial_ref::SpatialRef;
use gdal::Dataset;
use tracing::{info, warn};
use warper::{create_gray_alpha, Grid, WarpError, ALPHA_BAND, GRAY_BAND, OPAQUE};

#[derive(thiserror::Error, Debug)]
pub enum CompositeError {
    #[error(transparent)]
    Gdal(#[from] GdalError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Warp(#[from] WarpError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("bands of {} differ in pixel type", .0.display())]
    MixedBandTypes(PathBuf),

    #[error("{} holds {found:?} pixels, composites are 8-bit", path.display())]
    UnsupportedBandType { path: PathBuf, found: GdalDataType },

    #[error("no GeoTIFF to take the output profile from in {}", .0.display())]
    NoTemplate(PathBuf),

    #[error("{} is {}x{}, composites are {}x{}", path.display(), found.0, found.1, expected.0, expected.1)]
    SizeMismatch {
        path: PathBuf,
        expected: (usize, usize),
        found: (usize, usize),
    },
}

pub type CompositeResult<T> = Result<T, CompositeError>;

/// Raster layout shared by every composite.
pub struct TemplateProfile {
    pub grid: Grid,
    pub srs: SpatialRef,
}

impl TemplateProfile {
    pub fn size(&self) -> (usize, usize) {
        (self.grid.cols, self.grid.rows)
    }
}

/// The one pixel type shared by all bands, if there is one.
pub fn uniform_band_type(types: &[GdalDataType]) -> Option<GdalDataType> {
    let (first, rest) = types.split_first()?;
    rest.iter().all(|t| t == first).then_some(*first)
}

fn first_tif(dir: &Path) -> CompositeResult<PathBuf> {
    let mut tifs = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<PathBuf>, std::io::Error>>()?;
    tifs.retain(|p| p.extension().is_some_and(|ext| ext == "tif"));
    tifs.sort();

    tifs.into_iter()
        .next()
        .ok_or_else(|| CompositeError::NoTemplate(dir.to_path_buf()))
}

/// Every fixed-grid warp has the same layout, so any of them describes the
/// composites. The lexically first one is used. Its bands must be 8-bit, the
/// only pixel type warps are written in.
pub fn template_profile(warped_dir: &Path) -> CompositeResult<TemplateProfile> {
    let path = first_tif(warped_dir)?;
    let dataset = Dataset::open(&path)?;

    let types = (1..=dataset.raster_count())
        .map(|i| Ok(dataset.rasterband(i)?.band_type()))
        .collect::<Result<Vec<GdalDataType>, GdalError>>()?;
    let band_type =
        uniform_band_type(&types).ok_or_else(|| CompositeError::MixedBandTypes(path.clone()))?;
    if band_type != GdalDataType::UInt8 {
        return Err(CompositeError::UnsupportedBandType {
            path,
            found: band_type,
        });
    }

    let (cols, rows) = dataset.raster_size();
    Ok(TemplateProfile {
        grid: Grid {
            cols,
            rows,
            geo_transform: dataset.geo_transform()?,
        },
        srs: dataset.spatial_ref()?,
    })
}

/// Values plus an "empty" mask, filled by overlaying sources in order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeBuffer {
    size: (usize, usize),
    values: Vec<u8>,
    empty: Vec<bool>,
}

impl CompositeBuffer {
    pub fn new(size: (usize, usize)) -> CompositeBuffer {
        let len = size.0 * size.1;
        CompositeBuffer {
            size,
            values: vec![0; len],
            empty: vec![true; len],
        }
    }

    /// Copies `values` wherever `alpha` is opaque. Later overlays win.
    pub fn overlay(&mut self, values: &[u8], alpha: &[u8]) {
        let pixels = self
            .values
            .iter_mut()
            .zip(self.empty.iter_mut())
            .zip(values.iter().zip(alpha));

        for ((value, empty), (src, a)) in pixels {
            if *a == OPAQUE {
                *value = *src;
                *empty = false;
            }
        }
    }

    pub fn values(&self) -> &[u8] {
        &self.values
    }

    /// 255 wherever some source was valid, 0 elsewhere.
    pub fn mask_band(&self) -> Vec<u8> {
        self.empty
            .iter()
            .map(|empty| if *empty { 0 } else { OPAQUE })
            .collect()
    }

    pub fn write_to(&self, dataset: &Dataset) -> CompositeResult<()> {
        let mut gray = dataset.rasterband(GRAY_BAND)?;
        gray.write(
            (0, 0),
            self.size,
            &Buffer {
                size: self.size,
                data: self.values.clone(),
            },
        )?;

        let mut alpha = dataset.rasterband(ALPHA_BAND)?;
        alpha.write(
            (0, 0),
            self.size,
            &Buffer {
                size: self.size,
                data: self.mask_band(),
            },
        )?;
        Ok(())
    }
}

/// Gray and alpha bands of a fixed-grid warp.
pub fn read_warped(path: &Path, profile: &TemplateProfile) -> CompositeResult<(Vec<u8>, Vec<u8>)> {
    let dataset = Dataset::open(path)?;
    let size = dataset.raster_size();
    if size != profile.size() {
        return Err(CompositeError::SizeMismatch {
            path: path.to_path_buf(),
            expected: profile.size(),
            found: size,
        });
    }

    let read = |band| -> CompositeResult<Vec<u8>> {
        Ok(dataset
            .rasterband(band)?
            .read_as::<u8>((0, 0), size, size, None)?
            .data)
    };
    Ok((read(GRAY_BAND)?, read(ALPHA_BAND)?))
}

/// The entity ID of a frame photographed only once.
pub fn lone_entity(membership: &FrameMembership) -> Option<&str> {
    match membership {
        FrameMembership::Single(entity_id) => Some(entity_id),
        FrameMembership::Pair(..) => None,
    }
}

pub fn composite_frame(
    membership: &FrameMembership,
    profile: &TemplateProfile,
    warped_dir: &Path,
    output: &Path,
) -> CompositeResult<()> {
    let mut buffer = CompositeBuffer::new(profile.size());
    for entity_id in membership.entity_ids() {
        let (values, alpha) = read_warped(&warped_dir.join(warped_file_name(entity_id)), profile)?;
        buffer.overlay(&values, &alpha);
    }

    let dataset = create_gray_alpha(output, &profile.grid, &profile.srs)?;
    buffer.write_to(&dataset)
}

/// Writes one composite per catalog frame, keyed by frame number.
pub fn composite_catalog(config: &PipelineConfig) -> CompositeResult<BTreeMap<u32, PathBuf>> {
    let outdir = config.composited_dir();
    prepare_output_dir(&outdir, OutputPolicy::Purge)?;

    let warped_dir = config.warped_fixed_dir();
    let profile = template_profile(&warped_dir)?;

    let catalog = FeatureCatalog::open(&config.catalog)?;
    let groups = group_by_frame(&catalog.features()?);
    let digits = frame_digits(&groups);

    let mut written = BTreeMap::new();
    for (frame, entity_ids) in &groups {
        let membership = validate_frame(*frame, entity_ids)?;
        if let Some(entity_id) = lone_entity(&membership) {
            warn!(frame, entity_id, "Frame has a single entity ID");
        }

        let path = outdir.join(frame_file_name(*frame, digits));
        composite_frame(&membership, &profile, &warped_dir, &path)?;
        info!(frame, path = %path.display(), "Composited frame");
        written.insert(*frame, path);
    }

    Ok(written)
}
