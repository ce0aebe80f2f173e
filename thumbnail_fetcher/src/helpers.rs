use std::collections::BTreeMap;
use std::fs::File;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use frame_catalog::{
    prepare_output_dir, raster_file_name, CatalogError, FeatureCatalog, OutputPolicy,
    PipelineConfig,
};
#[cfg(test)]
use mockall::automock;
use rayon::prelude::*;
use rayon::{ThreadPoolBuildError, ThreadPoolBuilder};
use tracing::info;

pub const DEFAULT_BASE_URL: &str = "https://ims.cr.usgs.gov/browse/DIT/1117-2/059D";

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Pool(#[from] ThreadPoolBuildError),

    #[error("entity ID {0} carries no camera code")]
    InvalidEntityId(String),
}

pub type FetchResult<T> = Result<T, FetchError>;

/// Camera position of a photograph: the character right after the first `D`
/// that follows the first `-`. `F` is forward, `A` is aft.
pub fn camera_code(entity_id: &str) -> FetchResult<char> {
    let invalid = || FetchError::InvalidEntityId(entity_id.to_string());

    let (_, mission) = entity_id.split_once('-').ok_or_else(invalid)?;
    let (_, code) = mission.split_once('D').ok_or_else(invalid)?;
    code.chars().next().ok_or_else(invalid)
}

pub fn thumbnail_url(base_url: &str, entity_id: &str) -> FetchResult<String> {
    let code = camera_code(entity_id)?;
    Ok(format!(
        "{}/{code}/{entity_id}.jpg",
        base_url.trim_end_matches('/')
    ))
}

/// Four downloads per core; the work is network bound.
pub fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
        * 4
}

#[cfg_attr(test, automock)]
pub trait ThumbnailSource: Sync {
    /// Stores the body found at `url` in `dest`, returning the number of bytes written.
    fn fetch_to(&self, url: &str, dest: &Path) -> FetchResult<u64>;
}

pub struct HttpThumbnailSource {
    client: reqwest::blocking::Client,
}

impl HttpThumbnailSource {
    pub fn new() -> FetchResult<HttpThumbnailSource> {
        let client = reqwest::blocking::Client::builder().build()?;
        Ok(HttpThumbnailSource { client })
    }
}

impl ThumbnailSource for HttpThumbnailSource {
    fn fetch_to(&self, url: &str, dest: &Path) -> FetchResult<u64> {
        let mut response = self.client.get(url).send()?.error_for_status()?;
        let mut file = File::create(dest)?;
        Ok(response.copy_to(&mut file)?)
    }
}

/// Downloads every thumbnail into `raw_dir`. The first failure aborts the run.
pub fn download_all<S: ThumbnailSource>(
    source: &S,
    entity_ids: &[String],
    base_url: &str,
    raw_dir: &Path,
    threads: usize,
) -> FetchResult<BTreeMap<String, PathBuf>> {
    let pool = ThreadPoolBuilder::new().num_threads(threads).build()?;

    pool.install(|| {
        entity_ids
            .par_iter()
            .map(|entity_id| -> FetchResult<(String, PathBuf)> {
                let url = thumbnail_url(base_url, entity_id)?;
                let dest = raw_dir.join(raster_file_name(entity_id));
                let bytes = source.fetch_to(&url, &dest)?;
                info!(path = %dest.display(), bytes, "Downloaded");
                Ok((entity_id.clone(), dest))
            })
            .collect()
    })
}

/// Fetches the thumbnail of every catalog entity. Existing downloads in the
/// raw directory are kept and overwritten file by file.
pub fn fetch_catalog<S: ThumbnailSource>(
    config: &PipelineConfig,
    source: &S,
    base_url: &str,
    threads: usize,
) -> FetchResult<BTreeMap<String, PathBuf>> {
    let raw_dir = config.raw_dir();
    prepare_output_dir(&raw_dir, OutputPolicy::Reuse)?;

    let entity_ids = FeatureCatalog::open(&config.catalog)?.entity_ids()?;
    download_all(source, &entity_ids, base_url, &raw_dir, threads)
}
