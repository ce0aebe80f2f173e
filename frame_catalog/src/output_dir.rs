use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::errors::{CatalogError, CatalogResult};

/// What a stage does when its output directory is already there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputPolicy {
    /// Fail without touching anything. The directory may have been edited
    /// by hand and its state is unknown.
    Refuse,
    /// Delete the directory tree and start over.
    Purge,
    /// Keep whatever is there.
    Reuse,
}

pub const OUTPUT_EXISTS_MESSAGE: &str = "Target directory exists - data could be in a weird state";

pub fn prepare_output_dir(path: &Path, policy: OutputPolicy) -> CatalogResult<()> {
    let exists = path.exists();

    match policy {
        OutputPolicy::Refuse if exists => {
            return Err(CatalogError::OutputExists {
                path: path.to_path_buf(),
                message: OUTPUT_EXISTS_MESSAGE,
            })
        }
        OutputPolicy::Purge if exists => {
            warn!(path = %path.display(), "removing existing output directory");
            fs::remove_dir_all(path)?;
        }
        _ => {}
    }

    fs::create_dir_all(path)?;
    debug!(path = %path.display(), ?policy, "output directory ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refuse_creates_missing_directory() {
        let root = tempfile::tempdir().expect("tempdir");
        let target = root.path().join("frames").join("georeferenced");

        prepare_output_dir(&target, OutputPolicy::Refuse).expect("fresh directory");

        assert!(target.is_dir());
    }

    #[test]
    fn refuse_leaves_existing_directory_alone() {
        let root = tempfile::tempdir().expect("tempdir");
        let target = root.path().join("georeferenced");
        fs::create_dir(&target).expect("create");
        fs::write(target.join("keep.jpg"), b"data").expect("write");

        let result = prepare_output_dir(&target, OutputPolicy::Refuse);

        assert!(result.is_err_and(|e| matches!(e, CatalogError::OutputExists { .. })));
        assert!(target.join("keep.jpg").exists());
    }

    #[test]
    fn purge_empties_existing_directory() {
        let root = tempfile::tempdir().expect("tempdir");
        let target = root.path().join("composited");
        fs::create_dir(&target).expect("create");
        fs::write(target.join("01.tif"), b"old").expect("write");

        prepare_output_dir(&target, OutputPolicy::Purge).expect("purge");

        assert!(target.is_dir());
        assert!(!target.join("01.tif").exists());
    }

    #[test]
    fn reuse_keeps_contents() {
        let root = tempfile::tempdir().expect("tempdir");
        let target = root.path().join("raw");
        fs::create_dir(&target).expect("create");
        fs::write(target.join("a.jpg"), b"jpg").expect("write");

        prepare_output_dir(&target, OutputPolicy::Reuse).expect("reuse");

        assert!(target.join("a.jpg").exists());
    }
}
