use std::path::{Path, PathBuf};

use clap::Args;

use crate::output_dir::OutputPolicy;

pub const RAW_DIR: &str = "raw";
pub const GEOREFERENCED_DIR: &str = "georeferenced";
pub const WARPED_NAIVE_DIR: &str = "warped-naive";
pub const WARPED_FIXED_DIR: &str = "warped-fixed";
pub const COMPOSITED_DIR: &str = "composited";
pub const INSPECT_BROKEN_DIR: &str = "inspect-broken";

/// Raw and georeferenced photographs.
pub fn raster_file_name(entity_id: &str) -> String {
    format!("{entity_id}.jpg")
}

/// Naive and fixed-grid warps.
pub fn warped_file_name(entity_id: &str) -> String {
    format!("{entity_id}.tif")
}

/// Options every stage binary accepts.
#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    /// Vector catalog with one feature per photograph
    #[arg(long, env = "FRAME_CATALOG", default_value = "squiggle.shp")]
    pub catalog: PathBuf,
    /// Directory holding every stage's output directory
    #[arg(long, env = "FRAMES_ROOT", default_value = "frames")]
    pub frames_root: PathBuf,
    /// Replace an existing output directory instead of refusing to run
    #[arg(long, default_value_t = false)]
    pub force: bool,
}

impl From<PipelineArgs> for PipelineConfig {
    fn from(args: PipelineArgs) -> Self {
        PipelineConfig {
            catalog: args.catalog,
            frames_root: args.frames_root,
            force: args.force,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub catalog: PathBuf,
    pub frames_root: PathBuf,
    pub force: bool,
}

impl PipelineConfig {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(catalog: P, frames_root: Q) -> PipelineConfig {
        PipelineConfig {
            catalog: catalog.as_ref().to_path_buf(),
            frames_root: frames_root.as_ref().to_path_buf(),
            force: false,
        }
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.frames_root.join(RAW_DIR)
    }

    pub fn georeferenced_dir(&self) -> PathBuf {
        self.frames_root.join(GEOREFERENCED_DIR)
    }

    pub fn warped_naive_dir(&self) -> PathBuf {
        self.frames_root.join(WARPED_NAIVE_DIR)
    }

    pub fn warped_fixed_dir(&self) -> PathBuf {
        self.frames_root.join(WARPED_FIXED_DIR)
    }

    pub fn composited_dir(&self) -> PathBuf {
        self.frames_root.join(COMPOSITED_DIR)
    }

    pub fn inspect_broken_dir(&self) -> PathBuf {
        self.frames_root.join(INSPECT_BROKEN_DIR)
    }

    /// Policy for a stage that normally refuses to touch existing output.
    pub fn refusing_policy(&self) -> OutputPolicy {
        if self.force {
            OutputPolicy::Purge
        } else {
            OutputPolicy::Refuse
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        pipeline: PipelineArgs,
    }

    #[test]
    fn stage_directories_live_under_root() {
        let config = PipelineConfig::new("squiggle.shp", "frames");

        assert_eq!(config.raw_dir(), PathBuf::from("frames/raw"));
        assert_eq!(config.warped_fixed_dir(), PathBuf::from("frames/warped-fixed"));
        assert_eq!(config.inspect_broken_dir(), PathBuf::from("frames/inspect-broken"));
    }

    #[test]
    fn stage_file_names_follow_entity_id() {
        assert_eq!(raster_file_name("DS1117-2059DF043"), "DS1117-2059DF043.jpg");
        assert_eq!(warped_file_name("DS1117-2059DF043"), "DS1117-2059DF043.tif");
    }

    #[test]
    fn force_switches_refusal_to_purge() {
        let mut config = PipelineConfig::new("squiggle.shp", "frames");
        assert_eq!(config.refusing_policy(), OutputPolicy::Refuse);

        config.force = true;
        assert_eq!(config.refusing_policy(), OutputPolicy::Purge);
    }

    #[test]
    fn args_parse_into_config() {
        let cli = TestCli::try_parse_from([
            "stage",
            "--catalog",
            "data/catalog.shp",
            "--frames-root",
            "/tmp/frames",
            "--force",
        ])
        .expect("valid arguments");

        let config = PipelineConfig::from(cli.pipeline);

        assert_eq!(config.catalog, PathBuf::from("data/catalog.shp"));
        assert_eq!(config.composited_dir(), PathBuf::from("/tmp/frames/composited"));
        assert!(config.force);
    }
}
