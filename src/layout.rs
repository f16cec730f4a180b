// Local directory layout under the user-supplied tmp directory:
//
//   <tmp>/adatas/                 example input files
//   <tmp>/zips/<job_id>.zip       downloaded result archives
//   <tmp>/results/<job_id>/...    extracted results

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const ADATAS_DIR: &str = "adatas";
pub const ZIPS_DIR: &str = "zips";
pub const RESULTS_DIR: &str = "results";
pub const EXAMPLE_FILE_NAME: &str = "anndata_example.h5ad";

#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Layout { root: root.into() }
    }

    pub fn adatas_dir(&self) -> PathBuf {
        self.root.join(ADATAS_DIR)
    }

    pub fn zips_dir(&self) -> PathBuf {
        self.root.join(ZIPS_DIR)
    }

    pub fn results_dir(&self) -> PathBuf {
        self.root.join(RESULTS_DIR)
    }

    pub fn example_path(&self) -> PathBuf {
        self.adatas_dir().join(EXAMPLE_FILE_NAME)
    }

    pub fn archive_path(&self, job_id: &str) -> PathBuf {
        self.zips_dir().join(format!("{job_id}.zip"))
    }

    pub fn job_results_dir(&self, job_id: &str) -> PathBuf {
        self.results_dir().join(job_id)
    }
}

/// Create `path` and any missing parents. An existing directory is not an
/// error.
pub fn ensure_dir(path: &Path) -> io::Result<&Path> {
    fs::create_dir_all(path)?;
    Ok(path)
}
