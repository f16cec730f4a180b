// Result download and extraction. Archives are staged under `zips/` and
// unpacked under `results/`; any failure while doing so is an archive error.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;
use zip::ZipArchive;

use crate::api::Backend;
use crate::error::PaiError;
use crate::job::validate_job_id;
use crate::layout::{ensure_dir, Layout};

pub struct ResultFetcher<'a, B: Backend> {
    backend: &'a B,
    layout: &'a Layout,
}

impl<'a, B: Backend> ResultFetcher<'a, B> {
    pub fn new(backend: &'a B, layout: &'a Layout) -> Self {
        ResultFetcher { backend, layout }
    }

    /// Download the archive of `job_id` to `<tmp>/zips/<job_id>.zip` and
    /// unpack it into `<tmp>/results/<job_id>/`. The staged archive is kept.
    pub fn fetch(&self, job_id: &str) -> Result<PathBuf, PaiError> {
        validate_job_id(job_id)?;
        info!("Downloading job {job_id}");

        ensure_dir(&self.layout.zips_dir())?;
        ensure_dir(&self.layout.results_dir())?;

        let mut body = self.backend.download_job(job_id)?;
        let archive_path = self.layout.archive_path(job_id);
        let written = save(&mut body, &archive_path).map_err(|e| PaiError::Archive {
            path: archive_path.clone(),
            reason: format!("download interrupted: {e}"),
        })?;
        info!("Saved {} ({} bytes)", archive_path.display(), written);

        let job_dir = self.layout.job_results_dir(job_id);
        extract_archive(&archive_path, &job_dir)?;
        info!("Results extracted to {}", job_dir.display());
        Ok(job_dir)
    }

    /// Download the backend's example file to `<tmp>/adatas/`.
    pub fn download_example(&self) -> Result<PathBuf, PaiError> {
        info!("Downloading example h5ad");
        ensure_dir(&self.layout.adatas_dir())?;

        let mut body = self.backend.download_example()?;
        let path = self.layout.example_path();
        let written = save(&mut body, &path)?;
        info!("Saved {} ({} bytes)", path.display(), written);
        Ok(path)
    }
}

fn save(body: &mut dyn io::Read, path: &Path) -> io::Result<u64> {
    let mut out = BufWriter::new(File::create(path)?);
    let written = io::copy(body, &mut out)?;
    out.flush()?;
    Ok(written)
}

/// Unpack every entry of `archive` under `dest`. Entries that would land
/// outside `dest` make the whole call fail; files already written stay.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<(), PaiError> {
    let archive_error = |reason: String| PaiError::Archive {
        path: archive.to_path_buf(),
        reason,
    };
    let file = File::open(archive)?;
    let mut zip =
        ZipArchive::new(BufReader::new(file)).map_err(|e| archive_error(e.to_string()))?;
    ensure_dir(dest)?;

    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|e| archive_error(e.to_string()))?;
        let name = entry.name().to_string();
        let relative = entry
            .enclosed_name()
            .ok_or_else(|| archive_error(format!("entry {name:?} escapes the destination")))?;
        let target = dest.join(relative);

        let entry_error = |e: io::Error| archive_error(format!("{name}: {e}"));

        if entry.is_dir() {
            ensure_dir(&target).map_err(entry_error)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            ensure_dir(parent).map_err(entry_error)?;
        }
        let mut out = File::create(&target).map_err(entry_error)?;
        io::copy(&mut entry, &mut out).map_err(entry_error)?;
    }
    Ok(())
}
