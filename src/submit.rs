// Turns a local h5ad file into a backend job: validate, open an upload
// session, send the chunks, then finalize with the content digest.

use std::fs;
use std::path::Path;

use log::info;

use crate::api::{Backend, FinalizeRequest};
use crate::cancel::CancellationToken;
use crate::error::PaiError;
use crate::job::validate_job_id;
use crate::signature::validate_signature;
use crate::upload::{chunk_count, ChunkedUploader, UploadProgress, CHUNK_SIZE};

pub const H5AD_EXTENSION: &str = "h5ad";

/// Local checks on the input file. Touches nothing but the file itself.
pub fn preflight(path: &Path) -> Result<(), PaiError> {
    let invalid = |reason: &str| PaiError::InvalidInput {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };
    if !path.is_file() {
        return Err(invalid("no such file"));
    }
    if path.extension().and_then(|ext| ext.to_str()) != Some(H5AD_EXTENSION) {
        return Err(invalid("expected a .h5ad file"));
    }
    validate_signature(path)
}

pub struct JobSubmitter<'a, B: Backend> {
    backend: &'a B,
    cancel: &'a CancellationToken,
    chunk_size: u64,
    progress: &'a dyn UploadProgress,
}

impl<'a, B: Backend> JobSubmitter<'a, B> {
    pub fn new(backend: &'a B, cancel: &'a CancellationToken) -> Self {
        JobSubmitter {
            backend,
            cancel,
            chunk_size: CHUNK_SIZE,
            progress: &(),
        }
    }

    /// Panics if `chunk_size` is zero.
    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        assert!(chunk_size > 0, "chunk size must be positive");
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_progress(mut self, progress: &'a dyn UploadProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Upload `path` tagged with `tissue_organ` and return the new job id.
    pub fn submit(&self, path: &Path, tissue_organ: &str) -> Result<String, PaiError> {
        validate_signature(path)?;

        let file_size = fs::metadata(path)?.len();
        let total_chunks = chunk_count(file_size, self.chunk_size);
        info!(
            "Uploading h5ad file {} ({} bytes, {} chunks)",
            path.display(),
            file_size,
            total_chunks
        );

        let session = self.backend.start_upload(total_chunks)?;
        let hash = ChunkedUploader::new(self.backend, self.cancel)
            .with_chunk_size(self.chunk_size)
            .with_progress(self.progress)
            .upload(path, &session)?;

        self.cancel.check()?;
        let job_id = self.backend.finalize_upload(&FinalizeRequest {
            uuid: session.uuid,
            hash,
            tissue_organ: tissue_organ.to_string(),
        })?;
        validate_job_id(&job_id)?;
        info!("Upload complete, job id: {job_id}");
        Ok(job_id)
    }
}
