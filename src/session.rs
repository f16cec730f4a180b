// One inference run end to end: submit the file, wait for the job, then
// fetch and unpack its results under the tmp layout.

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::api::Backend;
use crate::cancel::CancellationToken;
use crate::error::PaiError;
use crate::fetch::ResultFetcher;
use crate::job::{JobPoller, JobStatus, PollPolicy};
use crate::layout::Layout;
use crate::submit::JobSubmitter;
use crate::upload::{UploadProgress, CHUNK_SIZE};

/// Outcome of a completed inference run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceOutcome {
    pub job_id: String,
    pub results_dir: PathBuf,
}

/// Runs submit → poll → fetch for one input file.
pub struct Session<'a, B: Backend> {
    backend: &'a B,
    layout: Layout,
    cancel: CancellationToken,
    policy: PollPolicy,
    chunk_size: u64,
    progress: &'a dyn UploadProgress,
}

impl<'a, B: Backend> Session<'a, B> {
    pub fn new(backend: &'a B, layout: Layout, cancel: CancellationToken) -> Self {
        Session {
            backend,
            layout,
            cancel,
            policy: PollPolicy::default(),
            chunk_size: CHUNK_SIZE,
            progress: &(),
        }
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
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

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Any step failing aborts the rest. FAILED and ERROR jobs still get
    /// their archive downloaded before being reported as [`PaiError::JobFailed`].
    pub fn inference(
        &self,
        h5ad_path: &Path,
        tissue_organ: &str,
    ) -> Result<InferenceOutcome, PaiError> {
        let job_id = JobSubmitter::new(self.backend, &self.cancel)
            .with_chunk_size(self.chunk_size)
            .with_progress(self.progress)
            .submit(h5ad_path, tissue_organ)?;

        let status = JobPoller::new(self.backend, self.policy, &self.cancel).wait(&job_id)?;
        // The download itself is not interruptible.
        self.cancel.check()?;

        let fetcher = ResultFetcher::new(self.backend, &self.layout);
        if status != JobStatus::Completed {
            match fetcher.fetch(&job_id) {
                Ok(dir) => info!("Partial results for job {job_id} in {}", dir.display()),
                Err(err) => warn!("No results available for job {job_id}: {err}"),
            }
            return Err(PaiError::JobFailed { job_id, status });
        }

        let results_dir = fetcher.fetch(&job_id)?;
        Ok(InferenceOutcome {
            job_id,
            results_dir,
        })
    }
}
