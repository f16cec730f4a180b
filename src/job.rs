// Job status model and the poller that waits for a terminal state.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use log::info;

use crate::api::Backend;
use crate::cancel::CancellationToken;
use crate::error::PaiError;

/// Fixed delay between two status queries.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Submitted,
    Validating,
    Running,
    Completed,
    Failed,
    Error,
}

impl JobStatus {
    /// COMPLETED, FAILED and ERROR never transition further.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Submitted => "SUBMITTED",
            JobStatus::Validating => "VALIDATING",
            JobStatus::Running => "RUNNING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
            JobStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = PaiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUBMITTED" => Ok(JobStatus::Submitted),
            "VALIDATING" => Ok(JobStatus::Validating),
            "RUNNING" => Ok(JobStatus::Running),
            "COMPLETED" => Ok(JobStatus::Completed),
            "FAILED" => Ok(JobStatus::Failed),
            "ERROR" => Ok(JobStatus::Error),
            other => Err(PaiError::UnknownJobStatus(other.to_string())),
        }
    }
}

/// Job ids end up as file and directory names, so they must be a single
/// plain path component.
pub fn validate_job_id(job_id: &str) -> Result<(), PaiError> {
    let plain = !job_id.is_empty()
        && job_id != "."
        && job_id != ".."
        && !job_id.contains(['/', '\\', '\0']);
    if plain {
        Ok(())
    } else {
        Err(PaiError::InvalidJobId(job_id.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// `None` polls until a terminal state or cancellation.
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy {
            interval: POLL_INTERVAL,
            max_attempts: None,
        }
    }
}

pub struct JobPoller<'a, B: Backend> {
    backend: &'a B,
    policy: PollPolicy,
    cancel: &'a CancellationToken,
}

impl<'a, B: Backend> JobPoller<'a, B> {
    pub fn new(backend: &'a B, policy: PollPolicy, cancel: &'a CancellationToken) -> Self {
        JobPoller {
            backend,
            policy,
            cancel,
        }
    }

    /// Query the job until it reports COMPLETED, FAILED or ERROR and return
    /// that status. A failed query ends the wait.
    pub fn wait(&self, job_id: &str) -> Result<JobStatus, PaiError> {
        info!("Listening for job status");
        let mut attempts = 0u32;
        loop {
            self.cancel.check()?;
            let status = self.backend.job_status(job_id)?;
            attempts += 1;
            info!("Job status: {status}");

            if status.is_terminal() {
                return Ok(status);
            }
            if self.policy.max_attempts.is_some_and(|max| attempts >= max) {
                return Err(PaiError::PollTimeout {
                    job_id: job_id.to_string(),
                    attempts,
                });
            }
            self.cancel.sleep(self.policy.interval)?;
        }
    }
}
