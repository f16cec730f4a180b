// Error kinds shared by every component. Each kind maps to its own process
// exit code so scripts driving the CLI can branch on what went wrong.

use std::io;
use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

use crate::config::ConfigError;
use crate::job::JobStatus;

#[derive(Error, Debug)]
pub enum PaiError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid input file {}: {reason}", path.display())]
    InvalidInput { path: PathBuf, reason: String },

    #[error("{} is not an h5ad file (leading bytes: {found})", path.display())]
    FormatMismatch { path: PathBuf, found: String },

    #[error("failed to obtain access token: {0}")]
    Auth(String),

    #[error("upload session not granted: {0}")]
    Session(String),

    #[error("backend returned {status}: {reason}")]
    Backend { status: StatusCode, reason: String },

    #[error("request to backend failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend reported unknown job status {0:?}")]
    UnknownJobStatus(String),

    #[error("backend returned an unusable job id {0:?}")]
    InvalidJobId(String),

    #[error("backend reported missing chunks for upload session {uuid}")]
    IncompleteUpload { uuid: String },

    #[error("job {job_id} still not finished after {attempts} status queries")]
    PollTimeout { job_id: String, attempts: u32 },

    #[error("job {job_id} finished with status {status}")]
    JobFailed { job_id: String, status: JobStatus },

    #[error("failed to unpack result archive {}: {reason}", path.display())]
    Archive { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("operation cancelled")]
    Cancelled,
}

impl PaiError {
    /// Process exit code for this kind of failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            PaiError::Config(_) => 2,
            PaiError::InvalidInput { .. } => 3,
            PaiError::FormatMismatch { .. } => 4,
            PaiError::Auth(_) => 5,
            PaiError::Session(_) => 6,
            PaiError::Backend { .. }
            | PaiError::Transport(_)
            | PaiError::UnknownJobStatus(_)
            | PaiError::InvalidJobId(_) => 7,
            PaiError::IncompleteUpload { .. } => 8,
            PaiError::PollTimeout { .. } => 9,
            PaiError::JobFailed { .. } => 10,
            PaiError::Archive { .. } => 11,
            PaiError::Io(_) => 12,
            PaiError::Cancelled => 130,
        }
    }
}
