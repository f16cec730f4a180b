// In-memory backend used by the unit tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io::{Cursor, Read};
use std::path::PathBuf;

use reqwest::StatusCode;
use tempfile::TempDir;

use crate::api::{Backend, FinalizeRequest};
use crate::cancel::CancellationToken;
use crate::error::PaiError;
use crate::job::JobStatus;
use crate::signature::H5AD_SIGNATURE;
use crate::upload::UploadSession;

#[derive(Default)]
pub(crate) struct FakeBackend {
    pub declared_chunks: Cell<Option<u64>>,
    pub chunks: RefCell<Vec<(u64, Vec<u8>)>>,
    pub fail_chunk_at: Option<u64>,
    pub finalized: RefCell<Option<FinalizeRequest>>,
    pub incomplete: bool,
    pub statuses: RefCell<VecDeque<JobStatus>>,
    pub status_queries: Cell<u32>,
    pub archive: Option<Vec<u8>>,
    pub downloads: Cell<u32>,
    pub interrupt_download: bool,
    pub cancel_on_status: Option<CancellationToken>,
}

/// Yields its bytes, then fails like a dropped connection.
struct Interrupted(Cursor<Vec<u8>>);

impl Read for Interrupted {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self.0.read(buf)? {
            0 => Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            )),
            n => Ok(n),
        }
    }
}

impl FakeBackend {
    pub fn with_statuses(statuses: &[JobStatus]) -> Self {
        FakeBackend {
            statuses: RefCell::new(statuses.iter().copied().collect()),
            ..FakeBackend::default()
        }
    }
}

fn not_found() -> PaiError {
    PaiError::Backend {
        status: StatusCode::NOT_FOUND,
        reason: "Not Found".into(),
    }
}

impl Backend for FakeBackend {
    fn start_upload(&self, chunk_count: u64) -> Result<UploadSession, PaiError> {
        self.declared_chunks.set(Some(chunk_count));
        Ok(UploadSession {
            uuid: "session-1".into(),
            total_chunks: chunk_count,
        })
    }

    fn upload_chunk(
        &self,
        _session: &UploadSession,
        chunk_id: u64,
        bytes: Vec<u8>,
    ) -> Result<(), PaiError> {
        if self.fail_chunk_at == Some(chunk_id) {
            return Err(PaiError::Backend {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                reason: "chunk rejected".into(),
            });
        }
        self.chunks.borrow_mut().push((chunk_id, bytes));
        Ok(())
    }

    fn finalize_upload(&self, request: &FinalizeRequest) -> Result<String, PaiError> {
        *self.finalized.borrow_mut() = Some(request.clone());
        if self.incomplete {
            return Err(PaiError::IncompleteUpload {
                uuid: request.uuid.clone(),
            });
        }
        Ok("job-1".into())
    }

    fn job_status(&self, _job_id: &str) -> Result<JobStatus, PaiError> {
        self.status_queries.set(self.status_queries.get() + 1);
        if let Some(token) = &self.cancel_on_status {
            token.cancel();
        }
        self.statuses.borrow_mut().pop_front().ok_or_else(not_found)
    }

    fn download_job(&self, _job_id: &str) -> Result<Box<dyn Read>, PaiError> {
        self.downloads.set(self.downloads.get() + 1);
        match &self.archive {
            Some(bytes) if self.interrupt_download => {
                let half = bytes[..bytes.len() / 2].to_vec();
                Ok(Box::new(Interrupted(Cursor::new(half))))
            }
            Some(bytes) => Ok(Box::new(Cursor::new(bytes.clone()))),
            None => Err(not_found()),
        }
    }

    fn download_example(&self) -> Result<Box<dyn Read>, PaiError> {
        Ok(Box::new(Cursor::new(H5AD_SIGNATURE.to_vec())))
    }
}

/// Write a file of `size` bytes starting with the h5ad signature.
pub(crate) fn sample_h5ad(temp: &TempDir, size: usize) -> (PathBuf, Vec<u8>) {
    let mut bytes = H5AD_SIGNATURE.to_vec();
    bytes.extend((0..size.saturating_sub(H5AD_SIGNATURE.len())).map(|i| (i % 251) as u8));
    bytes.truncate(size);
    let path = temp.path().join(format!("sample_{size}.h5ad"));
    std::fs::write(&path, &bytes).unwrap();
    (path, bytes)
}

/// Zip archive with a couple of result files.
pub(crate) fn result_archive() -> Vec<u8> {
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    writer.start_file("embeddings.csv", options).unwrap();
    writer.write_all(b"cell,x,y\nc1,0.1,0.2\n").unwrap();
    writer.add_directory("plots/", options).unwrap();
    writer.start_file("plots/umap.txt", options).unwrap();
    writer.write_all(b"umap").unwrap();
    writer.finish().unwrap().into_inner()
}

/// Zip archive with one small file per name, in the given order.
pub(crate) fn zip_entries(names: &[&str]) -> Vec<u8> {
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for name in names {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(name.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
