// Chunked upload of an input file into an open upload session.
//
// Chunks are read lazily, hashed in file order and sent one at a time.
// The returned digest is what the backend checks the reassembled file
// against when the session is finalized.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use log::debug;
use sha2::{Digest, Sha256};

use crate::api::Backend;
use crate::cancel::CancellationToken;
use crate::error::PaiError;

/// 1 MiB.
pub const CHUNK_SIZE: u64 = 1024 * 1024;

/// Server-issued session grouping the chunks of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    pub uuid: String,
    pub total_chunks: u64,
}

/// Observer notified after every chunk the backend accepted.
pub trait UploadProgress {
    fn chunk_sent(&self, sent: u64, total: u64);
}

impl UploadProgress for () {
    fn chunk_sent(&self, _sent: u64, _total: u64) {}
}

/// Number of chunks needed for `file_size` bytes, rounding up.
pub fn chunk_count(file_size: u64, chunk_size: u64) -> u64 {
    file_size.div_ceil(chunk_size)
}

/// Rolling SHA-256 over the chunks in sequence order.
#[derive(Default, Clone)]
pub struct ContentDigest {
    hasher: Sha256,
}

impl ContentDigest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.hasher.update(chunk);
    }

    /// Lowercase hex digest.
    pub fn finalize_hex(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

pub struct ChunkedUploader<'a, B: Backend> {
    backend: &'a B,
    cancel: &'a CancellationToken,
    chunk_size: u64,
    progress: &'a dyn UploadProgress,
}

impl<'a, B: Backend> ChunkedUploader<'a, B> {
    pub fn new(backend: &'a B, cancel: &'a CancellationToken) -> Self {
        ChunkedUploader {
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

    /// Send `path` as `session.total_chunks` chunks and return the hex
    /// digest of everything sent. The first failed chunk aborts the upload.
    pub fn upload(&self, path: &Path, session: &UploadSession) -> Result<String, PaiError> {
        let mut file = File::open(path)?;
        let mut digest = ContentDigest::new();
        let total = session.total_chunks;

        for chunk_id in 0..total {
            self.cancel.check()?;

            let mut chunk = Vec::with_capacity(self.chunk_size as usize);
            (&mut file).take(self.chunk_size).read_to_end(&mut chunk)?;
            if chunk.is_empty() {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "{} ended after {chunk_id} of {total} chunks",
                        path.display()
                    ),
                )
                .into());
            }

            digest.update(&chunk);
            debug!(
                "sending chunk {}/{} ({} bytes) for session {}",
                chunk_id + 1,
                total,
                chunk.len(),
                session.uuid
            );
            self.backend.upload_chunk(session, chunk_id, chunk)?;
            self.progress.chunk_sent(chunk_id + 1, total);
        }

        let mut trailing = [0u8; 1];
        if file.read(&mut trailing)? != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{} grew while it was being uploaded", path.display()),
            )
            .into());
        }

        Ok(digest.finalize_hex())
    }
}
