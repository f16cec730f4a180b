// Library root
// -----------
// This crate exposes the library surface behind the `pai` CLI. The binary
// (`main.rs`) parses arguments, sets up logging and hands off to `ui`.
//
// Module responsibilities:
// - `api`: HTTP interactions with the backend (token exchange, upload
//   session, chunks, finalize, job status, downloads) behind `Backend`.
// - `signature`, `upload`, `submit`: turning a local h5ad file into a job.
// - `job`: job statuses and the poller waiting for a terminal one.
// - `fetch`: downloading and unpacking result archives.
// - `session`: the submit → poll → fetch sequence.
// - `config`, `error`, `layout`, `cancel`: shared plumbing.
// - `ui`: argument definitions and command handlers.
pub mod api;
pub mod cancel;
pub mod config;
pub mod error;
pub mod fetch;
pub mod job;
pub mod layout;
pub mod session;
pub mod signature;
pub mod submit;
pub mod ui;
pub mod upload;

#[cfg(test)]
mod testing;

pub use error::PaiError;
