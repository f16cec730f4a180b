#![allow(dead_code)] // Each test binary uses a different subset of helpers

use std::io::{Cursor, Write};
use std::net::TcpListener;
use std::path::PathBuf;

use httpmock::MockServer;
use pai_cli::api::ApiClient;
use pai_cli::config::Config;
use pai_cli::signature::H5AD_SIGNATURE;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

pub const TOKEN: &str = "token-123";
pub const CLIENT_ID: &str = "client-id";
pub const CLIENT_SECRET: &str = "client-secret";
pub const TOKEN_PATH: &str = "/oauth/token";

pub fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

pub fn config_for(server: &MockServer) -> Config {
    let auth_url = server.url(TOKEN_PATH);
    let backend = server.base_url();
    Config::from_lookup(|key| match key {
        "AUTH0_URL" => Some(auth_url.clone()),
        "CLIENT_ID" => Some(CLIENT_ID.to_string()),
        "CLIENT_SECRET" => Some(CLIENT_SECRET.to_string()),
        "BACKEND_API_URI" => Some(backend.clone()),
        _ => None,
    })
    .unwrap()
}

/// Client pointed at `server` with the bearer token already set.
pub fn authorized_client(server: &MockServer) -> ApiClient {
    let mut api = ApiClient::new(&config_for(server)).unwrap();
    api.set_token(TOKEN);
    api
}

pub fn bearer() -> String {
    format!("Bearer {TOKEN}")
}

/// Write an h5ad-looking file of exactly `size` bytes.
pub fn write_h5ad(temp: &TempDir, name: &str, size: usize) -> (PathBuf, Vec<u8>) {
    let mut bytes = H5AD_SIGNATURE.to_vec();
    bytes.extend((0..size.saturating_sub(H5AD_SIGNATURE.len())).map(|i| (i % 251) as u8));
    bytes.truncate(size);
    let path = temp.path().join(name);
    std::fs::write(&path, &bytes).unwrap();
    (path, bytes)
}

pub fn zip_with(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in entries {
        writer
            .start_file(name.to_string(), SimpleFileOptions::default())
            .unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

pub fn result_archive() -> Vec<u8> {
    zip_with(&[
        ("embeddings.csv", "cell,x,y\nc1,0.1,0.2\n"),
        ("report/summary.json", "{\"cells\":1}"),
    ])
}
