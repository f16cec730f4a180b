// API client module: a small blocking HTTP client for the PAI backend.
// The `Backend` trait is the seam the upload, polling and fetch components
// talk to; `ApiClient` is the real implementation over HTTPS.

use std::io::Read;
use std::time::Duration;

use log::debug;
use reqwest::blocking::{multipart, Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::PaiError;
use crate::job::JobStatus;
use crate::upload::UploadSession;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Operations the backend exposes to this client.
pub trait Backend {
    /// Open an upload session declaring how many chunks will follow.
    fn start_upload(&self, chunk_count: u64) -> Result<UploadSession, PaiError>;

    fn upload_chunk(
        &self,
        session: &UploadSession,
        chunk_id: u64,
        bytes: Vec<u8>,
    ) -> Result<(), PaiError>;

    /// Close the session and turn it into a job. Returns the job id.
    fn finalize_upload(&self, request: &FinalizeRequest) -> Result<String, PaiError>;

    fn job_status(&self, job_id: &str) -> Result<JobStatus, PaiError>;

    /// Stream the result archive of a finished job.
    fn download_job(&self, job_id: &str) -> Result<Box<dyn Read>, PaiError>;

    /// Stream the example h5ad file published by the backend.
    fn download_example(&self) -> Result<Box<dyn Read>, PaiError>;
}

/// Client-credentials exchange payload sent to the token endpoint.
#[derive(Serialize, Debug)]
pub struct TokenRequest<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a str,
    pub audience: &'a str,
    pub grant_type: &'a str,
}

#[derive(Deserialize, Debug)]
pub struct TokenResponse {
    pub access_token: String,
}

#[derive(Serialize, Debug)]
pub struct StartUploadRequest {
    pub chunk_count: u64,
}

/// The uuid is optional so a missing one can be reported as a session
/// error instead of a decode failure.
#[derive(Deserialize, Debug)]
pub struct StartUploadResponse {
    #[serde(default)]
    pub uuid: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FinalizeRequest {
    pub uuid: String,
    pub hash: String,
    #[serde(rename = "tissueOrgan")]
    pub tissue_organ: String,
}

#[derive(Deserialize, Debug)]
pub struct FinalizeResponse {
    pub id: String,
}

#[derive(Deserialize, Debug)]
pub struct JobStatusResponse {
    pub status: String,
}

#[derive(Serialize, Debug)]
pub struct DownloadRequest<'a> {
    pub job_id: &'a str,
}

trait ResponseExt {
    fn error_for_backend(self) -> Result<Response, PaiError>;
}

impl ResponseExt for Response {
    fn error_for_backend(self) -> Result<Response, PaiError> {
        let status = self.status();
        if status.is_success() {
            return Ok(self);
        }
        let body = self.text().unwrap_or_default();
        let reason = if body.trim().is_empty() {
            status.canonical_reason().unwrap_or("unknown").to_string()
        } else {
            body
        };
        Err(PaiError::Backend { status, reason })
    }
}

/// Holds a reqwest blocking client, the backend base URL and the bearer
/// token attached to every backend call.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Build an unauthenticated client for the configured backend.
    pub fn new(config: &Config) -> Result<Self, PaiError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(None::<Duration>)
            .build()?;
        Ok(ApiClient {
            client,
            base_url: config.backend_api_uri.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Build a client and exchange the configured client credentials for
    /// a bearer token. The token is fetched once and never refreshed.
    pub fn connect(config: &Config) -> Result<Self, PaiError> {
        let mut api = Self::new(config)?;
        let token = api.fetch_access_token(config)?;
        api.set_token(&token);
        Ok(api)
    }

    pub fn fetch_access_token(&self, config: &Config) -> Result<String, PaiError> {
        let req = TokenRequest {
            client_id: &config.client_id,
            client_secret: &config.client_secret,
            audience: &config.audience,
            grant_type: "client_credentials",
        };
        let res = self.client.post(&config.auth_url).json(&req).send()?;
        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().unwrap_or_default();
            return Err(PaiError::Auth(format!("{} - {}", status, txt)));
        }
        let resp: TokenResponse = res
            .json()
            .map_err(|e| PaiError::Auth(format!("unreadable token response: {e}")))?;
        Ok(resp.access_token)
    }

    /// Store a bearer token for subsequent backend calls.
    pub fn set_token(&mut self, token: &str) {
        self.token = Some(token.to_string());
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

impl Backend for ApiClient {
    fn start_upload(&self, chunk_count: u64) -> Result<UploadSession, PaiError> {
        let req = self
            .authorized(self.client.post(self.url("start_upload")))
            .json(&StartUploadRequest { chunk_count });
        let res = req.send()?.error_for_backend()?;
        let resp: StartUploadResponse = res
            .json()
            .map_err(|e| PaiError::Session(format!("unreadable response: {e}")))?;
        match resp.uuid {
            Some(uuid) if !uuid.trim().is_empty() => Ok(UploadSession {
                uuid,
                total_chunks: chunk_count,
            }),
            _ => Err(PaiError::Session("response carried no session uuid".into())),
        }
    }

    fn upload_chunk(
        &self,
        session: &UploadSession,
        chunk_id: u64,
        bytes: Vec<u8>,
    ) -> Result<(), PaiError> {
        let part = multipart::Part::bytes(bytes)
            .file_name(format!("chunk_{chunk_id}"))
            .mime_str("application/octet-stream")?;
        let form = multipart::Form::new()
            .text("chunk_id", chunk_id.to_string())
            .text("uuid", session.uuid.clone())
            .part("file", part);

        self.authorized(self.client.post(self.url("upload_chunk")))
            .multipart(form)
            .send()?
            .error_for_backend()?;
        Ok(())
    }

    fn finalize_upload(&self, request: &FinalizeRequest) -> Result<String, PaiError> {
        let res = self
            .authorized(self.client.post(self.url("upload_status")))
            .json(request)
            .send()?
            .error_for_backend()?;
        // 201 means the backend is still missing chunks for this session.
        if res.status() == StatusCode::CREATED {
            debug!("upload_status body: {}", res.text().unwrap_or_default());
            return Err(PaiError::IncompleteUpload {
                uuid: request.uuid.clone(),
            });
        }
        let resp: FinalizeResponse = res.json()?;
        Ok(resp.id)
    }

    fn job_status(&self, job_id: &str) -> Result<JobStatus, PaiError> {
        let res = self
            .authorized(self.client.get(self.url("job")))
            .query(&[("job_id", job_id)])
            .send()?
            .error_for_backend()?;
        let resp: JobStatusResponse = res.json()?;
        resp.status.parse()
    }

    fn download_job(&self, job_id: &str) -> Result<Box<dyn Read>, PaiError> {
        let res = self
            .authorized(self.client.post(self.url("download")))
            .json(&DownloadRequest { job_id })
            .send()?
            .error_for_backend()?;
        Ok(Box::new(res))
    }

    fn download_example(&self) -> Result<Box<dyn Read>, PaiError> {
        let res = self
            .authorized(self.client.get(self.url("download_example_h5ad")))
            .send()?
            .error_for_backend()?;
        Ok(Box::new(res))
    }
}
