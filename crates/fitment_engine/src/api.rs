use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::{ApiError, FailureKind, ProgressSample};

const START_JOB_PATH: &str = "/api/check";
const PROGRESS_PATH: &str = "/api/progress";

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Backend job executor as seen by the client.
#[async_trait::async_trait]
pub trait FitmentApi: Send + Sync {
    /// Starts a job for the comma-joined target names.
    async fn start_job(&self, hostnames: &str) -> Result<(), ApiError>;

    async fn read_progress(&self) -> Result<ProgressSample, ApiError>;
}

#[derive(Serialize)]
struct StartJobRequest<'a> {
    hostnames: &'a str,
}

#[derive(Debug, Clone)]
pub struct ReqwestApi {
    client: reqwest::Client,
    start_url: reqwest::Url,
    progress_url: reqwest::Url,
}

impl ReqwestApi {
    pub fn new(settings: &ApiSettings) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            client,
            start_url: endpoint(&settings.base_url, START_JOB_PATH)?,
            progress_url: endpoint(&settings.base_url, PROGRESS_PATH)?,
        })
    }
}

#[async_trait::async_trait]
impl FitmentApi for ReqwestApi {
    async fn start_job(&self, hostnames: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.start_url.clone())
            .json(&StartJobRequest { hostnames })
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        Ok(())
    }

    async fn read_progress(&self) -> Result<ProgressSample, ApiError> {
        let response = self
            .client
            .get(self.progress_url.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        parse_progress(&body)
    }
}

/// Decodes a progress body. Missing or malformed counters read as 0.
pub(crate) fn parse_progress(body: &[u8]) -> Result<ProgressSample, ApiError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))?;
    Ok(ProgressSample {
        total: counter(&value, "total"),
        processed: counter(&value, "processed"),
    })
}

fn counter(value: &Value, field: &str) -> u64 {
    value.get(field).and_then(Value::as_u64).unwrap_or(0)
}

fn endpoint(base_url: &str, path: &str) -> Result<reqwest::Url, ApiError> {
    let joined = format!("{}{}", base_url.trim_end_matches('/'), path);
    reqwest::Url::parse(&joined)
        .map_err(|err| ApiError::new(FailureKind::InvalidUrl, format!("{joined}: {err}")))
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ApiError::new(FailureKind::Decode, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
