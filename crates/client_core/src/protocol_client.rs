//! HTTP side of the crawler backend.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    error::ApiErrorBody,
    protocol::{
        LogsResponse, StartCrawlRequest, StartCrawlResponse, StatusResponse, StopCrawlResponse,
        DOWNLOAD_PATH, LOGS_PATH, START_CRAWLING_PATH, STATUS_PATH, STOP_CRAWLING_PATH,
    },
};
use url::Url;

use crate::error::ClientError;

const START_FAILED: &str = "Failed to start crawling";
const STOP_FAILED: &str = "Failed to stop crawling";
const STATUS_FAILED: &str = "Failed to fetch server status";
const LOGS_FAILED: &str = "Failed to fetch server logs";
const DOWNLOAD_FAILED: &str = "Failed to download results";

#[async_trait]
pub trait JobApi: Send + Sync {
    async fn start_crawling(
        &self,
        request: &StartCrawlRequest,
    ) -> Result<StartCrawlResponse, ClientError>;
    async fn stop_crawling(&self) -> Result<StopCrawlResponse, ClientError>;
    async fn status(&self) -> Result<StatusResponse, ClientError>;
    async fn recent_logs(&self) -> Result<LogsResponse, ClientError>;
    async fn download(&self, url: &str) -> Result<Vec<u8>, ClientError>;
}

pub struct HttpJobApi {
    http: Client,
    server_url: Url,
}

impl HttpJobApi {
    pub fn new(server_url: Url) -> Self {
        Self {
            http: Client::new(),
            server_url,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.server_url.join(path)?)
    }
}

#[async_trait]
impl JobApi for HttpJobApi {
    async fn start_crawling(
        &self,
        request: &StartCrawlRequest,
    ) -> Result<StartCrawlResponse, ClientError> {
        let res = self
            .http
            .post(self.endpoint(START_CRAWLING_PATH)?)
            .json(request)
            .send()
            .await?;
        decode(res, START_FAILED).await
    }

    async fn stop_crawling(&self) -> Result<StopCrawlResponse, ClientError> {
        let res = self
            .http
            .post(self.endpoint(STOP_CRAWLING_PATH)?)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await?;
        decode(res, STOP_FAILED).await
    }

    async fn status(&self) -> Result<StatusResponse, ClientError> {
        let res = self.http.get(self.endpoint(STATUS_PATH)?).send().await?;
        decode(res, STATUS_FAILED).await
    }

    async fn recent_logs(&self) -> Result<LogsResponse, ClientError> {
        let res = self.http.get(self.endpoint(LOGS_PATH)?).send().await?;
        decode(res, LOGS_FAILED).await
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ClientError> {
        let res = self.http.get(url).send().await?;
        let res = ensure_success(res, DOWNLOAD_FAILED).await?;
        Ok(res.bytes().await?.to_vec())
    }
}

/// Download URL for a finished crawl; the backend may name a stored file path.
pub fn download_url(server_url: &Url, file_path: Option<&str>) -> Result<Url, ClientError> {
    let path = match file_path.map(|p| p.trim_start_matches('/')) {
        Some(file_path) if !file_path.is_empty() => format!("{DOWNLOAD_PATH}/{file_path}"),
        _ => DOWNLOAD_PATH.to_string(),
    };
    Ok(server_url.join(&path)?)
}

async fn decode<T: DeserializeOwned>(res: Response, fallback: &str) -> Result<T, ClientError> {
    let res = ensure_success(res, fallback).await?;
    Ok(res.json::<T>().await?)
}

/// Turns a non-success response into [`ClientError::Request`] carrying the
/// server's `detail`, or `fallback` when the body has none.
async fn ensure_success(res: Response, fallback: &str) -> Result<Response, ClientError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.json::<ApiErrorBody>().await.unwrap_or_default();
    Err(ClientError::Request {
        status: status.as_u16(),
        detail: body.detail_or(fallback),
    })
}

#[cfg(test)]
#[path = "tests/protocol_client_tests.rs"]
mod tests;
