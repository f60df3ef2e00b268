use std::io::Read;
use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_LENGTH, HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use tracing::debug;

use crate::domain::Credentials;
use crate::error::HubError;

pub struct DownloadResponse {
    pub status: u16,
    pub content_length: Option<u64>,
    pub body: Box<dyn Read + Send>,
}

pub trait HubClient {
    fn fetch_page(&self, url: &Url) -> Result<Value, HubError>;
    fn open_download(&self, url: &str) -> Result<DownloadResponse, HubError>;
}

#[derive(Clone)]
pub struct HubHttpClient {
    client: Client,
    credentials: Credentials,
}

impl HubHttpClient {
    pub fn new(credentials: Credentials) -> Result<Self, HubError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("scihub-fetch/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| HubError::SearchHttp(err.to_string()))?,
        );
        // No request timeout: archives are several GB and streamed.
        let client = Client::builder()
            .default_headers(headers)
            .timeout(None::<Duration>)
            .build()
            .map_err(|err| HubError::SearchHttp(err.to_string()))?;
        Ok(Self {
            client,
            credentials,
        })
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, HubError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "search request failed".to_string());
        Err(HubError::SearchStatus { status, message })
    }
}

impl HubClient for HubHttpClient {
    fn fetch_page(&self, url: &Url) -> Result<Value, HubError> {
        let response = self
            .client
            .get(url.clone())
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .send()
            .map_err(|err| HubError::SearchHttp(err.to_string()))?;
        let response = Self::handle_status(response)?;
        response
            .json()
            .map_err(|err| HubError::SearchDecode(err.to_string()))
    }

    fn open_download(&self, url: &str) -> Result<DownloadResponse, HubError> {
        let response = self
            .client
            .get(url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .send()
            .map_err(|err| HubError::DownloadHttp(err.to_string()))?;
        let status = response.status().as_u16();
        let content_length = declared_length(response.headers());
        debug!("download {url}: status={status} content_length={content_length:?}");
        Ok(DownloadResponse {
            status,
            content_length,
            body: Box::new(response),
        })
    }
}

pub fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_length_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(declared_length(&headers), None);
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static(" 1048576 "));
        assert_eq!(declared_length(&headers), Some(1_048_576));
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("lots"));
        assert_eq!(declared_length(&headers), None);
    }
}
