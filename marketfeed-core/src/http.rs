//! Blocking HTTP access.
//!
//! [`PageFetcher`] is the seam the scrapers depend on so tests can serve HTML
//! from memory. [`HttpClient`] is the reqwest-backed implementation, also used
//! directly by the energy API client for JSON.

use crate::error::DataError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;

pub trait PageFetcher: Send + Sync {
    /// GET `url` and return the body. Any non-2xx status is an error.
    fn fetch(&self, url: &str) -> Result<String, DataError>;
}

pub struct HttpClient {
    client: reqwest::blocking::Client,
}

impl HttpClient {
    /// Client sending `headers` with every request.
    pub fn with_headers(headers: &BTreeMap<String, String>) -> Result<Self, DataError> {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| DataError::Config(format!("header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| DataError::Config(format!("header value for '{name}': {e}")))?;
            map.insert(name, value);
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers(map)
            .build()
            .map_err(|e| DataError::NetworkUnreachable(format!("build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Client without extra headers.
    pub fn plain() -> Result<Self, DataError> {
        Self::with_headers(&BTreeMap::new())
    }

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response, DataError> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DataError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(resp)
    }

    /// GET `url` and decode the body as JSON.
    pub fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, DataError> {
        self.get(url)?.json().map_err(|e| {
            DataError::MalformedResponse(format!("failed to parse response from {url}: {e}"))
        })
    }
}

impl PageFetcher for HttpClient {
    fn fetch(&self, url: &str) -> Result<String, DataError> {
        self.get(url)?
            .text()
            .map_err(|e| DataError::MalformedResponse(format!("body of {url}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_browser_headers() {
        let headers = crate::config::FuturesConfig::default().headers;
        assert!(HttpClient::with_headers(&headers).is_ok());
    }

    #[test]
    fn rejects_invalid_header_name() {
        let mut headers = BTreeMap::new();
        headers.insert("Bad Header".to_string(), "x".to_string());
        assert!(matches!(
            HttpClient::with_headers(&headers),
            Err(DataError::Config(_))
        ));
    }
}
