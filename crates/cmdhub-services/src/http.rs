//! `HttpClient` backed by reqwest

use async_trait::async_trait;
use cmdhub_foundation::{HttpClient, HttpError, HttpResponse};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

pub struct ReqwestHttpClient {
    client: reqwest::Client,
    max_response_bytes: u64,
}

impl ReqwestHttpClient {
    pub fn new(timeout: Duration, max_response_bytes: u64) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cmdhub/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            max_response_bytes,
        })
    }

    fn check_size(&self, url: &str, size: u64) -> Result<(), HttpError> {
        if size > self.max_response_bytes {
            return Err(HttpError::TooLarge {
                url: url.to_string(),
                size,
                max: self.max_response_bytes,
            });
        }
        Ok(())
    }
}

/// Only plain http(s) URLs are fetched
fn validate_url(url: &str) -> Result<(), HttpError> {
    let parsed = url::Url::parse(url).map_err(|e| HttpError::Network {
        url: url.to_string(),
        message: format!("Invalid URL: {e}"),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(HttpError::Network {
            url: url.to_string(),
            message: format!("Unsupported URL scheme '{scheme}'"),
        }),
    }
}

fn map_reqwest_error(url: &str, err: reqwest::Error) -> HttpError {
    if err.is_timeout() {
        HttpError::Timeout {
            url: url.to_string(),
        }
    } else {
        HttpError::Network {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
        validate_url(url)?;
        debug!(url = %url, "HTTP GET");

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| map_reqwest_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        if let Some(size) = response.content_length() {
            self.check_size(url, size)?;
        }

        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let final_url = response.url().to_string();

        // Content-Length can be absent or wrong, so count what actually arrives
        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| map_reqwest_error(url, e))?
        {
            body.extend_from_slice(&chunk);
            self.check_size(url, body.len() as u64)?;
        }

        let body = String::from_utf8(body).map_err(|e| HttpError::Network {
            url: url.to_string(),
            message: format!("Response is not valid UTF-8: {e}"),
        })?;

        debug!(url = %url, status = status.as_u16(), bytes = body.len(), "HTTP GET complete");
        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            headers,
            body,
            final_url,
        })
    }
}
