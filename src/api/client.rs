use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::error::{Error, Result};

/// Thin JSON-over-HTTPS client shared by the provider implementations.
pub struct HttpClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpClient {
    pub fn new(endpoint: &str, headers: &[(&'static str, String)], timeout: Duration) -> Result<Self> {
        let mut header_map = HeaderMap::new();
        for (name, value) in headers {
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::Config(format!("Invalid {} header: {}", name, e)))?;
            header_map.insert(HeaderName::from_static(name), value);
        }
        header_map.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(header_map)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn post_json<B: Serialize + ?Sized>(&self, body: &B) -> Result<Value> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(format!("language model response from {}", self.endpoint))
                } else {
                    Error::Network(e)
                }
            })?;

        let status = response.status();
        tracing::debug!(endpoint = %self.endpoint, status = status.as_u16(), "language model API responded");

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}
