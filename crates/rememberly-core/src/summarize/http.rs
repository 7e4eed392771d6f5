//! Summarizer backed by a remote AI endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{Summarizer, Summary};
use crate::error::{Error, Result};
use crate::models::NoteType;
use crate::util::{compact_text, is_http_url};

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize)]
struct SummarizeRequest<'a> {
    content: &'a str,
    #[serde(rename = "type")]
    kind: NoteType,
}

/// POSTs `{content, type}` to `endpoint` and expects a [`Summary`] back.
#[derive(Debug, Clone)]
pub struct HttpSummarizer {
    endpoint: String,
    client: Client,
}

impl HttpSummarizer {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let endpoint = endpoint.into().trim().to_string();
        if !is_http_url(&endpoint) {
            return Err(Error::Config(format!(
                "Summarizer endpoint must include http:// or https://: {endpoint}"
            )));
        }

        Ok(Self {
            endpoint,
            client: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
        })
    }
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    async fn summarize(&self, content: &str, kind: NoteType) -> Result<Summary> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&SummarizeRequest { content, kind })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!(
                "Summarizer returned HTTP {status}: {}",
                compact_text(&body)
            )));
        }
        Ok(response.json::<Summary>().await?)
    }

    async fn fetch_url_content(&self, url: &str) -> Result<String> {
        let url = url.trim();
        if !is_http_url(url) {
            return Err(Error::InvalidInput(format!("Not a web address: {url}")));
        }

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Error::Api(format!(
                "Fetching {url} returned HTTP {}",
                response.status().as_u16()
            )));
        }
        Ok(response.text().await?)
    }
}
