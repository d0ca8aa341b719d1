// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP fetch capability used by every provider adapter.
//!
//! Adapters never talk to `reqwest` directly; they go through [`Fetcher`],
//! which returns the raw status, final URL and body of a response. Status
//! interpretation is left to the adapter, so a 404 is a normal `Document`
//! rather than an error.

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

use crate::domain::prediction::PredictionError;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<FetchError> for PredictionError {
    fn from(err: FetchError) -> Self {
        PredictionError::ProviderUnavailable(err.to_string())
    }
}

/// One field of a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormField {
    Text { name: String, value: String },
    /// File input left empty by the user
    EmptyFile { name: String },
}

impl FormField {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        FormField::Text {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn empty_file(name: impl Into<String>) -> Self {
        FormField::EmptyFile { name: name.into() }
    }

    pub fn name(&self) -> &str {
        match self {
            FormField::Text { name, .. } | FormField::EmptyFile { name } => name,
        }
    }
}

/// Request body variants the providers need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    UrlEncoded(Vec<(String, String)>),
    Multipart(Vec<FormField>),
    Raw { content_type: String, body: String },
}

/// Response as seen by an adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub status: u16,
    /// URL after redirects
    pub url: String,
    pub location: Option<String>,
    pub body: String,
}

impl Document {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &str) -> Result<Document, FetchError>;

    async fn post(&self, url: &str, payload: Payload) -> Result<Document, FetchError>;
}

/// Upper bound for one request, submission or poll.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// `Fetcher` backed by a shared `reqwest::Client` (redirects followed).
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    /// Create a fetcher whose requests give up after `timeout`
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .build()
            .map_err(|e| FetchError::InvalidRequest(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    async fn into_document(url: &str, response: reqwest::Response) -> Result<Document, FetchError> {
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(|e| FetchError::Transport {
            url: url.to_string(),
            message: format!("failed to read body: {}", e),
        })?;

        Ok(Document {
            status,
            url: final_url,
            location,
            body,
        })
    }

    fn multipart(fields: Vec<FormField>) -> Result<Form, FetchError> {
        let mut form = Form::new();
        for field in fields {
            form = match field {
                FormField::Text { name, value } => form.text(name, value),
                FormField::EmptyFile { name } => {
                    let part = Part::bytes(Vec::new())
                        .file_name("")
                        .mime_str("application/octet-stream")
                        .map_err(|e| FetchError::InvalidRequest(e.to_string()))?;
                    form.part(name, part)
                }
            };
        }
        Ok(form)
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn get(&self, url: &str) -> Result<Document, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        Self::into_document(url, response).await
    }

    async fn post(&self, url: &str, payload: Payload) -> Result<Document, FetchError> {
        let builder = self.client.post(url);
        let builder = match payload {
            Payload::UrlEncoded(fields) => builder.form(&fields),
            Payload::Multipart(fields) => builder.multipart(Self::multipart(fields)?),
            Payload::Raw { content_type, body } => {
                builder.header(CONTENT_TYPE, content_type).body(body)
            }
        };

        let response = builder.send().await.map_err(|e| FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        Self::into_document(url, response).await
    }
}
