//! Single outbound HTTP call with a bounded wait.
//!
//! [`Fetcher::fetch`] never retries: callers compose it with
//! [`crate::resilience`] when they want spacing or retries.

use std::time::Instant;

use anyhow::Context as _;
use reqwest::{Method, StatusCode};

use crate::config::FetchConfig;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("http status {status} for {url}")]
    Status { status: u16, url: String },
    #[error("failed to read body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// Whether a later attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Body { .. } => true,
            Self::Transport { source, .. } => source.is_connect() || source.is_request() || source.is_timeout(),
            Self::Status { status, .. } => {
                let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub params: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            headers: Vec::new(),
            params: Vec::new(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            ..Self::get(url)
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Key identifying the upstream resource: method, URL and sorted query
    /// parameters, plus the body for POSTs.
    pub fn cache_key(&self) -> String {
        let mut key = String::new();
        if self.method != Method::GET {
            key.push_str(self.method.as_str());
            key.push(' ');
        }
        key.push_str(&self.url);

        let mut params = self.params.clone();
        params.sort();
        for (i, (name, value)) in params.iter().enumerate() {
            let sep = if i == 0 && !self.url.contains('?') { '?' } else { '&' };
            key.push(sep);
            key.push_str(name);
            key.push('=');
            key.push_str(value);
        }

        if let Some(body) = &self.body {
            key.push(' ');
            key.push_str(&body.to_string());
        }

        key
    }
}

#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new(config: &FetchConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .cookie_store(true)
            .build()
            .context("http client")?;

        Ok(Self { client })
    }

    /// Issue the request and return the body of a 2xx response as text.
    #[tracing::instrument(skip_all, fields(method = %request.method, url = %request.url))]
    pub async fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError> {
        let start = Instant::now();
        let url = request.url.clone();

        let mut builder = self.client.request(request.method.clone(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|source| {
            if source.is_timeout() {
                FetchError::Timeout { url: url.clone() }
            } else {
                FetchError::Transport { url: url.clone(), source }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await.map_err(|source| {
            if source.is_timeout() {
                FetchError::Timeout { url: url.clone() }
            } else {
                FetchError::Body { url: url.clone(), source }
            }
        })?;

        tracing::debug!(
            status = status.as_u16(),
            bytes = body.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "fetched"
        );

        Ok(body)
    }
}
