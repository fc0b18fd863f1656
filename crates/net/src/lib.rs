use std::io::Read;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use core_types::RequestId;
use serde::Deserialize;
use thiserror::Error;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// One outgoing request, built per trigger and dropped once its response is consumed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<String>,
    pub content_type: Option<String>,
}

impl PendingRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            body: None,
            content_type: None,
        }
    }

    pub fn post_empty(url: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            body: None,
            content_type: None,
        }
    }

    /// POST with an already urlencoded body.
    pub fn post_form(url: impl Into<String>, body: String) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            body: Some(body),
            content_type: Some(FORM_CONTENT_TYPE.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchResult {
    pub requested_url: String,
    /// Final URL after redirects.
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
    pub duration_ms: u128,
}

impl FetchResult {
    pub fn is_ok(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}

/// Transport-level failures. A non-2xx status is a successful fetch, not a `NetError`.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum NetError {
    #[error("client build error: {0}")]
    ClientBuild(String),
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("reading body of {url} failed: {message}")]
    Body { url: String, message: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: "hypersplice/0.1".to_string(),
        }
    }
}

/// Executes a request to completion, body included.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &PendingRequest) -> Result<FetchResult, NetError>;
}

pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(config: &NetConfig) -> Result<Self, NetError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| NetError::ClientBuild(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: &PendingRequest) -> Result<FetchResult, NetError> {
        let start = Instant::now();
        let transport_err = |e: reqwest::Error| NetError::Transport {
            url: request.url.clone(),
            message: e.to_string(),
        };

        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        if let Some(content_type) = &request.content_type {
            builder = builder.header(reqwest::header::CONTENT_TYPE, content_type.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let mut resp = builder.send().map_err(transport_err)?;
        let status = resp.status().as_u16();
        let final_url = resp.url().to_string();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let mut buf = Vec::new();
        resp.read_to_end(&mut buf).map_err(|e| NetError::Body {
            url: final_url.clone(),
            message: e.to_string(),
        })?;

        log::trace!(
            "{} {} -> {status} ({} bytes)",
            request.method.as_str(),
            request.url,
            buf.len()
        );

        Ok(FetchResult {
            requested_url: request.url.clone(),
            url: final_url,
            status,
            content_type,
            body: String::from_utf8_lossy(&buf).into_owned(),
            duration_ms: start.elapsed().as_millis(),
        })
    }
}

pub type FetchCallback = Arc<dyn Fn(RequestId, Result<FetchResult, NetError>) + Send + Sync>;

/// Run `request` on its own thread and hand the outcome to `cb`.
pub fn fetch(
    request_id: RequestId,
    request: PendingRequest,
    transport: Arc<dyn Transport>,
    cb: FetchCallback,
) {
    thread::spawn(move || {
        let result = transport.execute(&request);
        if let Err(err) = &result {
            log::debug!("fetch {request_id} failed: {err}");
        }
        cb(request_id, result);
    });
}
