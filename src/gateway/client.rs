// Fat Zebra API client
//
// Single chokepoint for outbound traffic to the gateway. Owns the base URL,
// the Basic auth header and the HTTP client; logs redacted request and
// response bodies. Requests are never retried here.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{header, multipart, Client, Method};
use serde_json::Value;
use tracing::{error, info};

use super::constants::TEST_USERNAME;
use super::redact::Redactor;
use crate::config::GatewayConfig;

/// Parsed body of a gateway reply
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayPayload {
    Json(Value),
    /// Body served with a non-JSON content type
    Text(String),
}

/// Raw status and payload, before normalisation
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayReply {
    pub status: u16,
    pub payload: GatewayPayload,
}

impl GatewayReply {
    pub fn json(&self) -> Option<&Value> {
        match &self.payload {
            GatewayPayload::Json(value) => Some(value),
            GatewayPayload::Text(_) => None,
        }
    }
}

/// Request body as handed to a transport
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundBody {
    Json(Value),
    /// Multipart upload of a single CSV file under the `file` field
    CsvFile { filename: String, content: String },
}

/// Outbound HTTP request as handed to a transport
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(header::HeaderName, String)>,
    pub body: Option<OutboundBody>,
}

/// Undecoded HTTP response
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

/// Abstracts the HTTP stack so the client can be exercised without a network
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse>;
}

/// reqwest-backed transport with a fixed per-request timeout
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse> {
        let mut request_builder = self.client.request(request.method, &request.url);
        for (name, value) in &request.headers {
            request_builder = request_builder.header(name, value);
        }
        match request.body {
            Some(OutboundBody::Json(body)) => {
                request_builder = request_builder.json(&body);
            }
            Some(OutboundBody::CsvFile { filename, content }) => {
                let part = multipart::Part::text(content)
                    .file_name(filename)
                    .mime_str("text/csv")?;
                request_builder = request_builder.multipart(multipart::Form::new().part("file", part));
            }
            None => {}
        }

        let response = request_builder.send().await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_ascii_lowercase());
        let body = response.text().await?;

        Ok(TransportResponse { status, content_type, body })
    }
}

/// Client for the Fat Zebra REST API
pub struct GatewayClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    auth_header: String,
    username: String,
    redactor: Redactor,
}

impl GatewayClient {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.request_timeout)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: &GatewayConfig, transport: Arc<dyn Transport>) -> Self {
        let credentials = format!("{}:{}", config.username, config.token);
        let auth_header = format!("Basic {}", STANDARD.encode(credentials));

        info!("Initialized Fat Zebra API client with username: {}", config.username);
        info!("API base URL: {}", config.base_url);

        Self {
            transport,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_header,
            username: config.username.clone(),
            redactor: Redactor::new(&config.redact_keys),
        }
    }

    /// Sandbox credentials are in use
    pub fn is_test_mode(&self) -> bool {
        self.username == TEST_USERNAME
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Send a request to `endpoint` (a path starting with `/`) and return the
    /// raw status with the parsed payload. Network failures and unparseable
    /// JSON bodies come back as errors.
    pub async fn send(&self, endpoint: &str, method: Method, body: Option<&Value>) -> Result<GatewayReply> {
        let path = log_path(endpoint);
        match body {
            Some(body) => info!(
                method = %method,
                path,
                body = %self.redactor.redact(body),
                "Making API request"
            ),
            None => info!(method = %method, path, "Making API request"),
        }

        let mut headers = vec![(header::CONTENT_TYPE, "application/json".to_string())];
        headers.extend(self.common_headers());
        let request = TransportRequest {
            method,
            url: format!("{}{}", self.base_url, endpoint),
            headers,
            body: body.cloned().map(OutboundBody::Json),
        };
        self.dispatch(endpoint, request).await
    }

    /// Upload a CSV document as a multipart form to `endpoint`
    pub async fn upload_csv(&self, endpoint: &str, filename: &str, content: String) -> Result<GatewayReply> {
        info!(path = log_path(endpoint), filename, bytes = content.len(), "Uploading CSV file");

        let request = TransportRequest {
            method: Method::POST,
            url: format!("{}{}", self.base_url, endpoint),
            headers: self.common_headers(),
            body: Some(OutboundBody::CsvFile {
                filename: filename.to_string(),
                content,
            }),
        };
        self.dispatch(endpoint, request).await
    }

    fn common_headers(&self) -> Vec<(header::HeaderName, String)> {
        vec![
            (header::ACCEPT, "application/json".to_string()),
            (header::AUTHORIZATION, self.auth_header.clone()),
        ]
    }

    async fn dispatch(&self, endpoint: &str, request: TransportRequest) -> Result<GatewayReply> {
        let method = request.method.clone();
        let path = log_path(endpoint);
        let response = self.transport.execute(request).await.map_err(|e| {
            error!(method = %method, path, "API request failed: {}", e);
            e
        })?;

        let status = response.status;
        let payload = decode_payload(response.content_type.as_deref(), response.body)?;

        match &payload {
            GatewayPayload::Json(data) => {
                let successful = data.get("successful").and_then(Value::as_bool);
                let errors = data.get("errors").cloned().unwrap_or(Value::Null);
                let response = self.redactor.redact(data.get("response").unwrap_or(&Value::Null));
                info!(
                    status,
                    successful = ?successful,
                    errors = %errors,
                    response = %response,
                    "Received API response"
                )
            }
            GatewayPayload::Text(text) => info!(
                status,
                bytes = text.len(),
                "Received non-JSON API response"
            ),
        }

        Ok(GatewayReply { status, payload })
    }
}

/// Path part of an endpoint; query strings carry caller data and stay out of logs
fn log_path(endpoint: &str) -> &str {
    endpoint.split_once('?').map_or(endpoint, |(path, _)| path)
}

fn is_json_content_type(content_type: &str) -> bool {
    content_type.contains("application/json") || content_type.contains("+json")
}

fn decode_payload(content_type: Option<&str>, text: String) -> Result<GatewayPayload> {
    match content_type {
        Some(ct) if is_json_content_type(ct) => {
            if text.trim().is_empty() {
                return Ok(GatewayPayload::Json(Value::Null));
            }
            let value = serde_json::from_str(&text)
                .map_err(|e| anyhow!("Failed to parse JSON response: {}", e))?;
            Ok(GatewayPayload::Json(value))
        }
        Some(_) => Ok(GatewayPayload::Text(text)),
        // No content type at all: accept JSON if it parses
        None => match serde_json::from_str(&text) {
            Ok(value) => Ok(GatewayPayload::Json(value)),
            Err(_) => Ok(GatewayPayload::Text(text)),
        },
    }
}

/// Percent-encode a single path segment (customer id, card token, ...)
pub fn encode_path_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Append a query string built from the non-empty pairs; returns the path
/// unchanged when nothing is left
pub fn with_query(path: &str, pairs: &[(&str, Option<String>)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    let mut any = false;
    for (key, value) in pairs {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            serializer.append_pair(key, value);
            any = true;
        }
    }
    if any {
        format!("{}?{}", path, serializer.finish())
    } else {
        path.to_string()
    }
}
