#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use fatzebra_mcp::gateway::client::{Transport, TransportRequest, TransportResponse};
use fatzebra_mcp::{GatewayConfig, ToolContext};
use httpmock::MockServer;

pub const API_PREFIX: &str = "/v1.0";

pub fn should_skip_httpmock() -> bool {
    if can_bind_localhost() {
        return false;
    }
    eprintln!("skipping httpmock test: sandbox forbids binding to localhost");
    true
}

fn can_bind_localhost() -> bool {
    match std::net::TcpListener::bind(("127.0.0.1", 0)) {
        Ok(listener) => {
            drop(listener);
            true
        }
        Err(err) if err.kind() == io::ErrorKind::PermissionDenied => false,
        Err(err) => panic!("failed to bind localhost for httpmock tests: {err}"),
    }
}

pub fn api_path(endpoint: &str) -> String {
    format!("{API_PREFIX}{endpoint}")
}

/// Sandbox credentials pointed at the mock server
pub fn sandbox_config(server: &MockServer) -> GatewayConfig {
    GatewayConfig::sandbox(format!("{}{}", server.base_url(), API_PREFIX))
}

/// Live-mode credentials pointed at the mock server
pub fn live_config(server: &MockServer) -> GatewayConfig {
    GatewayConfig {
        username: "merchant01".to_string(),
        token: "live-token".to_string(),
        ..sandbox_config(server)
    }
}

pub fn context(config: GatewayConfig) -> ToolContext {
    ToolContext::new(config).expect("tool context")
}

/// Transport whose every request fails before reaching the network
pub struct FailingTransport {
    pub message: &'static str,
    pub calls: Mutex<usize>,
}

impl FailingTransport {
    pub fn new(message: &'static str) -> Arc<Self> {
        Arc::new(Self {
            message,
            calls: Mutex::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Transport for FailingTransport {
    async fn execute(&self, _request: TransportRequest) -> Result<TransportResponse> {
        *self.calls.lock().unwrap() += 1;
        Err(anyhow!(self.message))
    }
}

/// In-memory sink for log output
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Route this thread's tracing output into the buffer until the guard drops
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter("info")
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .without_time()
            .finish();
        tracing::subscriber::set_default(subscriber)
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
