// Fat Zebra MCP server binary
//
// Reads configuration from flags or environment, then serves MCP over stdio.
// Stdout carries the protocol, so logs go to stderr.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use fatzebra_mcp::config::{parse_key_list, GatewayConfig, DEFAULT_TIMEOUT_SECS};
use fatzebra_mcp::docs::DocsLibrary;
use fatzebra_mcp::gateway::constants::{DEFAULT_BASE_URL, TEST_USERNAME};
use fatzebra_mcp::interfaces::http::run_health_interface;
use fatzebra_mcp::{MCPServer, ToolContext, ToolRegistry};

/// MCP server exposing the Fat Zebra payment gateway as tools
#[derive(Parser, Debug)]
#[command(name = "fatzebra-mcp")]
#[command(version)]
#[command(about = "MCP server for the Fat Zebra payment gateway", long_about = None)]
struct Cli {
    /// Gateway base URL
    #[arg(long, env = "FAT_ZEBRA_API_URL", default_value = DEFAULT_BASE_URL)]
    api_url: String,

    /// Gateway username; TEST selects sandbox behaviour
    #[arg(long, env = "FAT_ZEBRA_USERNAME", default_value = TEST_USERNAME)]
    username: String,

    /// Gateway API token
    #[arg(long, env = "FAT_ZEBRA_TOKEN", default_value = TEST_USERNAME, hide_env_values = true)]
    token: String,

    /// Secret for verifying webhook signatures
    #[arg(long, env = "FAT_ZEBRA_WEBHOOK_SECRET", hide_env_values = true)]
    webhook_secret: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = "FAT_ZEBRA_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Comma separated key names to blank in logged bodies
    #[arg(long, env = "FAT_ZEBRA_REDACT_KEYS")]
    redact_keys: Option<String>,

    /// Port for the HTTP health endpoint; disabled when unset
    #[arg(long, env = "MCP_PORT")]
    port: Option<u16>,

    /// Directory holding the markdown documentation
    #[arg(long, env = "DOCS_DIR")]
    docs_dir: Option<PathBuf>,

    /// Log filter, e.g. info or fatzebra_mcp=debug
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,

    /// Turn logging off entirely; the env var accepts 1/0, yes/no, on/off
    #[arg(long, env = "DISABLE_LOGGING", action = ArgAction::SetTrue, value_parser = BoolishValueParser::new())]
    disable_logging: bool,
}

impl Cli {
    fn gateway_config(&self) -> GatewayConfig {
        let mut config = GatewayConfig {
            base_url: self.api_url.clone(),
            username: self.username.clone(),
            token: self.token.clone(),
            webhook_secret: self.webhook_secret.clone().filter(|s| !s.is_empty()),
            request_timeout: Duration::from_secs(self.timeout_secs.max(1)),
            ..Default::default()
        };
        if let Some(keys) = &self.redact_keys {
            config.redact_keys = parse_key_list(keys);
        }
        config
    }
}

fn init_logging(cli: &Cli) {
    if cli.disable_logging {
        return;
    }

    let filter = match cli.log_level.as_deref() {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = cli.gateway_config();
    info!(
        "Starting Fat Zebra MCP server ({} mode, timeout {}s)",
        config.environment(),
        config.request_timeout.as_secs()
    );

    if let Some(port) = cli.port {
        let health_config = Arc::new(config.clone());
        tokio::spawn(async move {
            if let Err(e) = run_health_interface(port, health_config).await {
                error!("Health endpoint stopped: {}", e);
            }
        });
    }

    let ctx = Arc::new(ToolContext::new(config)?);
    let docs = DocsLibrary::discover(&DocsLibrary::default_candidates(cli.docs_dir.clone()));
    let server = MCPServer::new(ToolRegistry::with_default_tools(), ctx, docs);

    server.run().await?;

    info!("MCP server shutdown");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disable_logging_accepts_boolish_env() {
        for (value, expected) in [("1", true), ("yes", true), ("on", true), ("0", false), ("off", false), ("false", false)] {
            std::env::set_var("DISABLE_LOGGING", value);
            let cli = Cli::try_parse_from(["fatzebra-mcp"]).unwrap();
            assert_eq!(cli.disable_logging, expected, "DISABLE_LOGGING={value}");
        }
        std::env::remove_var("DISABLE_LOGGING");

        let cli = Cli::try_parse_from(["fatzebra-mcp", "--disable-logging"]).unwrap();
        assert!(cli.disable_logging);
    }

    #[test]
    fn test_gateway_config_from_flags() {
        let cli = Cli::try_parse_from([
            "fatzebra-mcp",
            "--username",
            "merchant",
            "--timeout-secs",
            "0",
            "--redact-keys",
            "card_number, cvv",
        ])
        .unwrap();
        let config = cli.gateway_config();
        assert_eq!(config.username, "merchant");
        assert_eq!(config.request_timeout, Duration::from_secs(1));
        assert_eq!(config.redact_keys, parse_key_list("card_number,cvv"));
    }
}
