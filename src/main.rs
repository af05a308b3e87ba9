use anyhow::Result;
use clap::Parser;
use image_relay::{app::App, config::Config, server};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "image-relay")]
#[command(about = "Relay image generation and editing requests to Gemini")]
struct CliArgs {
    /// Bind address; overrides HOST.
    #[arg(long)]
    host: Option<String>,

    /// Listening port; overrides PORT.
    #[arg(long)]
    port: Option<u16>,
}

fn default_filter(debug: bool) -> &'static str {
    if debug {
        "image_relay=debug,tower_http=debug"
    } else {
        "image_relay=info,tower_http=info"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    // Config is read first so DEBUG can pick the default log level.
    let config = Config::from_env();
    let debug = config.as_ref().map(|c| c.debug).unwrap_or(false);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(debug).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    info!("Starting image-relay");

    let app = match App::from_config(&config) {
        Ok(app) => Arc::new(app),
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server::serve(app, &config).await {
        error!("Server failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides() {
        let args = CliArgs::parse_from(["image-relay", "--host", "127.0.0.1", "--port", "8080"]);
        assert_eq!(args.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(args.port, Some(8080));
    }

    #[test]
    fn test_cli_rejects_invalid_port() {
        assert!(CliArgs::try_parse_from(["image-relay", "--port", "http"]).is_err());
    }

    #[test]
    fn test_debug_raises_default_filter() {
        assert!(default_filter(true).contains("image_relay=debug"));
        assert!(default_filter(false).contains("image_relay=info"));
    }
}
