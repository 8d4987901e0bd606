//! Apache Exporter CLI
//!
//! Wires configuration, logging, and the HTTP listener around the
//! scrape engine.

use apache_exporter::scraper::ConfigError;
use apache_exporter::{
    FileConfig, MetricsRegistry, MetricsServer, MetricsServerConfig, ScrapeConfig, StatusScraper,
};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "apache_exporter", version, about = "Prometheus exporter for Apache httpd mod_status")]
struct Cli {
    /// Address on which to expose metrics (default 0.0.0.0:9117).
    #[arg(long = "telemetry.address")]
    telemetry_address: Option<SocketAddr>,

    /// Path under which to expose metrics (default /metrics).
    #[arg(long = "telemetry.endpoint")]
    telemetry_endpoint: Option<String>,

    /// URI to the apache stub status page
    /// (default http://localhost/server-status/?auto).
    #[arg(long = "scrape_uri")]
    scrape_uri: Option<String>,

    /// Override for the HTTP Host header; empty for no override.
    #[arg(long = "host_override")]
    host_override: Option<String>,

    /// Ignore the server certificate when scraping over https.
    #[arg(long)]
    insecure: bool,

    /// Extra static request header sent with every scrape; repeatable.
    #[arg(long = "header", value_name = "NAME=VALUE")]
    headers: Vec<String>,

    /// Path to a TOML config file with [scrape] and [telemetry] sections;
    /// explicit flags win over file values.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    /// Merges file values and flags into the final configuration.
    fn into_configs(self) -> Result<(ScrapeConfig, MetricsServerConfig), ConfigError> {
        let file = match &self.config {
            Some(path) => FileConfig::from_file(path)?,
            None => FileConfig::default(),
        };
        let mut scrape = file.scrape;
        let mut telemetry = file.telemetry;

        if let Some(uri) = self.scrape_uri {
            scrape.scrape_uri = uri;
        }
        if let Some(host) = self.host_override {
            scrape.host_override = Some(host).filter(|h| !h.is_empty());
        }
        if self.insecure {
            scrape.insecure = true;
        }
        for header in self.headers {
            let (name, value) = header
                .split_once('=')
                .ok_or_else(|| ConfigError::InvalidHeader(header.clone()))?;
            scrape
                .extra_headers
                .insert(name.trim().to_string(), value.trim().to_string());
        }
        if let Some(addr) = self.telemetry_address {
            telemetry.bind_addr = addr;
        }
        if let Some(endpoint) = self.telemetry_endpoint {
            telemetry.endpoint = endpoint;
        }

        scrape.validate()?;
        Ok((scrape, telemetry))
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let (scrape_config, server_config) = cli.into_configs()?;

    info!(version = apache_exporter::VERSION, "Starting apache_exporter");
    info!(scrape_uri = %scrape_config.scrape_uri, "Collect from");

    let scraper = StatusScraper::new(scrape_config)?;
    let registry = MetricsRegistry::new()?;
    let server = MetricsServer::new(server_config, scraper, registry);

    server.run().await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "exporter failed");
        std::process::exit(1);
    }
}
