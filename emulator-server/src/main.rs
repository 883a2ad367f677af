//! Service emulator binary
//!
//! Loads the service description (from `--config`, or the file named by the
//! `CONF` environment variable) and serves its endpoints over HTTP and gRPC.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use emulator_config::{ConfigLoader, EmulatorConfig};
use emulator_logging::init_logging_from_config;
use emulator_server::{build_id_matches, Server, BUILD_ID};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the HTTP listener port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override the gRPC listener port
    #[arg(long)]
    grpc_port: Option<u16>,

    /// Override the log level
    #[arg(long)]
    log_level: Option<String>,

    /// Print default configuration and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Print default configuration if requested
    if cli.print_config {
        println!("{}", EmulatorConfig::generate_sample());
        return Ok(());
    }

    let mut config = ConfigLoader::new().load(cli.config.as_ref())?;

    if let Some(port) = cli.http_port {
        config.server.http_port = port;
    }
    if let Some(port) = cli.grpc_port {
        config.server.grpc_port = port;
    }
    if let Some(level) = &cli.log_level {
        config.logging_config.level = level
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid log level: {}", level))?;
    }
    config.validate_all()?;

    init_logging_from_config(&config.logging_config)?;
    build_id_matches(&config, BUILD_ID);

    // Worker threads bounded by the configured process count
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.processes)
        .thread_name("emulator-worker")
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let server = Server::new(config)?;
        server.start().await
    })?;

    Ok(())
}
