//! roadsight - frame detection server
//!
//! This daemon:
//! 1. Loads configuration (file, env, flags)
//! 2. Builds the detectors, OCR engine and annotator once
//! 3. Serves the frame channel over WebSocket until Ctrl-C

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use roadsight::{
    api::{ApiConfig, ApiServer},
    runtime::build_handler,
    ServerConfig,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Vehicle and traffic-sign detection over WebSocket")]
struct Args {
    /// JSON configuration file.
    #[arg(long, env = "ROADSIGHT_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Listen address, overrides the configuration.
    #[arg(long, value_name = "HOST:PORT")]
    addr: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = ServerConfig::load_from(args.config.as_deref())?;
    if let Some(addr) = args.addr {
        config.addr = addr;
        config.validate()?;
    }

    let handler = Arc::new(build_handler(&config, None)?);
    let api_config = ApiConfig {
        addr: config.addr.clone(),
        index_path: config.index_path.clone(),
    };
    let api_handle = ApiServer::new(api_config, handler).spawn().await?;
    log::info!("frame channel listening on ws://{}/ws", api_handle.addr);

    log::info!("roadsight waiting for shutdown signal (Ctrl-C)...");
    tokio::signal::ctrl_c().await?;
    log::info!("shutdown signal received, stopping server...");
    api_handle.stop().await?;

    Ok(())
}
