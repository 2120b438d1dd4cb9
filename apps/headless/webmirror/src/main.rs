use webmirror::cli::Cli;
use webmirror::error::WebmirrorError;
use webmirror::input::spawn_stdin_reader;
use webmirror::logger::{default_log_dir, initialize as LoggerInitialize};

use client_core::client::{Client, ClientExit};
use client_core::config::ClientConfig;
use client_core::host::HeadlessHost;

use common::ErrorLocation;

use std::fs::create_dir_all;
use std::panic::Location;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(exit) => {
            info!("Client stopped: {exit:?}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ClientExit, WebmirrorError> {
    let mut config = ClientConfig::load(cli.config.as_deref())?;
    if let Some(page_url) = cli.page_url {
        config.server.page_url = page_url;
    }
    if let Some(ws_port) = cli.ws_port {
        config.server.ws_port = ws_port;
    }
    config.validate()?;

    let log_dir = config.log.dir.clone().unwrap_or_else(default_log_dir);
    create_dir_all(&log_dir).map_err(|e| WebmirrorError::Webmirror {
        message: format!("Failed to create log directory {}: {e}", log_dir.display()),
        location: ErrorLocation::from(Location::caller()),
    })?;

    // Initialize logger FIRST
    LoggerInitialize(&log_dir, config.log_level())?;

    info!("webmirror starting");
    info!("Log directory: {}", log_dir.display());
    info!(
        "Mirroring {} via websocket port {}",
        config.server.page_url, config.server.ws_port
    );

    let host = HeadlessHost::new(config.dialogs.clone());
    let mut client = Client::new(config, host)?;
    let input = (!cli.no_input).then(spawn_stdin_reader);

    Ok(client.run(input).await?)
}
