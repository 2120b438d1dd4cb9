use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "webmirror")]
#[command(about = "Headless mirror client for server-rendered pages")]
pub struct Cli {
    /// Path to client.toml (defaults to the user config directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Page URL, overriding config and environment
    #[arg(long)]
    pub page_url: Option<String>,

    /// Websocket port, overriding config and environment
    #[arg(long)]
    pub ws_port: Option<u16>,

    /// Ignore stdin instead of reading scripted input from it
    #[arg(long)]
    pub no_input: bool,
}
