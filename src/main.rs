//! talkback: a line-oriented TCP chat responder
//!
//! Every connected client gets its own session:
//! - each line is trimmed, capped at 1024 characters and answered
//!   (`hello`, `bye`, `/time`, `/echo`, `/quit`, otherwise an echo)
//! - every line is appended to `<client-ip>.log`
//! - clients idle for 30 seconds are disconnected
//!
//! Configuration via CLI arguments or TOML file.

mod client_log;
mod command;
mod config;
mod protocol;
mod server;
mod session;

use config::Config;
use server::Server;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!(
        port = config.port,
        idle_timeout_secs = config.idle_timeout.as_secs(),
        max_message_len = config.max_message_len,
        "Starting talkback server"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let server = runtime.block_on(Server::bind(config)).map_err(|e| {
        error!(error = %e, "Error starting server");
        e
    })?;

    runtime.block_on(server.run());
    Ok(())
}
