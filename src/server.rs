//! TCP listener for talkback.
//!
//! Binds the configured port and spawns one independent session task per
//! accepted connection. Sessions share nothing but the read-only config.

use crate::config::Config;
use crate::session;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// Server instance
pub struct Server {
    config: Arc<Config>,
    listener: TcpListener,
}

impl Server {
    /// Bind the listening socket. Failure here is fatal to the process.
    pub async fn bind(config: Config) -> std::io::Result<Self> {
        let listener = TcpListener::bind(config.listen_addr()).await?;
        info!(address = %listener.local_addr()?, "Server listening");

        Ok(Server {
            config: Arc::new(config),
            listener,
        })
    }

    /// Address actually bound (useful when binding port 0)
    #[cfg(test)]
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections forever
    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    debug!(peer = %addr, "New connection");

                    let config = Arc::clone(&self.config);
                    tokio::spawn(async move {
                        let reason = session::handle_connection(stream, addr, config).await;
                        debug!(peer = %addr, %reason, "Session finished");
                    });
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }
}
