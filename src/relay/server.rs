use std::io;
use std::net::{SocketAddr, TcpListener};
use std::time::Duration;

use tracing::{info, warn};

use crate::config::RelaySettings;
use crate::worker::Worker;

use super::handler::{RelayState, router};

const JOIN_TIMEOUT: Duration = Duration::from_secs(3);

/// The relay's server thread. Stopped on drop.
pub struct RelayServer {
    addr: SocketAddr,
    worker: Option<Worker>,
}

impl RelayServer {
    /// Bind `bind:port` and serve on a dedicated thread.
    ///
    /// Binding happens on the caller's thread so a busy port is reported here.
    pub fn spawn(settings: &RelaySettings) -> io::Result<Self> {
        let listener = TcpListener::bind((settings.bind.as_str(), settings.port))?;
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let worker = Worker::spawn("segue-relay", move |stop_rx| {
            runtime.block_on(async move {
                let listener = match tokio::net::TcpListener::from_std(listener) {
                    Ok(l) => l,
                    Err(e) => {
                        warn!(error = %e, "relay listener setup failed");
                        return;
                    }
                };
                let shutdown = async move {
                    let _ = tokio::task::spawn_blocking(move || stop_rx.recv()).await;
                };
                if let Err(e) = axum::serve(listener, router(RelayState::new()))
                    .with_graceful_shutdown(shutdown)
                    .await
                {
                    warn!(error = %e, "relay server stopped with an error");
                }
            });
        })?;

        info!(%addr, "image relay listening");
        Ok(Self {
            addr,
            worker: Some(worker),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.stop(JOIN_TIMEOUT);
        }
    }
}

impl Drop for RelayServer {
    fn drop(&mut self) {
        self.stop();
    }
}
