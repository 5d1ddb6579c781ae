//! Server network layer: TCP listener and connection dispatch

use crate::config::ServerConfig;
use crate::connection::handle_connection;
use crate::error::ServerError;
use crate::service::IntakeService;
use intake_shared::{ACCEPT_POLL_INTERVAL, LISTEN_BACKLOG};
use log::{debug, error, info, warn};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{lookup_host, TcpListener, TcpSocket, TcpStream};
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tokio::time::timeout;

/// Accepts connections and runs one handler task per connection.
pub struct Server {
    listener: TcpListener,
    service: Arc<IntakeService>,
    idle_window: Duration,
    request_deadline: Duration,
    drain_timeout: Duration,
    handlers: JoinSet<()>,
}

impl Server {
    /// Binds the listening socket. Any failure here is fatal to startup.
    pub async fn bind(config: &ServerConfig, service: IntakeService) -> Result<Self, ServerError> {
        config.validate()?;

        let address = config.bind_address();
        let addr = resolve(&address)
            .await
            .map_err(|source| ServerError::Resolve {
                addr: address.clone(),
                source,
            })?;

        let listener = listen(addr).map_err(|source| ServerError::Bind {
            addr: address.clone(),
            source,
        })?;
        info!("Server listening on {}", listener.local_addr()?);

        Ok(Server {
            listener,
            service: Arc::new(service),
            idle_window: config.idle_window,
            request_deadline: config.request_deadline,
            drain_timeout: config.drain_timeout,
            handlers: JoinSet::new(),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop until `shutdown` turns true.
    ///
    /// The loop wakes at least once per [`ACCEPT_POLL_INTERVAL`] to look at
    /// the shutdown flag. Once it is set no new connections are accepted,
    /// and in-flight handlers get up to the configured drain timeout to
    /// finish. Any still running after that are aborted.
    pub async fn run(mut self, shutdown: watch::Receiver<bool>) -> Result<(), ServerError> {
        info!("Waiting for connections...");

        loop {
            let stopping = *shutdown.borrow();
            if stopping {
                break;
            }
            self.reap_finished();

            match timeout(ACCEPT_POLL_INTERVAL, self.listener.accept()).await {
                Ok(Ok((stream, peer))) => self.dispatch(stream, peer),
                Ok(Err(e)) => {
                    warn!("Failed to accept connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
                // Poll interval elapsed
                Err(_) => {}
            }
        }

        let Server {
            listener,
            mut handlers,
            drain_timeout,
            ..
        } = self;
        drop(listener);

        info!(
            "Server shutting down, waiting up to {:?} for {} connection(s)",
            drain_timeout,
            handlers.len()
        );
        if timeout(drain_timeout, drain(&mut handlers)).await.is_err() {
            warn!(
                "Aborting {} connection(s) still open after {:?}",
                handlers.len(),
                drain_timeout
            );
            handlers.shutdown().await;
        }
        info!("Server stopped");

        Ok(())
    }

    fn dispatch(&mut self, stream: TcpStream, peer: SocketAddr) {
        let service = Arc::clone(&self.service);
        self.handlers.spawn(handle_connection(
            stream,
            peer,
            service,
            self.idle_window,
            self.request_deadline,
        ));
        debug!("{} connection(s) in flight", self.handlers.len());
    }

    fn reap_finished(&mut self) {
        while let Some(result) = self.handlers.try_join_next() {
            log_handler_exit(result);
        }
    }
}

async fn resolve(address: &str) -> io::Result<SocketAddr> {
    lookup_host(address).await?.next().ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "no addresses found")
    })
}

async fn drain(handlers: &mut JoinSet<()>) {
    while let Some(result) = handlers.join_next().await {
        log_handler_exit(result);
    }
}

fn listen(addr: SocketAddr) -> io::Result<TcpListener> {
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    socket.listen(LISTEN_BACKLOG)
}

fn log_handler_exit(result: Result<(), JoinError>) {
    if let Err(e) = result {
        error!("Connection handler failed: {}", e);
    }
}
