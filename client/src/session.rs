//! One submission attempt: connect, send, wait for the reply.

use intake_shared::framing::{read_until_idle, write_message};
use intake_shared::{
    SubmissionRequest, SubmissionResponse, CLIENT_CONNECT_TIMEOUT, CLIENT_IDLE_WINDOW,
};
use log::{debug, info};
use std::io;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::timeout;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("connection to {0} timed out")]
    ConnectTimeout(String),
    #[error("connection refused by {0}")]
    Refused(String),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("no response from server")]
    NoResponse,
    #[error("invalid response from server: {0}")]
    InvalidResponse(#[source] serde_json::Error),
    #[error("failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),
}

impl SessionError {
    /// Whether the attempt failed in transit, so that simply trying again
    /// later may succeed.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            SessionError::ConnectTimeout(_) | SessionError::Refused(_) | SessionError::Io(_)
        )
    }
}

/// Submits applications to one server. Holds no state between attempts:
/// every [`submit`](Self::submit) opens a fresh connection and performs no
/// retries.
#[derive(Debug, Clone)]
pub struct SubmissionSession {
    server: String,
    connect_timeout: Duration,
    idle_window: Duration,
}

impl SubmissionSession {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            connect_timeout: CLIENT_CONNECT_TIMEOUT,
            idle_window: CLIENT_IDLE_WINDOW,
        }
    }

    pub fn with_timeouts(mut self, connect_timeout: Duration, idle_window: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self.idle_window = idle_window;
        self
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    /// Sends one request and returns the server's reply, which may itself
    /// be a rejection.
    pub async fn submit(
        &self,
        request: &SubmissionRequest,
    ) -> Result<SubmissionResponse, SessionError> {
        let payload = request.to_bytes().map_err(SessionError::Encode)?;

        info!("Connecting to {}...", self.server);
        let mut stream = match timeout(self.connect_timeout, TcpStream::connect(&self.server)).await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) if e.kind() == io::ErrorKind::ConnectionRefused => {
                return Err(SessionError::Refused(self.server.clone()))
            }
            Ok(Err(e)) => return Err(SessionError::Io(e)),
            Err(_) => return Err(SessionError::ConnectTimeout(self.server.clone())),
        };
        info!("Connected to {}", self.server);

        write_message(&mut stream, &payload).await?;
        debug!("Sent {} bytes", payload.len());

        let reply = read_until_idle(&mut stream, self.idle_window).await?;
        if reply.is_empty() {
            return Err(SessionError::NoResponse);
        }

        SubmissionResponse::from_bytes(&reply).map_err(SessionError::InvalidResponse)
    }
}
