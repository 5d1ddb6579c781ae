//! Per-connection handling: receive one request, answer it, close.

use crate::service::{IntakeService, ERR_TOO_LARGE};
use intake_shared::framing::{read_until_idle, write_message};
use intake_shared::SubmissionResponse;
use log::{debug, info, warn};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

/// Owns one accepted connection end to end.
///
/// Never returns an error: every failure is logged and, when the stream is
/// still writable, answered with a failure response before the connection
/// is closed. A connection that sends nothing is closed without a reply.
/// Receiving the request may take at most `request_deadline` in total; a
/// peer still sending after that is dropped without a reply.
pub async fn handle_connection<S>(
    mut stream: S,
    peer: SocketAddr,
    service: Arc<IntakeService>,
    idle_window: Duration,
    request_deadline: Duration,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    info!("New connection from {}", peer);

    let received = match timeout(request_deadline, read_until_idle(&mut stream, idle_window)).await
    {
        Ok(received) => received,
        Err(_) => {
            warn!(
                "Request from {} not complete after {:?}, dropping connection",
                peer, request_deadline
            );
            close(&mut stream, peer).await;
            return;
        }
    };

    let response = match received {
        Ok(payload) if payload.is_empty() => {
            debug!("No data received from {}", peer);
            close(&mut stream, peer).await;
            return;
        }
        Ok(payload) => {
            debug!("Received {} bytes from {}", payload.len(), peer);
            service.process(&payload).await
        }
        Err(e) if e.kind() == io::ErrorKind::InvalidData => {
            warn!("Oversized request from {}: {}", peer, e);
            SubmissionResponse::rejected(ERR_TOO_LARGE)
        }
        Err(e) => {
            warn!("Error reading from {}: {}", peer, e);
            close(&mut stream, peer).await;
            return;
        }
    };

    match &response {
        SubmissionResponse {
            success: true,
            registration_number: Some(number),
            ..
        } => info!("Application from {} registered as {}", peer, number),
        _ => warn!(
            "Application from {} rejected: {}",
            peer,
            response.error.as_deref().unwrap_or("unknown error")
        ),
    }

    if let Err(e) = send_response(&mut stream, &response).await {
        warn!("Failed to send response to {}: {}", peer, e);
    }

    close(&mut stream, peer).await;
}

async fn send_response<S>(stream: &mut S, response: &SubmissionResponse) -> io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    let bytes = response.to_bytes()?;
    write_message(stream, &bytes).await
}

async fn close<S>(stream: &mut S, peer: SocketAddr)
where
    S: AsyncWrite + Unpin,
{
    if let Err(e) = stream.shutdown().await {
        debug!("Shutdown of {} failed: {}", peer, e);
    }
    debug!("Connection closed with {}", peer);
}
