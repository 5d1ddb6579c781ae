//! Idle-timeout message framing.
//!
//! The protocol carries no length prefix or delimiter. A receiver keeps
//! reading until the peer closes its side or until no bytes arrive for a
//! whole idle window, and everything accumulated so far is the message.
//! A sender that stalls longer than the receiver's idle window mid-message
//! gets its message truncated; callers must send each message in one go.

use crate::{MAX_MESSAGE_BYTES, READ_CHUNK_SIZE};
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

/// Reads one message, returning whatever arrived before the peer closed or
/// went quiet for `idle_window`. An empty vector means nothing was sent.
///
/// Fails with [`io::ErrorKind::InvalidData`] once more than
/// [`MAX_MESSAGE_BYTES`] have accumulated.
pub async fn read_until_idle<R>(reader: &mut R, idle_window: Duration) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut message = Vec::new();
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    loop {
        match timeout(idle_window, reader.read(&mut chunk)).await {
            // Peer closed its write half
            Ok(Ok(0)) => break,
            Ok(Ok(len)) => {
                if message.len() + len > MAX_MESSAGE_BYTES {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("message exceeds {} bytes", MAX_MESSAGE_BYTES),
                    ));
                }
                message.extend_from_slice(&chunk[..len]);
            }
            Ok(Err(e)) => return Err(e),
            // Quiet for a full window
            Err(_) => break,
        }
    }

    Ok(message)
}

/// Writes one complete message and flushes it.
pub async fn write_message<W>(writer: &mut W, message: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(message).await?;
    writer.flush().await
}
