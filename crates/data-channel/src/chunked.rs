//! Chunked payload streaming.
//!
//! The payload has no length prefix and no end marker. A sender finishes by
//! closing (or half-closing) its side of the connection, and a receiver
//! treats a zero-byte read as the end of the file. A peer that drops out
//! mid-transfer therefore leaves a truncated file that is indistinguishable
//! from a complete one.

use filedrop_protocol::constants::CHUNK_SIZE;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::error::TransferError;

/// Streams `source` to `conn` in [`CHUNK_SIZE`] blocks until `source` is exhausted.
///
/// Returns the number of payload bytes written. Read failures on `source`
/// are [`TransferError::Local`]; write failures on `conn` are
/// [`TransferError::Connection`].
pub async fn send_chunked<W, R>(conn: &mut W, source: &mut R) -> Result<u64, TransferError>
where
    W: AsyncWrite + Unpin,
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; CHUNK_SIZE];
    let mut total: u64 = 0;

    loop {
        let n = source.read(&mut buf).await.map_err(TransferError::Local)?;
        if n == 0 {
            break;
        }
        conn.write_all(&buf[..n]).await?;
        total += n as u64;
        trace!(chunk = n, total, "chunk sent");
    }

    conn.flush().await?;
    Ok(total)
}

/// Copies everything `conn` yields into `dest` until the peer closes.
///
/// Returns the number of payload bytes received. An immediately closed
/// stream is a valid, empty payload.
pub async fn receive_chunked<R, W>(conn: &mut R, dest: &mut W) -> Result<u64, TransferError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = [0u8; CHUNK_SIZE];
    let mut total: u64 = 0;

    loop {
        let n = conn.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        dest.write_all(&buf[..n]).await.map_err(TransferError::Local)?;
        total += n as u64;
        trace!(chunk = n, total, "chunk received");
    }

    dest.flush().await.map_err(TransferError::Local)?;
    Ok(total)
}
