//! Request header encoding: command byte, file name, status byte.
//!
//! ```text
//! [1 byte: command][N bytes: name UTF-8][0x00]
//! [1 byte: status]          (server -> client; before a download payload,
//!                            after an upload payload)
//! ```

use filedrop_protocol::constants::{MAX_NAME_LEN, NAME_TERMINATOR};
use filedrop_protocol::{Command, Status};
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt,
};

use crate::error::TransferError;
use crate::storage_id::unique_name;

/// Writes the command byte.
pub async fn write_command<W: AsyncWrite + Unpin>(
    writer: &mut W,
    command: Command,
) -> Result<(), TransferError> {
    writer.write_u8(command.code()).await?;
    Ok(())
}

/// Reads the command byte.
///
/// Any code other than the two defined commands is a protocol violation.
pub async fn read_command<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Command, TransferError> {
    let code = reader.read_u8().await?;
    Command::try_from(code).map_err(TransferError::UnknownCommand)
}

/// Writes the status byte and flushes it to the peer.
pub async fn write_status<W: AsyncWrite + Unpin>(
    writer: &mut W,
    status: Status,
) -> Result<(), TransferError> {
    writer.write_u8(status.code()).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads the status byte.
pub async fn read_status<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Status, TransferError> {
    let code = reader.read_u8().await?;
    Status::try_from(code).map_err(TransferError::UnknownStatus)
}

/// Writes `name` followed by the terminator byte.
///
/// Names containing the terminator are rejected before anything is written.
pub async fn send_name<W: AsyncWrite + Unpin>(
    writer: &mut W,
    name: &str,
) -> Result<(), TransferError> {
    let bytes = name.as_bytes();
    if bytes.contains(&NAME_TERMINATOR) {
        return Err(TransferError::MalformedName(format!(
            "name contains the terminator byte: {name:?}"
        )));
    }
    if bytes.len() > MAX_NAME_LEN {
        return Err(TransferError::MalformedName(format!(
            "name too long: {} bytes (max {MAX_NAME_LEN})",
            bytes.len()
        )));
    }

    let mut frame = Vec::with_capacity(bytes.len() + 1);
    frame.extend_from_slice(bytes);
    frame.push(NAME_TERMINATOR);
    writer.write_all(&frame).await?;
    Ok(())
}

/// Reads a terminator-delimited name.
///
/// Scans the reader's buffer for the terminator instead of reading one byte
/// at a time. Bytes after the terminator stay buffered in `reader`, so the
/// same reader must be used for the payload that follows.
pub async fn receive_name<R: AsyncBufRead + Unpin>(
    reader: &mut R,
) -> Result<String, TransferError> {
    let mut buf = Vec::new();
    let limit = (MAX_NAME_LEN + 1) as u64;
    let n = (&mut *reader)
        .take(limit)
        .read_until(NAME_TERMINATOR, &mut buf)
        .await?;

    if buf.last() == Some(&NAME_TERMINATOR) {
        buf.pop();
    } else if n > MAX_NAME_LEN {
        return Err(TransferError::MalformedName(format!(
            "name exceeds {MAX_NAME_LEN} bytes"
        )));
    } else {
        return Err(TransferError::Connection(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "connection closed before name terminator",
        )));
    }

    String::from_utf8(buf)
        .map_err(|e| TransferError::MalformedName(format!("invalid UTF-8 name: {e}")))
}

/// Reads a name and prefixes it with a fresh storage id.
pub async fn receive_unique_name<R: AsyncBufRead + Unpin>(
    reader: &mut R,
) -> Result<String, TransferError> {
    let name = receive_name(reader).await?;
    Ok(unique_name(&name))
}
