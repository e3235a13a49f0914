//! Connection dispatcher.
//!
//! Accepts one connection at a time, reads the command byte, and routes to
//! the upload or download handler. A failed exchange is logged and the
//! server moves on to the next connection.

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use filedrop_data_channel::{
    TransferError, read_command, receive_chunked, receive_name, receive_unique_name,
    send_chunked, write_status,
};
use filedrop_protocol::constants::{CHUNK_SIZE, DEFAULT_PORT};
use filedrop_protocol::{Command, Status};
use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::storage::Storage;

/// Read buffer for the command header and upload payload.
const READ_BUFFER_SIZE: usize = CHUNK_SIZE * 8;

/// Pause after a failed `accept` so a persistent error (e.g. EMFILE) does
/// not spin the loop.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP port to listen on (0 = OS-assigned).
    pub port: u16,
    /// Directory uploads are stored in and downloads are served from.
    pub storage_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            storage_dir: PathBuf::from("."),
        }
    }
}

/// Result of one successfully served connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub command: Command,
    /// Name the file is stored under (uploads carry the storage-id prefix).
    pub name: String,
    /// Payload bytes transferred.
    pub bytes: u64,
}

/// The filedrop server.
pub struct FileServer {
    port: u16,
    storage: Storage,
    cancel: CancellationToken,
}

impl FileServer {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            port: config.port,
            storage: Storage::new(config.storage_dir),
            cancel: CancellationToken::new(),
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Stops [`run`](Self::run), abandoning any exchange in progress.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Binds the listener on all interfaces.
    pub async fn bind(&self) -> Result<TcpListener, TransferError> {
        let addr: SocketAddr = ([0, 0, 0, 0], self.port).into();
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "filedrop server listening");
        Ok(listener)
    }

    /// Serves connections one after another until [`shutdown`](Self::shutdown).
    pub async fn run(&self, listener: TcpListener) -> Result<(), TransferError> {
        loop {
            let (stream, peer_addr) = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    info!("server shutting down");
                    break Ok(());
                }
                accepted = accept_with_retry(|| listener.accept()) => accepted,
            };

            debug!(%peer_addr, "connection accepted");

            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    warn!(%peer_addr, "server shutting down mid-transfer");
                    break Ok(());
                }
                result = self.serve_connection(stream, peer_addr) => result,
            };

            match result {
                Ok(served) => info!(
                    %peer_addr,
                    command = %served.command,
                    name = %served.name,
                    bytes = served.bytes,
                    "transfer complete"
                ),
                Err(e) => log_failure(peer_addr, &e),
            }
        }
    }

    /// Handles exactly one connection and closes it.
    pub async fn serve_connection(
        &self,
        stream: TcpStream,
        peer_addr: SocketAddr,
    ) -> Result<Served, TransferError> {
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, reader);
        let ctx = ConnectionContext {
            peer_addr,
            storage: &self.storage,
        };

        let result = match read_command(&mut reader).await {
            Ok(Command::Upload) => ctx.serve_upload(&mut reader, &mut writer).await,
            Ok(Command::Download) => ctx.serve_download(&mut reader, &mut writer).await,
            Err(e) => Err(e),
        };

        if let Err(e) = writer.shutdown().await {
            debug!(%peer_addr, "shutdown after transfer failed: {e}");
        }
        result
    }
}

/// State scoped to a single accepted connection.
struct ConnectionContext<'a> {
    peer_addr: SocketAddr,
    storage: &'a Storage,
}

impl ConnectionContext<'_> {
    /// Stores the upload, then reports the outcome with one status byte.
    ///
    /// A rejected upload still has its payload drained so the client sees
    /// the status rather than a reset connection.
    async fn serve_upload<R, W>(
        &self,
        reader: &mut R,
        writer: &mut W,
    ) -> Result<Served, TransferError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let name = receive_unique_name(reader).await?;
        let stored = self.store_upload(reader, &name).await;

        let status = match &stored {
            Ok(_) => Some(Status::Ok),
            Err(TransferError::InvalidName(_)) => Some(Status::InvalidName),
            Err(TransferError::Local(_)) => Some(Status::Failed),
            // Transport is gone; nothing left to report on.
            Err(_) => None,
        };
        if let Some(status) = status {
            if let Err(e) = reply_after_upload(reader, writer, status).await {
                debug!(peer_addr = %self.peer_addr, "could not report upload status: {e}");
            }
        }

        let bytes = stored?;
        Ok(Served {
            command: Command::Upload,
            name,
            bytes,
        })
    }

    async fn store_upload<R>(&self, reader: &mut R, name: &str) -> Result<u64, TransferError>
    where
        R: AsyncBufRead + Unpin,
    {
        let (mut file, path) = self.storage.create(name).await?;
        info!(peer_addr = %self.peer_addr, %name, "receiving upload");

        // Leaves a truncated file behind if the peer drops mid-transfer.
        let bytes = receive_chunked(reader, &mut file).await?;
        debug!(path = %path.display(), bytes, "upload stored");
        Ok(bytes)
    }

    async fn serve_download<R, W>(
        &self,
        reader: &mut R,
        writer: &mut W,
    ) -> Result<Served, TransferError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let name = receive_name(reader).await?;

        let mut file = match self.storage.open(&name).await {
            Ok(file) => file,
            Err(e @ TransferError::FileNotFound(_)) => {
                write_status(writer, Status::NotFound).await?;
                return Err(e);
            }
            Err(e @ TransferError::InvalidName(_)) => {
                write_status(writer, Status::InvalidName).await?;
                return Err(e);
            }
            Err(e @ TransferError::Local(_)) => {
                write_status(writer, Status::Failed).await?;
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        write_status(writer, Status::Ok).await?;
        info!(peer_addr = %self.peer_addr, %name, "sending download");
        let bytes = send_chunked(writer, &mut file).await?;

        Ok(Served {
            command: Command::Download,
            name,
            bytes,
        })
    }
}

/// Discards whatever payload is left unless the upload succeeded, then
/// writes `status`.
async fn reply_after_upload<R, W>(
    reader: &mut R,
    writer: &mut W,
    status: Status,
) -> Result<(), TransferError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    if status != Status::Ok {
        let discarded = tokio::io::copy_buf(reader, &mut tokio::io::sink()).await?;
        debug!(discarded, "drained rejected upload");
    }
    write_status(writer, status).await
}

/// Polls `accept` until it yields a connection, sleeping between failures.
async fn accept_with_retry<F, Fut, T>(mut accept: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<T>>,
{
    loop {
        match accept().await {
            Ok(accepted) => return accepted,
            Err(e) => {
                error!("accept error: {e}");
                tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
            }
        }
    }
}

fn log_failure(peer_addr: SocketAddr, err: &TransferError) {
    match err {
        TransferError::FileNotFound(name) => {
            info!(%peer_addr, %name, "requested file not found");
        }
        TransferError::InvalidName(reason) => {
            warn!(%peer_addr, "rejected name: {reason}");
        }
        e if e.is_protocol_violation() => {
            warn!(%peer_addr, "protocol violation, connection closed: {e}");
        }
        e => error!(%peer_addr, "transfer failed: {e}"),
    }
}
