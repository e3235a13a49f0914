use std::path::{Path, PathBuf};
use std::time::Duration;

use filedrop_data_channel::{
    TransferError, read_status, receive_chunked, send_chunked, send_name, validate_file_name,
    write_command,
};
use filedrop_protocol::constants::{CHUNK_SIZE, CONNECT_TIMEOUT, DEFAULT_PORT, DOWNLOAD_PREFIX};
use filedrop_protocol::{Command, Status};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server address as `host:port`.
    pub server_addr: String,
    /// Directory downloaded files are written to.
    pub download_dir: PathBuf,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: format!("127.0.0.1:{DEFAULT_PORT}"),
            download_dir: PathBuf::from("."),
            connect_timeout: CONNECT_TIMEOUT,
        }
    }
}

/// A completed download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// Local file the payload was written to.
    pub path: PathBuf,
    pub bytes: u64,
}

/// Returns the final component of `path` as UTF-8.
pub fn bare_file_name(path: &Path) -> Result<&str, TransferError> {
    let name = path.file_name().ok_or_else(|| {
        TransferError::MalformedName(format!("path has no file name: {}", path.display()))
    })?;
    name.to_str().ok_or_else(|| {
        TransferError::MalformedName(format!("file name is not UTF-8: {}", path.display()))
    })
}

/// Local name for a downloaded file, prefixed so it never clobbers a file
/// of the same name.
pub fn download_file_name(remote_name: &str) -> String {
    format!("{DOWNLOAD_PREFIX}{remote_name}")
}

/// Issues upload and download commands against a filedrop server.
pub struct FileClient {
    config: ClientConfig,
}

impl FileClient {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Uploads `local_path` under its bare file name.
    ///
    /// Returns `Ok` only after the server reports the file stored. The
    /// server decides which names it accepts; a rejection comes back as
    /// [`TransferError::InvalidName`] once the payload has been sent.
    pub async fn upload(&self, local_path: &Path) -> Result<u64, TransferError> {
        let name = bare_file_name(local_path)?;
        let header = encode_header(Command::Upload, name).await?;
        let mut file = File::open(local_path).await.map_err(TransferError::Local)?;

        let stream = self.connect().await?;
        let (mut reader, mut writer) = stream.into_split();

        writer.write_all(&header).await?;
        let bytes = send_chunked(&mut writer, &mut file).await?;

        // Half-close: the server reads until end of stream.
        writer.shutdown().await?;

        match read_status(&mut reader).await? {
            Status::Ok => {}
            Status::InvalidName => return Err(TransferError::InvalidName(name.to_string())),
            Status::Failed => return Err(TransferError::ServerFailed(name.to_string())),
            status @ Status::NotFound => return Err(TransferError::UnknownStatus(status.code())),
        }

        let mut trailing = Vec::new();
        reader.read_to_end(&mut trailing).await?;
        if !trailing.is_empty() {
            warn!(
                len = trailing.len(),
                "server sent unexpected bytes after upload"
            );
        }

        info!(%name, bytes, "upload complete");
        Ok(bytes)
    }

    /// Downloads `remote_name` into `download_dir/down_<remote_name>`.
    ///
    /// `remote_name` must be a bare file name; anything else is rejected
    /// before connecting. No local file is created unless the server reports
    /// the file exists.
    pub async fn download(&self, remote_name: &str) -> Result<Download, TransferError> {
        validate_file_name(remote_name)?;
        let header = encode_header(Command::Download, remote_name).await?;

        let stream = self.connect().await?;
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::with_capacity(CHUNK_SIZE * 8, reader);

        writer.write_all(&header).await?;
        writer.flush().await?;

        match read_status(&mut reader).await? {
            Status::Ok => {}
            Status::NotFound => return Err(TransferError::FileNotFound(remote_name.to_string())),
            Status::InvalidName => {
                return Err(TransferError::InvalidName(remote_name.to_string()));
            }
            Status::Failed => return Err(TransferError::ServerFailed(remote_name.to_string())),
        }

        tokio::fs::create_dir_all(&self.config.download_dir)
            .await
            .map_err(TransferError::Local)?;
        let path = self
            .config
            .download_dir
            .join(download_file_name(remote_name));
        let mut file = File::create(&path).await.map_err(TransferError::Local)?;

        let bytes = receive_chunked(&mut reader, &mut file).await?;

        if let Err(e) = writer.shutdown().await {
            debug!("shutdown after download failed: {e}");
        }

        info!(name = %remote_name, path = %path.display(), bytes, "download complete");
        Ok(Download { path, bytes })
    }

    async fn connect(&self) -> Result<TcpStream, TransferError> {
        let addr = &self.config.server_addr;
        match tokio::time::timeout(self.config.connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => {
                debug!(%addr, "connected");
                Ok(stream)
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(TransferError::Timeout),
        }
    }
}

/// Encodes command and name up front so a bad name fails before connecting.
async fn encode_header(command: Command, name: &str) -> Result<Vec<u8>, TransferError> {
    let mut header = Vec::with_capacity(name.len() + 2);
    write_command(&mut header, command).await?;
    send_name(&mut header, name).await?;
    Ok(header)
}
