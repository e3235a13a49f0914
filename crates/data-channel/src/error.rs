//! Error types for filedrop transfers.

/// Errors produced by a single transfer exchange.
///
/// Every variant is terminal for the current connection only.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// Transport failure while reading from or writing to the peer.
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// Failure opening, reading, or writing a local file.
    #[error("local I/O error: {0}")]
    Local(#[source] std::io::Error),

    #[error("file not found: {0}")]
    FileNotFound(String),

    /// Name that cannot be represented on the wire.
    #[error("malformed name: {0}")]
    MalformedName(String),

    /// Name that is not a bare file name.
    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("unknown command byte: {0:#04x}")]
    UnknownCommand(u8),

    /// Status byte that is undefined or makes no sense for the request.
    #[error("unexpected status byte: {0:#04x}")]
    UnknownStatus(u8),

    /// The server reported it could not read or store the named file.
    #[error("server failed to handle file: {0}")]
    ServerFailed(String),

    #[error("connection timed out")]
    Timeout,
}

impl TransferError {
    /// Returns `true` if the peer broke the protocol rather than the
    /// transport or the local filesystem failing.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            Self::MalformedName(_) | Self::UnknownCommand(_) | Self::UnknownStatus(_)
        )
    }
}
