use std::fmt;
use std::time::Duration;

/// Payload block size used by both peers when streaming file bytes.
pub const CHUNK_SIZE: usize = 1024;

/// Default TCP port the server listens on.
pub const DEFAULT_PORT: u16 = 9999;

/// Byte that terminates a file name on the wire.
pub const NAME_TERMINATOR: u8 = 0x00;

/// Upper bound on a received file name, terminator excluded.
pub const MAX_NAME_LEN: usize = 4096;

/// Prefix the client puts in front of downloaded file names.
pub const DOWNLOAD_PREFIX: &str = "down_";

/// Timeout for the client's TCP connection attempt.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Request command, sent as the first byte of every connection.
///
/// Selects which peer is the source of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    /// Client -> server payload.
    Upload = 0x00,
    /// Server -> client payload.
    Download = 0x01,
}

impl Command {
    /// Wire encoding of the command.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Decodes a command byte. Returns `None` for any undefined code.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(Self::Upload),
            0x01 => Some(Self::Download),
            _ => None,
        }
    }
}

impl TryFrom<u8> for Command {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(code)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upload => f.write_str("upload"),
            Self::Download => f.write_str("download"),
        }
    }
}

/// Server verdict on a request.
///
/// For a download it precedes the payload. For an upload it follows the
/// payload, once the server has stored the file or given up on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Status {
    /// Download: the payload follows. Upload: the file is stored.
    Ok = 0x00,
    /// No file is stored under the requested name.
    NotFound = 0x01,
    /// The name is not a bare file name.
    InvalidName = 0x02,
    /// The server could not read or write the stored file.
    Failed = 0x03,
}

impl Status {
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(Self::Ok),
            0x01 => Some(Self::NotFound),
            0x02 => Some(Self::InvalidName),
            0x03 => Some(Self::Failed),
            _ => None,
        }
    }
}

impl TryFrom<u8> for Status {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(code)
    }
}
