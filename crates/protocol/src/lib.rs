//! Wire vocabulary for the filedrop protocol.
//!
//! # Wire format
//!
//! ```text
//! REQUEST (client -> server):
//!   [1 byte: command, 0x00=Upload, 0x01=Download]
//!   [N bytes: file name UTF-8][1 byte: 0x00 terminator]
//!
//! UPLOAD:   client streams raw file bytes, then closes its send side;
//!           server replies [1 byte: status] once the file is stored (Ok)
//!           or rejected (InvalidName, Failed), then closes.
//! DOWNLOAD: [1 byte: status] from server; on Ok the server streams raw
//!           file bytes, then closes.
//!
//! STATUS:   0x00=Ok, 0x01=NotFound, 0x02=InvalidName, 0x03=Failed
//! ```
//!
//! The payload carries no length field. The end of the stream is the end
//! of the file, so a transfer cut short by a peer closing early looks the
//! same as a complete, smaller file.

pub mod constants;

pub use constants::{Command, Status};
