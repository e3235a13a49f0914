//! Transport primitives shared by the filedrop server and client.
//!
//! Everything here is generic over tokio's async I/O traits so the same
//! helpers drive a `TcpStream`, a file, or an in-memory buffer.
//!
//! # Wire format
//!
//! See [`filedrop_protocol`] for the byte layout of a request.

pub mod chunked;
pub mod error;
pub mod name;
pub mod storage_id;
pub mod wire;

pub use chunked::{receive_chunked, send_chunked};
pub use error::TransferError;
pub use name::validate_file_name;
pub use storage_id::{generate_storage_id, unique_name};
pub use wire::{
    read_command, read_status, receive_name, receive_unique_name, send_name, write_command,
    write_status,
};
