//! filedrop server.
//!
//! Listens on a TCP port and serves one connection at a time: each
//! connection carries a single upload or download, after which it is closed
//! and the next queued connection is accepted.

mod server;
mod storage;

pub use server::{FileServer, Served, ServerConfig};
pub use storage::Storage;
