//! filedrop client.
//!
//! Each operation opens its own connection, issues a single command, and
//! closes the connection before returning.

mod client;

pub use client::{ClientConfig, Download, FileClient, bare_file_name, download_file_name};
