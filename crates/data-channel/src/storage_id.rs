//! Random storage identifiers for uploaded files.

use rand::Rng;

/// Identifier length in bytes (produces 32 hex characters).
const STORAGE_ID_BYTES: usize = 16;

/// Generates a random 128-bit identifier as a 32-character lowercase hex string.
pub fn generate_storage_id() -> String {
    let mut bytes = [0u8; STORAGE_ID_BYTES];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}

/// Prefixes `name` with a fresh storage id, space-joined.
///
/// Two uploads of the same name from different clients land in different
/// files. The prefixed name is only used server-side and never sent back.
pub fn unique_name(name: &str) -> String {
    format!("{} {name}", generate_storage_id())
}
