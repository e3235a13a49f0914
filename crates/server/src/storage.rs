use std::path::{Path, PathBuf};

use filedrop_data_channel::{TransferError, validate_file_name};
use tokio::fs::File;

/// Flat directory holding every uploaded file.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a validated name to its path under the storage root.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, TransferError> {
        validate_file_name(name)?;
        Ok(self.root.join(name))
    }

    /// Creates (or truncates) the file stored under `name`.
    ///
    /// A root that cannot be created, or a name the filesystem refuses, is
    /// [`TransferError::Local`].
    pub async fn create(&self, name: &str) -> Result<(File, PathBuf), TransferError> {
        let path = self.resolve(name)?;
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(TransferError::Local)?;
        let file = File::create(&path).await.map_err(TransferError::Local)?;
        Ok((file, path))
    }

    /// Opens the file stored under `name` for reading.
    ///
    /// Missing files and non-regular files are both
    /// [`TransferError::FileNotFound`].
    pub async fn open(&self, name: &str) -> Result<File, TransferError> {
        let path = self.resolve(name)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(TransferError::FileNotFound(name.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TransferError::FileNotFound(name.to_string()));
            }
            Err(e) => return Err(TransferError::Local(e)),
        }
        File::open(&path).await.map_err(TransferError::Local)
    }
}
