//! Persisting converted documents.

use crate::error::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Write `contents` to `dest` atomically.
///
/// The data goes to a temporary file in the destination directory first and
/// is renamed into place, so `dest` either keeps its previous state or holds
/// the complete new contents.
pub fn persist_atomic(contents: &[u8], dest: &Path) -> Result<()> {
    let storage_err = |source: std::io::Error| Error::StorageWrite {
        path: dest.to_path_buf(),
        source,
    };

    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(storage_err)?;
    tmp.write_all(contents).map_err(storage_err)?;
    tmp.as_file().sync_all().map_err(storage_err)?;
    tmp.persist(dest).map_err(|e| storage_err(e.error))?;

    debug!("Persisted {} bytes to {}", contents.len(), dest.display());
    Ok(())
}

/// Destination for archived output.
pub trait StorageSink {
    /// Store the file at `local` under `logical_name`.
    fn store(&self, local: &Path, logical_name: &str) -> Result<()>;
}

/// Archives files into a local directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl StorageSink for DirectorySink {
    fn store(&self, local: &Path, logical_name: &str) -> Result<()> {
        // Logical names are flat; anything path-like is reduced to its last component
        let name = Path::new(logical_name)
            .file_name()
            .ok_or_else(|| Error::StorageWrite {
                path: self.root.join(logical_name),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "logical name has no file name",
                ),
            })?;
        let dest = self.root.join(name);

        fs::create_dir_all(&self.root).map_err(|source| Error::StorageWrite {
            path: self.root.clone(),
            source,
        })?;
        let contents = fs::read(local)?;
        persist_atomic(&contents, &dest)
    }
}
