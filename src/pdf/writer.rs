use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::CompressError;

/// Output bytes parked in a temporary file next to the destination.
///
/// Nothing appears at the destination path until [`StagedOutput::commit`].
/// Dropping an uncommitted value removes the temporary file.
#[derive(Debug)]
pub struct StagedOutput {
    temp: NamedTempFile,
    destination: PathBuf,
    len: u64,
}

impl StagedOutput {
    pub fn stage(destination: &Path, bytes: &[u8]) -> Result<Self, CompressError> {
        let dir = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = tempfile::Builder::new()
            .prefix(".pdf-compressor-")
            .suffix(".tmp")
            .tempfile_in(dir)?;
        temp.write_all(bytes)?;
        temp.as_file().sync_all()?;

        log::debug!(
            "Staged {} bytes at {}",
            bytes.len(),
            temp.path().display()
        );

        Ok(Self {
            temp,
            destination: destination.to_path_buf(),
            len: bytes.len() as u64,
        })
    }

    /// Size of the staged output in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Atomically move the staged file into place
    pub fn commit(self) -> Result<PathBuf, CompressError> {
        let Self {
            temp, destination, ..
        } = self;
        temp.persist(&destination).map_err(|e| CompressError::Io(e.error))?;
        Ok(destination)
    }
}
