//! Reading query images from disk.
//!
//! Large files are memory-mapped so the decoder reads straight from the
//! page cache instead of a heap copy.

use crate::error::IngestError;
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// Minimum file size to use memory-mapped I/O (1MB)
const MMAP_THRESHOLD: u64 = 1024 * 1024;

/// Read a file, memory-mapping it when it is at least 1MB.
pub fn read_file_bytes(path: &Path) -> Result<FileBytes, IngestError> {
    let unreadable = |source| IngestError::Unreadable {
        path: path.to_path_buf(),
        source,
    };

    let metadata = std::fs::metadata(path).map_err(unreadable)?;

    if metadata.len() >= MMAP_THRESHOLD {
        let file = File::open(path).map_err(unreadable)?;

        // SAFETY: the mapping is read-only and lives no longer than the
        // returned value, which owns it.
        let mmap = unsafe { Mmap::map(&file) }.map_err(unreadable)?;
        Ok(FileBytes::Mmap(mmap))
    } else {
        let bytes = std::fs::read(path).map_err(unreadable)?;
        Ok(FileBytes::Vec(bytes))
    }
}

/// File bytes that may be either owned or memory-mapped.
pub enum FileBytes {
    /// Standard heap-allocated bytes
    Vec(Vec<u8>),
    /// Memory-mapped bytes
    Mmap(Mmap),
}

impl FileBytes {
    pub fn is_mapped(&self) -> bool {
        matches!(self, FileBytes::Mmap(_))
    }
}

impl AsRef<[u8]> for FileBytes {
    fn as_ref(&self) -> &[u8] {
        match self {
            FileBytes::Vec(v) => v,
            FileBytes::Mmap(m) => m,
        }
    }
}

impl std::ops::Deref for FileBytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_ref()
    }
}
