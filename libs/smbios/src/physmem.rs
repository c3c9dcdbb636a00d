//! Copying physical memory ranges out of a memory device.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Copies `length` bytes of physical memory starting at `base`.
///
/// Implementations fail with [`Error::MapFailed`] when the platform denies
/// access or the range is unavailable.
pub trait PhysicalMemory {
    fn map(&self, base: u64, length: usize) -> Result<Vec<u8>>;
}

/// A `/dev/mem`-style device, where the file offset is the physical address.
#[derive(Clone, Debug)]
pub struct DevMem {
    path: PathBuf,
}

impl DevMem {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_range(&self, base: u64, length: usize) -> std::io::Result<Vec<u8>> {
        let mut device = File::open(&self.path)?;
        device.seek(SeekFrom::Start(base))?;

        let mut bytes = vec![0u8; length];
        device.read_exact(&mut bytes)?;
        Ok(bytes)
    }
}

impl PhysicalMemory for DevMem {
    fn map(&self, base: u64, length: usize) -> Result<Vec<u8>> {
        log::debug!("reading {:#x} bytes at {:#x} from {}", length, base, self.path.display());
        self.read_range(base, length)
            .map_err(|source| Error::MapFailed { base, length, source })
    }
}
