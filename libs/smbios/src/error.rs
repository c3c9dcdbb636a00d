//! Error types for table acquisition.
//!
//! None of these escape [`crate::Smbios`]; the facade logs them and degrades
//! to fewer (or no) structures.

use std::io;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A tier's file, interface or permission is missing.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),
    /// The physical memory range could not be read.
    #[error("failed to map {length:#x} bytes at {base:#x}: {source}")]
    MapFailed {
        base: u64,
        length: usize,
        #[source]
        source: io::Error,
    },
    /// An anchor matched but its bytes do not sum to zero.
    #[error("entry point checksum invalid at offset {offset:#x}")]
    ChecksumInvalid { offset: usize },
    /// A structure header lies about its length or runs out of bounds.
    #[error("structure table corrupt at offset {offset:#x}")]
    TableCorrupt { offset: usize },
    #[error("no SMBIOS table found")]
    NoTableFound,
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
