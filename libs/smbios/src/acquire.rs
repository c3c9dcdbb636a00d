//! Platform sources that hand over the table without scanning memory.
//!
//! Tiers are tried in order and the first one to produce a non-empty table
//! wins:
//! 1. a [`NativeSource`], the kernel's own copy of the table (sysfs on Linux),
//! 2. a [`TableLocator`], which only knows where the table lives in physical
//!    memory (the EFI system table), read through [`PhysicalMemory`].
//!
//! A failing tier is logged and skipped. When both fail the caller gets
//! [`Error::NoTableFound`] and is expected to fall back to [`crate::scan`].

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::entry::{AnchorKind, EntryPointDescriptor, Version};
use crate::physmem::PhysicalMemory;
use crate::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableSource {
    Sysfs,
    Efi,
    MemoryScan,
}

/// Owned bytes plus the window holding the structure table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawTableBuffer {
    bytes: Vec<u8>,
    window: Range<usize>,
}

impl RawTableBuffer {
    /// `None` if `window` is not inside `bytes`.
    pub fn new(bytes: Vec<u8>, window: Range<usize>) -> Option<Self> {
        if window.start > window.end || window.end > bytes.len() {
            return None;
        }
        Some(Self { bytes, window })
    }

    pub fn window(&self) -> Range<usize> {
        self.window.clone()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[self.window.clone()]
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }
}

impl From<Vec<u8>> for RawTableBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        let window = 0..bytes.len();
        Self { bytes, window }
    }
}

/// A located table and where it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Acquired {
    pub source: TableSource,
    /// Physical address of the table, when the source knows it.
    pub address: Option<u64>,
    pub version: Option<Version>,
    /// The entry point that led to the table; kernel copies have none.
    pub entry_point: Option<EntryPointDescriptor>,
    pub buffer: RawTableBuffer,
}

/// Table bytes as handed over by the platform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NativeTable {
    pub bytes: Vec<u8>,
    pub version: Option<Version>,
}

/// A platform interface exposing the decoded table directly.
pub trait NativeSource {
    fn exists(&self) -> bool;
    fn read(&self) -> Result<NativeTable>;
}

/// Physical placement of the table, without its bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableLocation {
    pub address: u64,
    pub length: usize,
    pub version: Version,
    pub entry_point: Option<EntryPointDescriptor>,
}

/// A platform interface exposing where the table is.
pub trait TableLocator {
    fn exists(&self) -> bool;
    fn locate(&self, memory: &dyn PhysicalMemory) -> Result<TableLocation>;
}

/// `DMI` and `smbios_entry_point` under `/sys/firmware/dmi/tables`.
#[derive(Clone, Debug)]
pub struct Sysfs {
    dir: PathBuf,
}

impl Sysfs {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn table_path(&self) -> PathBuf {
        self.dir.join("DMI")
    }

    fn entry_point_path(&self) -> PathBuf {
        self.dir.join("smbios_entry_point")
    }

    /// The table is usable without the entry point, it only costs the version.
    fn read_version(&self) -> Option<Version> {
        let raw = match fs::read(self.entry_point_path()) {
            Ok(x) => x,
            Err(err) => {
                log::debug!("no entry point in sysfs: {}", err);
                return None;
            }
        };

        match EntryPointDescriptor::decode(&raw) {
            Some(ep) => Some(ep.version),
            None => {
                log::warn!("sysfs entry point not recognised ({} bytes)", raw.len());
                None
            }
        }
    }
}

impl NativeSource for Sysfs {
    fn exists(&self) -> bool {
        self.table_path().is_file()
    }

    fn read(&self) -> Result<NativeTable> {
        let bytes = fs::read(self.table_path())?;
        let version = self.read_version();
        Ok(NativeTable { bytes, version })
    }
}

/// The `SMBIOS3=` / `SMBIOS=` lines of `/sys/firmware/efi/systab`.
#[derive(Clone, Debug)]
pub struct EfiSystab {
    path: PathBuf,
}

impl EfiSystab {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Entry point addresses listed in a systab, 64-bit first.
pub fn parse_systab(text: &str) -> Vec<(AnchorKind, u64)> {
    let mut smbios3 = None;
    let mut smbios = None;

    for line in text.lines() {
        let (key, value) = match line.trim().split_once('=') {
            Some(x) => x,
            None => continue,
        };

        let value = value.trim();
        let digits = value
            .strip_prefix("0x")
            .or_else(|| value.strip_prefix("0X"))
            .unwrap_or(value);
        let address = match u64::from_str_radix(digits, 16) {
            Ok(x) => x,
            Err(_) => continue,
        };

        match key.trim() {
            "SMBIOS3" => smbios3 = smbios3.or(Some(address)),
            "SMBIOS" => smbios = smbios.or(Some(address)),
            _ => {}
        }
    }

    let mut found = Vec::new();
    found.extend(smbios3.map(|a| (AnchorKind::Smbios3, a)));
    found.extend(smbios.map(|a| (AnchorKind::Smbios2, a)));
    return found;
}

impl TableLocator for EfiSystab {
    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn locate(&self, memory: &dyn PhysicalMemory) -> Result<TableLocation> {
        let text = fs::read_to_string(&self.path)?;
        let mut last_error = Error::SourceUnavailable(format!("no SMBIOS entry in {}", self.path.display()));

        for (kind, address) in parse_systab(&text) {
            match locate_entry_point(memory, kind, address) {
                Ok(location) => return Ok(location),
                Err(err) => {
                    log::warn!("{:?} entry point at {:#x}: {}", kind, address, err);
                    last_error = err;
                }
            }
        }

        return Err(last_error);
    }
}

fn locate_entry_point(memory: &dyn PhysicalMemory, kind: AnchorKind, address: u64) -> Result<TableLocation> {
    let mut raw = memory.map(address, kind.size())?;
    let mut ep = decode_kind(&raw, kind, address)?;

    // Firmware may declare a longer entry point than the fixed layout.
    if ep.length as usize > raw.len() {
        raw = memory.map(address, ep.length as usize)?;
        ep = decode_kind(&raw, kind, address)?;
    }
    if !ep.checksum_valid {
        return Err(Error::ChecksumInvalid { offset: 0 });
    }

    Ok(TableLocation {
        address: ep.table_address,
        length: ep.table_length as usize,
        version: ep.version,
        entry_point: Some(ep),
    })
}

fn decode_kind(raw: &[u8], kind: AnchorKind, address: u64) -> Result<EntryPointDescriptor> {
    match EntryPointDescriptor::decode(raw) {
        Some(ep) if ep.kind == kind => Ok(ep),
        _ => Err(Error::SourceUnavailable(format!("no {:?} anchor at {:#x}", kind, address))),
    }
}

/// Runs the tiers in order.
pub struct TableAcquirer<'a> {
    native: &'a dyn NativeSource,
    locator: &'a dyn TableLocator,
    memory: &'a dyn PhysicalMemory,
}

impl<'a> TableAcquirer<'a> {
    pub fn new(native: &'a dyn NativeSource, locator: &'a dyn TableLocator, memory: &'a dyn PhysicalMemory) -> Self {
        Self { native, locator, memory }
    }

    /// First tier that yields a non-empty table, or [`Error::NoTableFound`].
    pub fn acquire(&self) -> Result<Acquired> {
        match self.from_native() {
            Ok(table) => return Ok(table),
            Err(err) => log::info!("kernel table source skipped: {}", err),
        }

        match self.from_locator() {
            Ok(table) => return Ok(table),
            Err(err) => log::info!("EFI table source skipped: {}", err),
        }

        return Err(Error::NoTableFound);
    }

    fn from_native(&self) -> Result<Acquired> {
        if !self.native.exists() {
            return Err(Error::SourceUnavailable("no kernel-exposed table".into()));
        }

        let table = self.native.read()?;
        if table.bytes.is_empty() {
            return Err(Error::SourceUnavailable("kernel-exposed table is empty".into()));
        }

        log::info!("read {} byte table from kernel", table.bytes.len());
        Ok(Acquired {
            source: TableSource::Sysfs,
            address: None,
            version: table.version,
            entry_point: None,
            buffer: RawTableBuffer::from(table.bytes),
        })
    }

    fn from_locator(&self) -> Result<Acquired> {
        if !self.locator.exists() {
            return Err(Error::SourceUnavailable("no EFI system table".into()));
        }

        let location = self.locator.locate(self.memory)?;
        if location.length == 0 {
            return Err(Error::SourceUnavailable("EFI entry point declares an empty table".into()));
        }

        let bytes = self.memory.map(location.address, location.length)?;
        if bytes.is_empty() {
            return Err(Error::SourceUnavailable("EFI table read returned nothing".into()));
        }

        log::info!("read {:#x} byte table at {:#x} via EFI", bytes.len(), location.address);
        Ok(Acquired {
            source: TableSource::Efi,
            address: Some(location.address),
            version: Some(location.version),
            entry_point: location.entry_point,
            buffer: RawTableBuffer::from(bytes),
        })
    }
}
