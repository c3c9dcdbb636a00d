//! Ties the sources, the scanner and the walker together.

use crate::acquire::{Acquired, EfiSystab, NativeSource, RawTableBuffer, Sysfs, TableAcquirer, TableLocator, TableSource};
use crate::config::Config;
use crate::entry::{EntryPointDescriptor, Version};
use crate::physmem::{DevMem, PhysicalMemory};
use crate::scan::{self, Candidate};
use crate::walk::{self, DmiHeader, Structure, WalkStatus};

/// Printed in place of a version when no source provided one.
pub const UNKNOWN_VERSION: &str = "unknown";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableStatus {
    /// No source produced a table; everything is empty.
    Unavailable,
    /// The walk ended at End-Of-Table or the end of the table.
    Complete,
    /// The walk stopped early; structures before the stop are kept.
    Partial(WalkStatus),
}

/// The structure table of this machine.
///
/// Acquisition never fails outright: when nothing can be read the result is
/// simply empty, with [`TableStatus::Unavailable`].
pub struct Smbios {
    config: Config,
    table: Option<Acquired>,
    headers: Vec<DmiHeader>,
    candidates: Vec<Candidate>,
    status: TableStatus,
}

impl Smbios {
    /// Reads the table from the default platform locations.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let mut smbios = Self::empty(config);
        smbios.refresh();
        smbios
    }

    /// Reads the table through caller supplied sources instead of the ones
    /// named in `config`; only the scan window is taken from it.
    pub fn from_sources(
        config: Config,
        native: &dyn NativeSource,
        locator: &dyn TableLocator,
        memory: &dyn PhysicalMemory,
    ) -> Self {
        let mut smbios = Self::empty(config);
        smbios.refresh_from(native, locator, memory);
        smbios
    }

    fn empty(config: Config) -> Self {
        Self {
            config,
            table: None,
            headers: Vec::new(),
            candidates: Vec::new(),
            status: TableStatus::Unavailable,
        }
    }

    /// Discards the current table and acquires it again.
    pub fn refresh(&mut self) {
        let native = Sysfs::new(&self.config.sysfs_dir);
        let locator = EfiSystab::new(&self.config.efi_systab);
        let memory = DevMem::new(&self.config.memory_device);
        self.refresh_from(&native, &locator, &memory);
    }

    pub fn refresh_from(&mut self, native: &dyn NativeSource, locator: &dyn TableLocator, memory: &dyn PhysicalMemory) {
        self.table = None;
        self.headers.clear();
        self.candidates.clear();
        self.status = TableStatus::Unavailable;

        let acquired = match TableAcquirer::new(native, locator, memory).acquire() {
            Ok(x) => Some(x),
            Err(err) => {
                log::info!("{}, falling back to physical memory scan", err);
                self.scan_memory(memory)
            }
        };

        let table = match acquired {
            Some(x) if !x.buffer.is_empty() => x,
            _ => {
                log::warn!("{}", crate::Error::NoTableFound);
                return;
            }
        };

        let walk = walk::walk(table.buffer.as_slice());
        self.status = match walk.status {
            s if s.is_complete() => TableStatus::Complete,
            s => TableStatus::Partial(s),
        };
        self.headers = walk.headers;

        log::info!(
            "SMBIOS {} from {:?}: {} structures in {} bytes",
            table.version.map(|v| v.to_string()).unwrap_or_else(|| UNKNOWN_VERSION.into()),
            table.source,
            self.headers.len(),
            table.buffer.len(),
        );
        self.table = Some(table);
    }

    /// Last tier: dump the scan window, find the best anchor and read the
    /// table it points at.
    fn scan_memory(&mut self, memory: &dyn PhysicalMemory) -> Option<Acquired> {
        let window = self.config.scan_window;
        let dump = match memory.map(window.base, window.length) {
            Ok(x) => x,
            Err(err) => {
                log::warn!("memory scan unavailable: {}", err);
                return None;
            }
        };

        self.candidates = scan::scan(&dump);
        let entry_point = match scan::select(&self.candidates) {
            Some(c) => c.entry_point,
            None => {
                log::warn!("no valid entry point among {} anchors", self.candidates.len());
                return None;
            }
        };

        let address = entry_point.table_address;
        let length = entry_point.table_length as usize;
        if length == 0 {
            log::warn!("entry point declares an empty table");
            return None;
        }

        let buffer = match window.locate(address, length).and_then(|range| RawTableBuffer::new(dump, range)) {
            Some(x) => x,
            None => match memory.map(address, length) {
                Ok(bytes) => RawTableBuffer::from(bytes),
                Err(err) => {
                    log::warn!("{}", err);
                    return None;
                }
            },
        };

        Some(Acquired {
            source: TableSource::MemoryScan,
            address: Some(address),
            version: Some(entry_point.version),
            entry_point: Some(entry_point),
            buffer,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn status(&self) -> TableStatus {
        self.status
    }

    pub fn is_available(&self) -> bool {
        self.table.is_some()
    }

    pub fn source(&self) -> Option<TableSource> {
        self.table.as_ref().map(|t| t.source)
    }

    /// Physical address of the table; `None` for kernel-provided copies.
    pub fn table_address(&self) -> Option<u64> {
        self.table.as_ref().and_then(|t| t.address)
    }

    /// Raw table bytes, empty when unavailable.
    pub fn table(&self) -> &[u8] {
        match &self.table {
            Some(t) => t.buffer.as_slice(),
            None => &[],
        }
    }

    pub fn table_size(&self) -> usize {
        self.table().len()
    }

    pub fn structures_count(&self) -> usize {
        self.headers.len()
    }

    pub fn headers(&self) -> &[DmiHeader] {
        &self.headers
    }

    pub fn structures(&self) -> impl Iterator<Item = Structure<'_>> + '_ {
        let table = self.table();
        self.headers.iter().filter_map(move |h| Structure::new(table, *h))
    }

    pub fn version(&self) -> Option<Version> {
        self.table.as_ref().and_then(|t| t.version)
    }

    /// `"<major>.<minor>"`, or [`UNKNOWN_VERSION`].
    pub fn version_string(&self) -> String {
        match self.version() {
            Some(v) => v.to_string(),
            None => UNKNOWN_VERSION.to_string(),
        }
    }

    /// The entry point the table was found through. `None` for kernel copies.
    pub fn entry_point(&self) -> Option<&EntryPointDescriptor> {
        self.table.as_ref().and_then(|t| t.entry_point.as_ref())
    }

    /// Anchors found by the memory scan, valid or not. Empty unless the scan ran.
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }
}
