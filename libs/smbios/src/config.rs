//! Where to look for the table.

use std::ops::Range;
use std::path::PathBuf;

pub const SYSFS_DMI_DIR: &str = "/sys/firmware/dmi/tables";
pub const EFI_SYSTAB: &str = "/sys/firmware/efi/systab";
pub const DEV_MEM: &str = "/dev/mem";

/// Physical range scanned for entry point anchors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanWindow {
    pub base: u64,
    pub length: usize,
}

impl ScanWindow {
    /// BIOS ROM area, 0xF0000..=0xFFFFF
    pub const LEGACY: Self = Self::new(0x000F_0000, 0x10000);

    pub const fn new(base: u64, length: usize) -> Self {
        Self { base, length }
    }

    pub fn end(&self) -> Option<u64> {
        self.base.checked_add(self.length as u64)
    }

    /// Offsets of `address..address + length` inside the window, if the
    /// whole range lies within it.
    pub fn locate(&self, address: u64, length: usize) -> Option<Range<usize>> {
        let end = address.checked_add(length as u64)?;
        if address < self.base || end > self.end()? {
            return None;
        }

        let start = (address - self.base) as usize;
        return Some(start..start + length);
    }
}

impl Default for ScanWindow {
    fn default() -> Self {
        Self::LEGACY
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Directory holding the kernel's `DMI` and `smbios_entry_point` files.
    pub sysfs_dir: PathBuf,
    /// EFI system table listing, `SMBIOS3=0x...` / `SMBIOS=0x...` lines.
    pub efi_systab: PathBuf,
    /// Physical memory device.
    pub memory_device: PathBuf,
    pub scan_window: ScanWindow,
}

impl Config {
    pub fn with_sysfs_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.sysfs_dir = dir.into();
        self
    }

    pub fn with_efi_systab(mut self, path: impl Into<PathBuf>) -> Self {
        self.efi_systab = path.into();
        self
    }

    pub fn with_memory_device(mut self, path: impl Into<PathBuf>) -> Self {
        self.memory_device = path.into();
        self
    }

    pub fn with_scan_window(mut self, window: ScanWindow) -> Self {
        self.scan_window = window;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sysfs_dir: PathBuf::from(SYSFS_DMI_DIR),
            efi_systab: PathBuf::from(EFI_SYSTAB),
            memory_device: PathBuf::from(DEV_MEM),
            scan_window: ScanWindow::LEGACY,
        }
    }
}
