//! Locates the SMBIOS/DMI structure table exposed by firmware and walks it
//! into an ordered list of structure headers.
//!
//! Sources are tried from least to most invasive: the kernel's sysfs copy
//! of the table, the table address published in the EFI system table, and
//! finally a scan of the legacy BIOS area for `_SM_`/`_SM3_` anchors.
//! See [`Smbios`].

pub mod acquire;
pub mod config;
pub mod entry;
pub mod error;
pub mod physmem;
pub mod scan;
pub mod smbios;
pub mod v2;
pub mod v3;
pub mod walk;

mod text_iter;
pub use text_iter::*;

pub use acquire::{Acquired, EfiSystab, NativeSource, NativeTable, RawTableBuffer, Sysfs, TableAcquirer, TableLocation, TableLocator, TableSource};
pub use config::{Config, ScanWindow};
pub use entry::{AnchorKind, EntryPointDescriptor, Version};
pub use error::{Error, Result};
pub use physmem::{DevMem, PhysicalMemory};
pub use smbios::{Smbios, TableStatus};
pub use walk::{DmiHeader, Structure, Walk, WalkStatus};

use bytemuck::{Pod, Zeroable};

/// On-disk layout of the fixed structure header.
#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct Header {
    pub typ:    u8,
    pub len:    u8,
    pub handle: u16,
}

impl Header {
    pub const SIZE: usize = core::mem::size_of::<Header>();

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let raw = bytes.get(..Self::SIZE)?;
        return Some(bytemuck::pod_read_unaligned(raw));
    }

    pub fn handle(&self) -> u16 {
        u16::from_le(self.handle)
    }
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderType {
    Bios                           = 0,
    System,
    Mainboard,
    Chassis,
    Processor                      = 4,

    MemoryController               = 5,
    MemoryModule                   = 6,

    Cache                          = 7,
    PortConnector                  = 8,
    SystemSlots                    = 9,
    OnBoardDevices                 = 10,
    OemStrings                     = 11,
    SystemConfigOptions,
    BiosLang,
    GroupAssoc,
    SystemEventLog,
    PhysicalMemoryArray,
    MemoryDevice,
    U32MemoryErrorInformation,
    MemoryArrayMappedAddress,
    MemoryDeviceMappedAddress,
    BuiltinPointerDevice,
    PortableBattery,
    SystemReset,
    HardwareSecurity,
    SystemPowerControls,
    VoltageProbe,
    CoolingDevice,
    TemperatureProbe,
    ElectricalCurrentProbe,
    OutOfBandRemoteAccess,
    BootIntegrityServicesEntryPoint,
    SystemBoot                     = 32,

    U64MemoryErrorInformation      = 33,
    ManagementDevice,
    ManagementDeviceComponent,
    ManagementDeviceThreshold,
    MemoryChannel,
    IpmiDevice,
    SystemPowerSupply,
    AdditionalInformation,
    OnboardDevicesExtended,
    ManagementControllerHostInterface,
    TpmDevice,
    ProcessorAdditionalInformation = 44,

    Inactive                       = 126,
    EndOfTable                     = 127,
}

impl HeaderType {
    /// OEM-specific types (128 and up) and unassigned values have no variant.
    pub fn from_u8(x: u8) -> Option<Self> {
        let x = match x {
            /* SAFETY: discriminants 0..=44 are contiguous */
            0..=44 => unsafe { core::mem::transmute::<u8, HeaderType>(x) },
            126 => Self::Inactive,
            127 => Self::EndOfTable,
            _ => return None,
        };

        return Some(x);
    }
}
