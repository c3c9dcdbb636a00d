//! SMBIOS 2.x (32-bit) entry point.

use bytemuck::{Pod, Zeroable};

pub const ANCHOR: [u8; 4] = *b"_SM_";
pub const INTERMEDIATE_ANCHOR: [u8; 5] = *b"_DMI_";

/// Offset of the `_DMI_` intermediate anchor, start of the intermediate checksum range.
pub const INTERMEDIATE_OFFSET: usize = 0x10;

#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct EntryPoint {
    /// Must be b"_SM_"
    pub anchor_str: [u8; 4],
    pub checksum: u8,
    pub length: u8,
    pub major_version: u8,
    pub minor_version: u8,
    pub max_struct_size: u16,
    pub entry_point_rev: u8,
    pub formatted_area: [u8; 5],
    /// Must be b"_DMI_"
    pub entry_point_string: [u8; 5],
    pub checksum2: u8,

    pub table_byte_length: u16,
    pub table_address: u32,
    pub number_of_structs: u16,

    pub bcd_rev: u8,
}

pub const SIZE: usize = core::mem::size_of::<EntryPoint>();

impl EntryPoint {
    /// Decodes the fixed fields at the start of `bytes`.
    /// Returns `None` only if fewer than `SIZE` bytes are available.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let raw = bytes.get(..SIZE)?;
        return Some(bytemuck::pod_read_unaligned(raw));
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    pub fn has_anchor(&self) -> bool {
        self.anchor_str == ANCHOR
    }

    pub fn max_struct_size(&self) -> u16 {
        u16::from_le(self.max_struct_size)
    }

    pub fn table_byte_length(&self) -> u16 {
        u16::from_le(self.table_byte_length)
    }

    pub fn table_address(&self) -> u32 {
        u32::from_le(self.table_address)
    }

    pub fn number_of_structs(&self) -> u16 {
        u16::from_le(self.number_of_structs)
    }

    /// `_DMI_` anchor present and bytes 0x10..0x1F summing to zero.
    pub fn intermediate_valid(&self) -> bool {
        let bytes = self.as_bytes();
        self.entry_point_string == INTERMEDIATE_ANCHOR
            && crate::entry::checksum(&bytes[INTERMEDIATE_OFFSET..]) == 0
    }
}
