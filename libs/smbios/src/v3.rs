//! SMBIOS 3.x (64-bit) entry point.
//!
//! Unlike 2.x there is no structure count, and `table_max_size` is an upper
//! bound rather than the exact table length.

use bytemuck::{Pod, Zeroable};

pub const ANCHOR: [u8; 5] = *b"_SM3_";

#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct EntryPoint {
    /// Must be b"_SM3_"
    pub anchor_str: [u8; 5],

    pub checksum: u8,
    pub length:   u8,

    pub major_version: u8,
    pub minor_version: u8,
    pub docrev:        u8,

    pub revision:  u8,
    pub _reserved: u8,

    pub table_max_size: u32,
    pub table_addr:     u64,
}

pub const SIZE: usize = core::mem::size_of::<EntryPoint>();

impl EntryPoint {
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

    pub fn table_max_size(&self) -> u32 {
        u32::from_le(self.table_max_size)
    }

    pub fn table_addr(&self) -> u64 {
        u64::from_le(self.table_addr)
    }
}
