//! Unified view over the 32-bit and 64-bit entry points.

use core::fmt;

use crate::{v2, v3};

/// Byte sum modulo 256.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Version {
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnchorKind {
    /// `_SM_`, 32-bit table address
    Smbios2,
    /// `_SM3_`, 64-bit table address
    Smbios3,
}

impl AnchorKind {
    /// Matches an anchor signature at the start of `bytes`.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&v3::ANCHOR) {
            return Some(Self::Smbios3);
        }
        if bytes.starts_with(&v2::ANCHOR) {
            return Some(Self::Smbios2);
        }
        return None;
    }

    /// Fixed size of the decoded structure.
    pub const fn size(self) -> usize {
        match self {
            Self::Smbios2 => v2::SIZE,
            Self::Smbios3 => v3::SIZE,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntryPointDescriptor {
    pub kind: AnchorKind,
    pub version: Version,
    /// Declared size of the entry point itself.
    pub length: u8,
    /// Entry point structure revision.
    pub revision: u8,
    pub table_address: u64,
    /// Exact length for `Smbios2`, maximum size for `Smbios3`.
    pub table_length: u32,
    /// Only `Smbios2` declares a structure count.
    pub structure_count: Option<u16>,
    pub checksum: u8,
    /// Bytes over the declared entry point length sum to zero.
    pub checksum_valid: bool,
    /// `_DMI_` intermediate anchor and checksum, `Smbios2` only.
    pub intermediate_valid: Option<bool>,
    pub intermediate_checksum: Option<u8>,
    pub max_structure_size: Option<u16>,
    pub bcd_revision: Option<u8>,
    /// SMBIOS document revision, `Smbios3` only.
    pub docrev: Option<u8>,
}

impl EntryPointDescriptor {
    /// Decodes whichever entry point starts at `bytes[0]`.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        match AnchorKind::detect(bytes)? {
            AnchorKind::Smbios2 => Self::decode_v2(bytes),
            AnchorKind::Smbios3 => Self::decode_v3(bytes),
        }
    }

    pub fn decode_v2(bytes: &[u8]) -> Option<Self> {
        let ep = v2::EntryPoint::from_bytes(bytes)?;
        if !ep.has_anchor() {
            return None;
        }

        return Some(Self {
            kind: AnchorKind::Smbios2,
            version: Version::new(ep.major_version, ep.minor_version),
            length: ep.length,
            revision: ep.entry_point_rev,
            table_address: ep.table_address() as u64,
            table_length: ep.table_byte_length() as u32,
            structure_count: Some(ep.number_of_structs()),
            checksum: ep.checksum,
            checksum_valid: declared_sum_is_zero(bytes, ep.length),
            intermediate_valid: Some(ep.intermediate_valid()),
            intermediate_checksum: Some(ep.checksum2),
            max_structure_size: Some(ep.max_struct_size()),
            bcd_revision: Some(ep.bcd_rev),
            docrev: None,
        });
    }

    pub fn decode_v3(bytes: &[u8]) -> Option<Self> {
        let ep = v3::EntryPoint::from_bytes(bytes)?;
        if !ep.has_anchor() {
            return None;
        }

        return Some(Self {
            kind: AnchorKind::Smbios3,
            version: Version::new(ep.major_version, ep.minor_version),
            length: ep.length,
            revision: ep.revision,
            table_address: ep.table_addr(),
            table_length: ep.table_max_size(),
            structure_count: None,
            checksum: ep.checksum,
            checksum_valid: declared_sum_is_zero(bytes, ep.length),
            intermediate_valid: None,
            intermediate_checksum: None,
            max_structure_size: None,
            bcd_revision: None,
            docrev: Some(ep.docrev),
        });
    }
}

/// The declared length comes from firmware; a length of zero or one running
/// past the available bytes never validates.
fn declared_sum_is_zero(bytes: &[u8], declared: u8) -> bool {
    let declared = declared as usize;
    if declared == 0 {
        return false;
    }

    match bytes.get(..declared) {
        Some(region) => checksum(region) == 0,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::Zeroable;

    fn sealed_v2(table_address: u32, table_length: u16, count: u16) -> v2::EntryPoint {
        let mut ep = v2::EntryPoint::zeroed();
        ep.anchor_str = v2::ANCHOR;
        ep.length = v2::SIZE as u8;
        ep.major_version = 2;
        ep.minor_version = 7;
        ep.entry_point_string = v2::INTERMEDIATE_ANCHOR;
        ep.table_address = table_address.to_le();
        ep.table_byte_length = table_length.to_le();
        ep.number_of_structs = count.to_le();
        ep.max_struct_size = 0x00a0u16.to_le();
        ep.entry_point_rev = 0;
        ep.bcd_rev = 0x27;
        ep.checksum2 = 0u8.wrapping_sub(checksum(&ep.as_bytes()[v2::INTERMEDIATE_OFFSET..]));
        ep.checksum = 0u8.wrapping_sub(checksum(ep.as_bytes()));
        ep
    }

    #[test]
    fn version_display() {
        assert_eq!(Version::new(3, 4).to_string(), "3.4");
        assert_eq!(Version::new(2, 10).to_string(), "2.10");
        assert!(Version::new(2, 8) < Version::new(3, 0));
    }

    #[test]
    fn detect_anchor() {
        assert_eq!(AnchorKind::detect(b"_SM_...."), Some(AnchorKind::Smbios2));
        assert_eq!(AnchorKind::detect(b"_SM3_..."), Some(AnchorKind::Smbios3));
        assert_eq!(AnchorKind::detect(b"_DMI_..."), None);
        assert_eq!(AnchorKind::detect(b"_SM"), None);
    }

    #[test]
    fn v2_descriptor() {
        let ep = sealed_v2(0x000f_0800, 0x0400, 12);
        let desc = EntryPointDescriptor::decode(ep.as_bytes()).unwrap();

        assert_eq!(desc.kind, AnchorKind::Smbios2);
        assert_eq!(desc.version, Version::new(2, 7));
        assert_eq!(desc.table_address, 0x000f_0800);
        assert_eq!(desc.table_length, 0x0400);
        assert_eq!(desc.structure_count, Some(12));
        assert!(desc.checksum_valid);
        assert_eq!(desc.intermediate_valid, Some(true));
        assert_eq!(desc.length, 0x1F);
        assert_eq!(desc.max_structure_size, Some(0x00a0));
        assert_eq!(desc.bcd_revision, Some(0x27));
        assert_eq!(desc.intermediate_checksum, Some(ep.checksum2));
        assert_eq!(desc.docrev, None);
    }

    #[test]
    fn v3_descriptor() {
        let mut ep = v3::EntryPoint::zeroed();
        ep.anchor_str = v3::ANCHOR;
        ep.length = v3::SIZE as u8;
        ep.major_version = 3;
        ep.minor_version = 2;
        ep.docrev = 1;
        ep.revision = 1;
        ep.table_max_size = 0x1800u32.to_le();
        ep.table_addr = 0x1_0000_0000u64.to_le();
        ep.checksum = 0u8.wrapping_sub(checksum(ep.as_bytes()));

        let desc = EntryPointDescriptor::decode(ep.as_bytes()).unwrap();
        assert_eq!(desc.kind, AnchorKind::Smbios3);
        assert_eq!(desc.version, Version::new(3, 2));
        assert_eq!(desc.table_address, 0x1_0000_0000);
        assert_eq!(desc.table_length, 0x1800);
        assert_eq!(desc.structure_count, None);
        assert!(desc.checksum_valid);
        assert_eq!(desc.intermediate_valid, None);
        assert_eq!(desc.length, 0x18);
        assert_eq!(desc.revision, 1);
        assert_eq!(desc.docrev, Some(1));
        assert_eq!(desc.max_structure_size, None);
    }

    #[test]
    fn flipped_byte_fails_checksum() {
        let ep = sealed_v2(0x000e_0000, 0x200, 3);
        let mut raw = ep.as_bytes().to_vec();
        raw[0x18] ^= 0x01;

        let desc = EntryPointDescriptor::decode(&raw).unwrap();
        assert!(!desc.checksum_valid);
        assert_eq!(desc.table_address, 0x000e_0001);
    }

    #[test]
    fn declared_length_out_of_range() {
        let mut ep = sealed_v2(0x000e_0000, 0x200, 3);
        ep.length = 0x40;
        assert!(!EntryPointDescriptor::decode(ep.as_bytes()).unwrap().checksum_valid);

        ep.length = 0;
        assert!(!EntryPointDescriptor::decode(ep.as_bytes()).unwrap().checksum_valid);
    }

    #[test]
    fn truncated_anchor() {
        let ep = sealed_v2(0x000e_0000, 0x200, 3);
        assert!(EntryPointDescriptor::decode(&ep.as_bytes()[..20]).is_none());
    }
}
