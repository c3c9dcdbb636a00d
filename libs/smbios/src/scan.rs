//! Brute-force search for entry point anchors in a memory dump.
//!
//! Anchors sit on 16-byte boundaries. Any ROM content can contain the
//! signature by accident, so every match is recorded together with its
//! checksum result and [`select`] picks the one to trust.

use crate::entry::{AnchorKind, EntryPointDescriptor};

pub const ALIGNMENT: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Candidate {
    /// Offset of the anchor within the scanned buffer.
    pub offset: usize,
    pub entry_point: EntryPointDescriptor,
}

impl Candidate {
    pub fn is_valid(&self) -> bool {
        self.entry_point.checksum_valid
    }
}

/// Every anchor match in `buffer`, in address order.
pub fn scan(buffer: &[u8]) -> Vec<Candidate> {
    let mut found = Vec::new();

    for offset in (0..buffer.len()).step_by(ALIGNMENT) {
        let window = &buffer[offset..];

        let decoded = match AnchorKind::detect(window) {
            Some(AnchorKind::Smbios2) => EntryPointDescriptor::decode_v2(window),
            Some(AnchorKind::Smbios3) => EntryPointDescriptor::decode_v3(window),
            None => continue,
        };

        let entry_point = match decoded {
            Some(x) => x,
            None => {
                log::debug!("anchor at {:#x} truncated by end of buffer", offset);
                continue;
            }
        };

        if entry_point.checksum_valid {
            log::info!("{:?} entry point at {:#x}, version {}", entry_point.kind, offset, entry_point.version);
        } else {
            log::warn!("{}", crate::Error::ChecksumInvalid { offset });
        }

        found.push(Candidate { offset, entry_point });
    }

    return found;
}

/// First valid 64-bit candidate, else first valid 32-bit one.
pub fn select(candidates: &[Candidate]) -> Option<&Candidate> {
    let valid = |kind: AnchorKind| candidates.iter().find(move |c| c.is_valid() && c.entry_point.kind == kind);

    valid(AnchorKind::Smbios3).or_else(|| valid(AnchorKind::Smbios2))
}
