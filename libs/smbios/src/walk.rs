//! Walking the structure table.
//!
//! Each structure is a formatted area of `length` bytes (header included)
//! followed by a string section ending in two zero bytes. The walk stops at
//! the End-Of-Table structure, at a header claiming fewer than 4 bytes, or
//! at anything that would cross the end of the table. Whatever was collected
//! before the stop is kept.

use core::ops::Range;

use crate::{Header, HeaderType, TextIterator};

const END_OF_TABLE: u8 = HeaderType::EndOfTable as u8;

/// Smallest valid formatted area, the header itself.
pub const MIN_LENGTH: u8 = Header::SIZE as u8;

/// A structure header plus its position in the table it was read from.
/// Only meaningful together with that table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DmiHeader {
    pub typ: u8,
    /// Length of the formatted area, header included.
    pub length: u8,
    pub handle: u16,
    /// Offset of the structure's first byte within the table.
    pub offset: usize,
}

impl DmiHeader {
    pub fn kind(&self) -> Option<HeaderType> {
        HeaderType::from_u8(self.typ)
    }

    pub fn formatted_range(&self) -> Range<usize> {
        self.offset..self.offset + self.length as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalkStatus {
    /// Reached the End-Of-Table structure.
    EndOfTable,
    /// Consumed the table exactly, without a sentinel.
    Exhausted,
    /// A header at `offset` declared a length below 4.
    Corrupt { offset: usize },
    /// The structure at `offset` runs past the end of the table.
    Truncated { offset: usize },
}

impl WalkStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::EndOfTable | Self::Exhausted)
    }

    /// Where the walk gave up, for the partial cases.
    pub fn error(&self) -> Option<crate::Error> {
        match *self {
            Self::Corrupt { offset } | Self::Truncated { offset } => Some(crate::Error::TableCorrupt { offset }),
            _ => None,
        }
    }
}

/// Yields headers in table order, applying the stopping rules above.
pub struct Walker<'a> {
    table: &'a [u8],
    offset: usize,
    status: Option<WalkStatus>,
}

impl<'a> Walker<'a> {
    pub fn new(table: &'a [u8]) -> Self {
        Self {
            table,
            offset: 0,
            status: None,
        }
    }

    /// `None` until the walk has stopped.
    pub fn status(&self) -> Option<WalkStatus> {
        self.status
    }

    fn step(&mut self) -> Result<DmiHeader, WalkStatus> {
        let offset = self.offset;
        if offset >= self.table.len() {
            return Err(WalkStatus::Exhausted);
        }

        let raw = match Header::from_bytes(&self.table[offset..]) {
            Some(x) => x,
            None => return Err(WalkStatus::Truncated { offset }),
        };

        if raw.len < MIN_LENGTH {
            return Err(WalkStatus::Corrupt { offset });
        }
        if raw.typ == END_OF_TABLE {
            return Err(WalkStatus::EndOfTable);
        }

        let header = DmiHeader {
            typ: raw.typ,
            length: raw.len,
            handle: raw.handle(),
            offset,
        };

        let formatted_end = header.formatted_range().end;
        if formatted_end > self.table.len() {
            return Err(WalkStatus::Truncated { offset });
        }

        match find_terminator(&self.table[formatted_end..]) {
            Some(n) => self.offset = formatted_end + n + 2,
            None => {
                log::warn!("string section of structure at {:#x} is unterminated", offset);
                self.offset = self.table.len();
                self.status = Some(WalkStatus::Truncated { offset });
            }
        }

        return Ok(header);
    }
}

impl<'a> Iterator for Walker<'a> {
    type Item = DmiHeader;

    fn next(&mut self) -> Option<Self::Item> {
        if self.status.is_some() {
            return None;
        }

        match self.step() {
            Ok(header) => Some(header),
            Err(status) => {
                if let Some(err) = status.error() {
                    log::warn!("{}, keeping structures read so far", err);
                }
                self.status = Some(status);
                None
            }
        }
    }
}

impl core::iter::FusedIterator for Walker<'_> {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Walk {
    pub headers: Vec<DmiHeader>,
    pub status: WalkStatus,
}

/// Counting pass; stops exactly where [`walk`] does.
pub fn count(table: &[u8]) -> usize {
    Walker::new(table).count()
}

pub fn walk(table: &[u8]) -> Walk {
    let mut walker = Walker::new(table);
    let headers: Vec<DmiHeader> = walker.by_ref().collect();
    let status = walker.status().unwrap_or(WalkStatus::Exhausted);

    log::debug!("{} structures, {:?}", headers.len(), status);
    return Walk { headers, status };
}

fn find_terminator(bytes: &[u8]) -> Option<usize> {
    bytes.windows(2).position(|w| w == [0, 0])
}

/// A structure borrowed from its table.
#[derive(Clone, Copy, Debug)]
pub struct Structure<'a> {
    pub header: DmiHeader,
    /// Formatted area, header included.
    pub formatted: &'a [u8],
    /// String section including its double-null terminator when present.
    pub strings: &'a [u8],
}

impl<'a> Structure<'a> {
    /// `None` if `header` does not fit in `table`, e.g. it came from another one.
    pub fn new(table: &'a [u8], header: DmiHeader) -> Option<Self> {
        let range = header.formatted_range();
        let formatted = table.get(range.clone())?;
        let tail = &table[range.end..];
        let strings = match find_terminator(tail) {
            Some(n) => &tail[..n + 2],
            None => tail,
        };

        Some(Self { header, formatted, strings })
    }

    /// Formatted area after the 4-byte header.
    pub fn data(&self) -> &'a [u8] {
        &self.formatted[Header::SIZE..]
    }

    pub fn strings(&self) -> TextIterator<'a> {
        TextIterator::new(self.strings)
    }

    /// String `index` as referenced from the formatted area; 0 means none.
    pub fn string(&self, index: u8) -> Option<&'a [u8]> {
        let index = (index as usize).checked_sub(1)?;
        self.strings().nth(index)
    }
}
