//! Binary layout constants and small offset helpers.
//!
//! ## File header (32 bytes)
//!
//! ```text
//! [file_type: u8 = 0x03][yy: u8][mm: u8][dd: u8]
//! [record_count: u32 LE][header_len: u16 LE][record_len: u16 LE]
//! [reserved: 17 bytes][language_driver: u8][reserved: 2 bytes]
//! ```
//!
//! `yy` is the year minus 1900, so 2024 is stored as 124.

use chrono::{Datelike, Local, NaiveDate};

/// File-type byte of a dBASE III table without memo.
pub const FILE_TYPE_DBASE3: u8 = 0x03;

/// Fixed part of the header: 32 bytes plus the 0x0D terminator.
pub const FILE_DESCRIPTOR_BYTES: usize = 33;

/// Size of one column descriptor.
pub const COLUMN_DESCRIPTOR_BYTES: usize = 32;

/// Ends the column descriptor table.
pub const HEADER_TERMINATOR: u8 = 0x0D;

/// Optional last byte of the file.
pub const EOF_MARKER: u8 = 0x1A;

/// Position of the language driver byte inside the 32-byte file header.
pub const LANGUAGE_DRIVER_OFFSET: usize = 29;

/// Record length is stored in 16 bits.
pub const MAX_RECORD_LENGTH: usize = 65535;

/// Deletion marker of a live record.
pub const VALID_FLAG: u8 = b' ';

/// Deletion marker of a deleted record.
pub const DELETED_FLAG: u8 = b'*';

/// Bytes 12..29 of the file header, skipped on read and zeroed on write.
pub(crate) const RESERVED_BEFORE_DRIVER: usize = 17;

/// Bytes 30..32 of the file header.
pub(crate) const RESERVED_AFTER_DRIVER: usize = 2;

/// Trailing reserved bytes of a column descriptor.
pub(crate) const DESCRIPTOR_RESERVED: usize = 14;

/// Width of the name slot in a column descriptor.
pub(crate) const NAME_BYTES: usize = 11;

/// Header length for a table with `columns` descriptors and no padding.
#[must_use]
pub fn header_length_for(columns: usize) -> usize {
    FILE_DESCRIPTOR_BYTES + COLUMN_DESCRIPTOR_BYTES * columns
}

/// Absolute stream position of record `index`.
#[must_use]
pub fn record_offset(header_length: usize, record_length: usize, index: u64) -> u64 {
    header_length as u64 + index * record_length as u64
}

/// Number of records implied by a stream of `stream_len` bytes.
///
/// One byte is subtracted for the EOF marker and the quotient is rounded, so
/// the answer is the same whether the marker is present or not.
#[must_use]
pub fn record_count_from_len(stream_len: u64, header_length: usize, record_length: usize) -> u64 {
    if record_length == 0 || stream_len <= header_length as u64 {
        return 0;
    }
    let body = (stream_len - header_length as u64 - 1) as f64;
    (body / record_length as f64).round() as u64
}

/// Last-update stamp exactly as stored: years since 1900, month, day.
///
/// Kept raw so a header round-trips byte for byte even when the stored
/// values do not form a valid calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastUpdate {
    pub years_since_1900: u8,
    pub month: u8,
    pub day: u8,
}

impl LastUpdate {
    pub fn from_bytes(bytes: [u8; 3]) -> Self {
        Self {
            years_since_1900: bytes[0],
            month: bytes[1],
            day: bytes[2],
        }
    }

    pub fn to_bytes(self) -> [u8; 3] {
        [self.years_since_1900, self.month, self.day]
    }

    /// Stamp for `date`; years outside 1900..=2155 are clamped.
    pub fn from_date(date: NaiveDate) -> Self {
        let years = (date.year() - 1900).clamp(0, 255) as u8;
        Self {
            years_since_1900: years,
            month: date.month() as u8,
            day: date.day() as u8,
        }
    }

    pub fn today() -> Self {
        Self::from_date(Local::now().date_naive())
    }

    #[must_use]
    pub fn year(self) -> i32 {
        1900 + i32::from(self.years_since_1900)
    }

    /// Calendar date, or `None` when the stored bytes do not form one.
    #[must_use]
    pub fn to_date(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year(), u32::from(self.month), u32::from(self.day))
    }
}

impl Default for LastUpdate {
    fn default() -> Self {
        Self::today()
    }
}
