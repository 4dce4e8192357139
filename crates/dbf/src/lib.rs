//! # DBF - dBASE III/IV table codec
//!
//! Byte-exact reader and writer for the fixed-record xBase table format,
//! including the FoxPro `I` (binary integer) and `F` (float) extensions and
//! the Clipper/FoxPro trick that stores Character widths above 255 in the
//! decimal-count byte.
//!
//! ## File layout
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ FILE HEADER (32 bytes)                                        │
//! │                                                               │
//! │ file_type (u8 = 0x03) | last_update (yy-1900, mm, dd)         │
//! │ record_count (u32 LE) | header_len (u16 LE)                   │
//! │ record_len (u16 LE)   | reserved (20 bytes, byte 29 = LDID)   │
//! ├───────────────────────────────────────────────────────────────┤
//! │ COLUMN DESCRIPTORS (32 bytes each)                            │
//! │                                                               │
//! │ name (11 bytes, NUL padded) | type tag (u8)                   │
//! │ data_address (u32 LE, advisory)                               │
//! │ length (u8) | decimals (u8)     -- or, for `C` only --        │
//! │ length (u16 LE)                                               │
//! │ reserved (14 bytes)                                           │
//! ├───────────────────────────────────────────────────────────────┤
//! │ TERMINATOR 0x0D (+ optional padding up to header_len)         │
//! ├───────────────────────────────────────────────────────────────┤
//! │ RECORDS (record_len bytes each)                               │
//! │                                                               │
//! │ deleted flag (' ' or '*') | field bytes ...                   │
//! ├───────────────────────────────────────────────────────────────┤
//! │ optional EOF marker 0x1A                                      │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Pieces
//!
//! | Type        | Role                                                      |
//! |-------------|-----------------------------------------------------------|
//! | [`Column`]  | validated descriptor of one field                         |
//! | [`Header`]  | file metadata plus the schema, with its lock lifecycle    |
//! | [`Schema`]  | ordered columns, offsets, encoding, blank-record template |
//! | [`Record`]  | one row buffer with typed get/set and truncation policy   |
//!
//! A [`Header`] starts unlocked; columns can be added and removed. Binding a
//! [`Record`] to it, writing it, or reading it from a file freezes the schema
//! into an `Arc<Schema>` that every record shares.

mod column;
mod encoding;
mod error;
mod format;
mod header;
mod record;

pub use column::{Column, ColumnType, MAX_NAME_CHARS};
pub use encoding::{encoding_for_label, EncodingPolicy};
pub use error::{DbfError, Result};
pub use format::{
    header_length_for, record_count_from_len, record_offset, LastUpdate, COLUMN_DESCRIPTOR_BYTES,
    DELETED_FLAG, EOF_MARKER, FILE_DESCRIPTOR_BYTES, FILE_TYPE_DBASE3, HEADER_TERMINATOR,
    LANGUAGE_DRIVER_OFFSET, MAX_RECORD_LENGTH, VALID_FLAG,
};
pub use header::{Header, Schema};
pub use record::{decode_field, Record};

pub use encoding_rs::Encoding;

#[cfg(test)]
mod tests;
