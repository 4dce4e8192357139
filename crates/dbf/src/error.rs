//! Error kinds surfaced by the codec and the file session.

use std::io;
use thiserror::Error;

/// Everything that can go wrong while building, reading or writing a table.
///
/// I/O failures pass through untouched in [`DbfError::Io`].
#[derive(Debug, Error)]
pub enum DbfError {
    /// Wrong file-type byte or an impossible header/record length.
    #[error("invalid dbf format: {0}")]
    InvalidFormat(String),

    /// A column definition broke a naming, length or decimal rule.
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    /// Structural change attempted on a header whose schema is frozen.
    #[error("header is locked; columns cannot be added or removed once records are bound or the header is written")]
    Locked,

    /// Adding a column would push the record past the 16-bit length field.
    #[error("record length {record_length} exceeds the maximum of 65535 bytes")]
    RecordTooLarge { record_length: usize },

    /// A record's schema does not match the one the operation expects.
    #[error(
        "schema mismatch: expected {expected_columns} columns / {expected_length} bytes, \
         record has {actual_columns} columns / {actual_length} bytes"
    )]
    SchemaMismatch {
        expected_columns: usize,
        expected_length: usize,
        actual_columns: usize,
        actual_length: usize,
    },

    /// A value does not fit its field and the matching truncation flag is off.
    #[error("value for column '{column}' would be truncated: {reason}")]
    TruncationRejected { column: String, reason: String },

    /// Unparsable date or numeric input.
    #[error("invalid value {value:?} for column '{column}': {reason}")]
    InvalidValue {
        column: String,
        value: String,
        reason: String,
    },

    /// Memo access, or Binary access through the text accessors.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// The named codec is not available to this runtime.
    #[error("encoding '{0}' is not available")]
    EncodingUnavailable(String),

    /// Write attempted on a session opened read-only.
    #[error("table is opened read-only")]
    ReadOnly,

    /// `update` on a record that was never read from or written to the table.
    #[error("record has no index; use write() to append it")]
    RecordNotIndexed,

    /// `update` aimed past the end of the stream.
    #[error("record index {index} is past the end of the table")]
    RecordOutOfRange { index: u64 },

    #[error("no column named '{0}'")]
    UnknownColumn(String),

    #[error("column index {index} out of range (table has {count} columns)")]
    ColumnOutOfRange { index: usize, count: usize },

    /// Random access requested on a stream that can only move forward.
    #[error("stream is forward-only; {0} needs seeking")]
    NotSeekable(&'static str),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Shorthand used throughout the codec.
pub type Result<T> = std::result::Result<T, DbfError>;
