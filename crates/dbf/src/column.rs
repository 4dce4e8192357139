//! Column descriptors.
//!
//! A [`Column`] is validated once at construction and never changes shape
//! afterwards; only its data address is rewritten by the owning schema when
//! columns before it come and go.

use config::NullKind;

use crate::error::{DbfError, Result};

/// Longest column name the 11-byte descriptor slot can carry.
pub const MAX_NAME_CHARS: usize = 11;

/// Largest width of a Character or Binary field.
const MAX_WIDE_LENGTH: usize = 65535;

/// Largest width of every other field type.
const MAX_NARROW_LENGTH: usize = 255;

/// Field types of the dBASE III/IV family plus the FoxPro extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// `C`: left-justified text, space padded.
    Character,
    /// `N`: right-justified ASCII number with a fixed decimal point.
    Number,
    /// `L`: one of `T`, `F`, `?`.
    Boolean,
    /// `D`: `YYYYMMDD` as ASCII.
    Date,
    /// `M`: 10-byte pointer into a memo file.
    Memo,
    /// `B`: raw bytes.
    Binary,
    /// `I`: FoxPro 4-byte little-endian signed integer.
    Integer,
    /// `F`: FoxPro float, stored like `N`.
    Float,
}

impl ColumnType {
    /// Single-character tag written in the descriptor.
    #[must_use]
    pub fn tag(self) -> u8 {
        match self {
            ColumnType::Character => b'C',
            ColumnType::Number => b'N',
            ColumnType::Boolean => b'L',
            ColumnType::Date => b'D',
            ColumnType::Memo => b'M',
            ColumnType::Binary => b'B',
            ColumnType::Integer => b'I',
            ColumnType::Float => b'F',
        }
    }

    /// Parses a descriptor tag; lowercase tags are accepted.
    #[must_use]
    pub fn from_tag(tag: u8) -> Option<Self> {
        let ty = match tag.to_ascii_uppercase() {
            b'C' => ColumnType::Character,
            b'N' => ColumnType::Number,
            b'L' => ColumnType::Boolean,
            b'D' => ColumnType::Date,
            b'M' => ColumnType::Memo,
            b'B' => ColumnType::Binary,
            b'I' => ColumnType::Integer,
            b'F' => ColumnType::Float,
            _ => return None,
        };
        Some(ty)
    }

    /// Width forced by the format, if the type has one.
    #[must_use]
    pub fn fixed_length(self) -> Option<usize> {
        match self {
            ColumnType::Integer => Some(4),
            ColumnType::Binary | ColumnType::Boolean => Some(1),
            ColumnType::Date => Some(8),
            ColumnType::Memo => Some(10),
            ColumnType::Character | ColumnType::Number | ColumnType::Float => None,
        }
    }

    /// Number and Float share the ASCII numeric encoding.
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Number | ColumnType::Float)
    }

    pub(crate) fn null_kind(self) -> Option<NullKind> {
        match self {
            ColumnType::Character => Some(NullKind::Character),
            ColumnType::Number | ColumnType::Float => Some(NullKind::Number),
            ColumnType::Boolean => Some(NullKind::Boolean),
            ColumnType::Date => Some(NullKind::Date),
            ColumnType::Integer => Some(NullKind::Integer),
            ColumnType::Memo | ColumnType::Binary => None,
        }
    }

    fn max_length(self) -> usize {
        match self {
            ColumnType::Character | ColumnType::Binary => MAX_WIDE_LENGTH,
            _ => MAX_NARROW_LENGTH,
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag() as char)
    }
}

/// Schema entry for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    column_type: ColumnType,
    length: usize,
    decimal_count: usize,
    /// Offset inside a record buffer; byte 0 is the deletion flag.
    pub(crate) data_address: usize,
}

impl Column {
    /// Creates a validated column.
    ///
    /// `length` is ignored for types with a fixed width (Integer, Binary,
    /// Date, Memo, Boolean). `decimal_count` is kept only for Number and
    /// Float and must leave room for the point and at least one digit.
    ///
    /// # Errors
    ///
    /// [`DbfError::SchemaViolation`] naming the rule that was broken.
    pub fn new(
        name: impl Into<String>,
        column_type: ColumnType,
        length: usize,
        decimal_count: usize,
    ) -> Result<Self> {
        let name = name.into();
        let chars = name.chars().count();
        if chars == 0 {
            return Err(DbfError::SchemaViolation(
                "column name must be at least one character long".into(),
            ));
        }
        if chars > MAX_NAME_CHARS {
            return Err(DbfError::SchemaViolation(format!(
                "column name '{}' is longer than {} characters",
                name, MAX_NAME_CHARS
            )));
        }

        let length = column_type.fixed_length().unwrap_or(length);
        let decimal_count = if column_type.is_numeric() {
            decimal_count
        } else {
            0
        };

        if length == 0 {
            return Err(DbfError::SchemaViolation(format!(
                "column '{}' must have a length greater than zero",
                name
            )));
        }
        if length > column_type.max_length() {
            return Err(DbfError::SchemaViolation(format!(
                "column '{}' length {} exceeds the {} maximum of {}",
                name,
                length,
                column_type,
                column_type.max_length()
            )));
        }
        if decimal_count > 0 && length <= decimal_count + 1 {
            return Err(DbfError::SchemaViolation(format!(
                "column '{}' decimal count {} leaves no room for the point in length {}",
                name, decimal_count, length
            )));
        }

        Ok(Self {
            name,
            column_type,
            length,
            decimal_count,
            data_address: 0,
        })
    }

    /// Creates a column of a fixed-width type.
    ///
    /// # Errors
    ///
    /// Character, Number and Float need an explicit length and are rejected.
    pub fn new_fixed(name: impl Into<String>, column_type: ColumnType) -> Result<Self> {
        if column_type.fixed_length().is_none() {
            return Err(DbfError::SchemaViolation(format!(
                "{} columns need an explicit length",
                column_type
            )));
        }
        Self::new(name, column_type, 0, 0)
    }

    /// Geometry blob column used by shapefile attribute tables.
    pub fn shape_field() -> Result<Self> {
        Self::new_fixed("Geometry", ColumnType::Binary)
    }

    /// Row id column used by shapefile attribute tables.
    pub fn id_field() -> Result<Self> {
        Self::new_fixed("Row", ColumnType::Integer)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn decimal_count(&self) -> usize {
        self.decimal_count
    }

    /// Offset of this field inside a record; assigned by the schema.
    pub fn data_address(&self) -> usize {
        self.data_address
    }

    /// Byte range of this field inside a record buffer.
    pub(crate) fn span(&self) -> std::ops::Range<usize> {
        self.data_address..self.data_address + self.length
    }
}
