//! Record buffer and the per-type value codec.
//!
//! A [`Record`] is one `record_length`-byte buffer bound to a frozen
//! [`Schema`]. Values are never stored separately; every accessor encodes
//! into or decodes from the column's slice of the buffer.
//!
//! ```text
//! [flag: ' ' | '*'][field 0 .. len0][field 1 .. len1] ...
//!  ^ byte 0         ^ data_address of column 0
//! ```
//!
//! Each setter checks the value completely before touching the buffer, so a
//! rejected value leaves the previous field contents in place.

use chrono::NaiveDate;
use config::{DbfConfig, NullValues, Truncation};
use encoding_rs::Encoding;
use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;

use crate::column::{Column, ColumnType};
use crate::error::{DbfError, Result};
use crate::format::{DELETED_FLAG, VALID_FLAG};
use crate::header::{read_fully, Header, Schema};

/// Stored layout of a Date field.
const DATE_FORMAT: &str = "%Y%m%d";

/// Separated layouts accepted when a date is set from a string.
const DATE_INPUT_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// One row of a table.
#[derive(Debug, Clone)]
pub struct Record {
    schema: Arc<Schema>,
    data: Vec<u8>,
    /// Position in the table; `None` until read from or appended to a file.
    index: Option<u64>,
    truncation: Truncation,
    null_values: NullValues,
}

impl Record {
    /// Binds a blank record to `header`, locking its schema.
    pub fn new(header: &mut Header) -> Self {
        Self::from_schema(header.lock())
    }

    /// Like [`new`](Record::new), taking the truncation flags and null
    /// sentinels from `config`.
    pub fn with_config(header: &mut Header, config: &DbfConfig) -> Self {
        let mut record = Self::new(header);
        record.truncation = config.truncation;
        record.null_values = config.null_values.clone();
        record
    }

    /// A blank record over an already frozen schema.
    pub fn from_schema(schema: Arc<Schema>) -> Self {
        let data = schema.empty_record().to_vec();
        Self {
            schema,
            data,
            index: None,
            truncation: Truncation::default(),
            null_values: NullValues::default(),
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn column_count(&self) -> usize {
        self.schema.column_count()
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.schema.column(index)
    }

    pub fn find_column(&self, name: &str) -> Option<usize> {
        self.schema.find_column(name)
    }

    pub fn truncation(&self) -> Truncation {
        self.truncation
    }

    /// Individual flags can be flipped through the returned reference.
    pub fn truncation_mut(&mut self) -> &mut Truncation {
        &mut self.truncation
    }

    pub fn null_values(&self) -> &NullValues {
        &self.null_values
    }

    pub fn set_null_values(&mut self, null_values: NullValues) {
        self.null_values = null_values;
    }

    /// Zero-based position in the table, if the record has one.
    pub fn record_index(&self) -> Option<u64> {
        self.index
    }

    pub fn set_record_index(&mut self, index: Option<u64>) {
        self.index = index;
    }

    pub fn is_deleted(&self) -> bool {
        self.data[0] == DELETED_FLAG
    }

    pub fn set_deleted(&mut self, deleted: bool) {
        self.data[0] = if deleted { DELETED_FLAG } else { VALID_FLAG };
    }

    /// The whole record buffer, deletion flag included.
    pub fn raw(&self) -> &[u8] {
        &self.data
    }

    /// Resets every byte to the blank template and forgets the index.
    pub fn clear(&mut self) {
        self.data.copy_from_slice(self.schema.empty_record());
        self.index = None;
    }

    /// Fails with [`DbfError::SchemaMismatch`] unless `expected` has the
    /// same column count and record length as this record's schema.
    pub fn ensure_compatible(&self, expected: &Schema) -> Result<()> {
        if self.schema.is_compatible(expected) {
            return Ok(());
        }
        Err(DbfError::SchemaMismatch {
            expected_columns: expected.column_count(),
            expected_length: expected.record_length(),
            actual_columns: self.schema.column_count(),
            actual_length: self.schema.record_length(),
        })
    }

    /// Encodes `value` into column `index`.
    ///
    /// An empty string blanks the field. Number fields without decimals
    /// that are too wide keep their rightmost (least significant) digits
    /// when integer truncation is allowed, so `12345` in a 3-wide field
    /// becomes `345`.
    ///
    /// # Errors
    ///
    /// - [`DbfError::TruncationRejected`] when the value does not fit and
    ///   the matching truncation flag is off.
    /// - [`DbfError::InvalidValue`] for unparsable numbers and dates.
    /// - [`DbfError::Unsupported`] for Memo and Binary columns.
    /// - [`DbfError::ColumnOutOfRange`].
    pub fn set(&mut self, index: usize, value: &str) -> Result<()> {
        let column = column_at(&self.schema, index)?;
        let template = &self.schema.empty_record()[column.span()];
        let field = &mut self.data[column.span()];
        let ty = column.column_type();

        if value.is_empty() && !matches!(ty, ColumnType::Memo | ColumnType::Binary) {
            field.copy_from_slice(template);
            return Ok(());
        }

        match ty {
            ColumnType::Character => {
                let (encoded, _, _) = self.schema.encoding().encode(value);
                if encoded.len() > field.len() && !self.truncation.allow_string {
                    return Err(truncated(
                        column,
                        format!(
                            "{} bytes do not fit in {} and string truncation is off",
                            encoded.len(),
                            field.len()
                        ),
                    ));
                }
                let n = encoded.len().min(field.len());
                field.copy_from_slice(template);
                field[..n].copy_from_slice(&encoded[..n]);
                Ok(())
            }
            ColumnType::Number | ColumnType::Float if column.decimal_count() == 0 => {
                encode_whole(column, field, template, value, self.truncation)
            }
            ColumnType::Number | ColumnType::Float => {
                encode_decimal(column, field, template, value, self.truncation)
            }
            ColumnType::Integer => {
                let parsed: i32 = value
                    .trim()
                    .parse()
                    .map_err(|_| invalid(column, value, "not a 32-bit signed integer"))?;
                field.copy_from_slice(&parsed.to_le_bytes());
                Ok(())
            }
            ColumnType::Boolean => {
                field[0] = boolean_flag(value);
                Ok(())
            }
            ColumnType::Date => {
                let date = parse_date(value)
                    .ok_or_else(|| invalid(column, value, "not a recognised date"))?;
                encode_date(column, field, date)
            }
            ColumnType::Memo => Err(memo_unsupported(column)),
            ColumnType::Binary => Err(binary_unsupported(column)),
        }
    }

    /// Decodes column `index` as text.
    ///
    /// Character fields lose trailing padding, other text fields are
    /// trimmed on both sides, and Integer fields render their binary value
    /// (four spaces read as empty). A value equal to the configured null
    /// sentinel for its type reads as the empty string.
    pub fn get(&self, index: usize) -> Result<String> {
        let column = column_at(&self.schema, index)?;
        decode_field(
            column,
            &self.data[column.span()],
            self.schema.encoding(),
            &self.null_values,
        )
    }

    /// Stores the null sentinel configured for the column's type, or blanks
    /// the field when none is configured.
    pub fn set_null(&mut self, index: usize) -> Result<()> {
        let column = column_at(&self.schema, index)?;
        let marker = column
            .column_type()
            .null_kind()
            .and_then(|kind| self.null_values.get(kind))
            .map(str::to_string);

        match (column.column_type(), marker) {
            (ColumnType::Memo, _) => Err(memo_unsupported(column)),
            (ColumnType::Integer, Some(marker)) => self.set(index, &marker),
            (_, Some(marker)) => {
                let (encoded, _, _) = self.schema.encoding().encode(&marker);
                if encoded.len() > column.length() {
                    return Err(truncated(
                        column,
                        format!("null marker {:?} is wider than the field", marker),
                    ));
                }
                let field = &mut self.data[column.span()];
                field.copy_from_slice(&self.schema.empty_record()[column.span()]);
                field[..encoded.len()].copy_from_slice(&encoded);
                Ok(())
            }
            (_, None) => {
                self.data[column.span()].copy_from_slice(&self.schema.empty_record()[column.span()]);
                Ok(())
            }
        }
    }

    /// Parsed Date field; `None` when the field is blank.
    pub fn get_date(&self, index: usize) -> Result<Option<NaiveDate>> {
        let column = date_column(&self.schema, index)?;
        let field = &self.data[column.span()];
        if field.iter().all(|&b| b == b' ' || b == 0) {
            return Ok(None);
        }
        let text = String::from_utf8_lossy(field);
        parse_compact_date(&text)
            .map(Some)
            .ok_or_else(|| invalid(column, &text, "stored bytes are not YYYYMMDD"))
    }

    pub fn set_date(&mut self, index: usize, date: NaiveDate) -> Result<()> {
        let column = date_column(&self.schema, index)?;
        encode_date(column, &mut self.data[column.span()], date)
    }

    /// Raw bytes of a Binary field.
    pub fn get_binary(&self, index: usize) -> Result<&[u8]> {
        let column = binary_column(&self.schema, index)?;
        Ok(&self.data[column.span()])
    }

    /// Copies `bytes` verbatim into a Binary field, cut to the field width
    /// and space padded when shorter.
    pub fn set_binary(&mut self, index: usize, bytes: &[u8]) -> Result<()> {
        let column = binary_column(&self.schema, index)?;
        let field = &mut self.data[column.span()];
        let n = bytes.len().min(field.len());
        field.copy_from_slice(&self.schema.empty_record()[column.span()]);
        field[..n].copy_from_slice(&bytes[..n]);
        Ok(())
    }

    pub fn get_by_name(&self, name: &str) -> Result<String> {
        self.get(index_of(&self.schema, name)?)
    }

    pub fn set_by_name(&mut self, name: &str, value: &str) -> Result<()> {
        let index = index_of(&self.schema, name)?;
        self.set(index, value)
    }

    /// Fills the buffer from `r`.
    ///
    /// Returns `Ok(false)` and leaves a blank record when the stream ends
    /// before a whole record could be read. The index is left untouched.
    pub fn read_from<R: Read>(&mut self, r: &mut R) -> Result<bool> {
        let n = read_fully(r, &mut self.data)?;
        if n < self.data.len() {
            self.data.copy_from_slice(self.schema.empty_record());
            return Ok(false);
        }
        Ok(true)
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_all(&self.data)?;
        Ok(())
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (decoded, _) = self.schema.encoding().decode_without_bom_handling(&self.data);
        f.write_str(&decoded)
    }
}

/// Decodes the raw bytes of one `column` field the way [`Record::get`] does.
///
/// Lets a caller holding only a field's bytes, such as a single-field read
/// straight from a stream, share the trimming and null-sentinel rules.
pub fn decode_field(
    column: &Column,
    field: &[u8],
    encoding: &'static Encoding,
    null_values: &NullValues,
) -> Result<String> {
    let text = match column.column_type() {
        ColumnType::Memo => return Err(memo_unsupported(column)),
        ColumnType::Binary => return Err(binary_unsupported(column)),
        ColumnType::Integer => {
            if field.iter().all(|&b| b == b' ') {
                String::new()
            } else {
                let mut raw = [0u8; 4];
                raw.copy_from_slice(field);
                i32::from_le_bytes(raw).to_string()
            }
        }
        ColumnType::Character => {
            let (decoded, _) = encoding.decode_without_bom_handling(field);
            decoded
                .trim_end_matches(|c: char| c == ' ' || c == '\0')
                .to_string()
        }
        _ => {
            let (decoded, _) = encoding.decode_without_bom_handling(field);
            decoded.trim_matches(|c: char| c == ' ' || c == '\0').to_string()
        }
    };

    let is_null = column
        .column_type()
        .null_kind()
        .map(|kind| null_values.is_null(kind, &text))
        .unwrap_or(false);
    Ok(if is_null { String::new() } else { text })
}

fn column_at(schema: &Schema, index: usize) -> Result<&Column> {
    schema.column(index).ok_or(DbfError::ColumnOutOfRange {
        index,
        count: schema.column_count(),
    })
}

fn index_of(schema: &Schema, name: &str) -> Result<usize> {
    schema
        .find_column(name)
        .ok_or_else(|| DbfError::UnknownColumn(name.to_string()))
}

fn date_column(schema: &Schema, index: usize) -> Result<&Column> {
    let column = column_at(schema, index)?;
    if column.column_type() != ColumnType::Date {
        return Err(DbfError::Unsupported(format!(
            "column '{}' is {}, not a date column",
            column.name(),
            column.column_type()
        )));
    }
    Ok(column)
}

fn binary_column(schema: &Schema, index: usize) -> Result<&Column> {
    let column = column_at(schema, index)?;
    if column.column_type() != ColumnType::Binary {
        return Err(DbfError::Unsupported(format!(
            "column '{}' is {}, not a binary column",
            column.name(),
            column.column_type()
        )));
    }
    Ok(column)
}

/// Right-justifies a number with no decimal places.
fn encode_whole(
    column: &Column,
    field: &mut [u8],
    template: &[u8],
    value: &str,
    truncation: Truncation,
) -> Result<()> {
    let text = value.trim();
    if !is_numeric_text(text) {
        return Err(invalid(column, value, "not a number"));
    }

    let mut digits = text.as_bytes();
    if digits.len() > field.len() {
        if !truncation.allow_integer {
            return Err(truncated(
                column,
                format!(
                    "{} characters do not fit in {} and integer truncation is off",
                    digits.len(),
                    field.len()
                ),
            ));
        }
        digits = &digits[digits.len() - field.len()..];
    }

    field.copy_from_slice(template);
    let start = field.len() - digits.len();
    field[start..].copy_from_slice(digits);
    Ok(())
}

/// Lays out `[spaces][integer digits]['.'][decimals][zero padding]` with the
/// point at `length - decimal_count - 1`.
fn encode_decimal(
    column: &Column,
    field: &mut [u8],
    template: &[u8],
    value: &str,
    truncation: Truncation,
) -> Result<()> {
    let text = value.trim();
    if !is_numeric_text(text) {
        return Err(invalid(column, value, "not a number"));
    }

    let decimals = column.decimal_count();
    let point = field.len() - decimals - 1;
    let (whole, fraction) = text.split_once('.').unwrap_or((text, ""));
    let (whole, fraction) = (whole.as_bytes(), fraction.as_bytes());

    if fraction.len() > decimals && !truncation.allow_decimal {
        return Err(truncated(
            column,
            format!(
                "{} decimal places do not fit in {} and decimal truncation is off",
                fraction.len(),
                decimals
            ),
        ));
    }
    if whole.len() > point && !truncation.allow_integer {
        return Err(truncated(
            column,
            format!(
                "{} integer characters do not fit in {} and integer truncation is off",
                whole.len(),
                point
            ),
        ));
    }

    field[..point].copy_from_slice(&template[..point]);
    field[point] = b'.';
    field[point + 1..].fill(b'0');

    let kept = fraction.len().min(decimals);
    field[point + 1..point + 1 + kept].copy_from_slice(&fraction[..kept]);

    let kept = whole.len().min(point);
    field[point - kept..point].copy_from_slice(&whole[whole.len() - kept..]);
    Ok(())
}

fn encode_date(column: &Column, field: &mut [u8], date: NaiveDate) -> Result<()> {
    let text = date.format(DATE_FORMAT).to_string();
    if text.len() != field.len() {
        return Err(invalid(column, &text, "year must have four digits"));
    }
    field.copy_from_slice(text.as_bytes());
    Ok(())
}

/// Optional sign, digits, optional `.` and digits; at least one digit.
fn is_numeric_text(text: &str) -> bool {
    let body = text.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(text);
    let (whole, fraction) = body.split_once('.').unwrap_or((body, ""));
    let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    digits(whole) && digits(fraction) && whole.len() + fraction.len() > 0
}

fn boolean_flag(value: &str) -> u8 {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "t" | "yes" | "y" => b'T',
        " " | "?" => b'?',
        _ => b'F',
    }
}

/// Accepts the stored `YYYYMMDD` form, common separated layouts, and the
/// date part of an ISO date-time.
fn parse_date(value: &str) -> Option<NaiveDate> {
    let text = value.trim();
    let parse = |s: &str| {
        parse_compact_date(s).or_else(|| {
            DATE_INPUT_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        })
    };
    parse(text).or_else(|| text.get(..10).and_then(parse))
}

/// Exactly eight ASCII digits, `YYYYMMDD`.
fn parse_compact_date(text: &str) -> Option<NaiveDate> {
    if text.len() != 8 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = text[..4].parse().ok()?;
    let month = text[4..6].parse().ok()?;
    let day = text[6..].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn truncated(column: &Column, reason: String) -> DbfError {
    DbfError::TruncationRejected {
        column: column.name().to_string(),
        reason,
    }
}

fn invalid(column: &Column, value: &str, reason: &str) -> DbfError {
    DbfError::InvalidValue {
        column: column.name().to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn memo_unsupported(column: &Column) -> DbfError {
    DbfError::Unsupported(format!(
        "column '{}' is a memo field; memo files are not supported",
        column.name()
    ))
}

fn binary_unsupported(column: &Column) -> DbfError {
    DbfError::Unsupported(format!(
        "column '{}' is binary; use get_binary/set_binary",
        column.name()
    ))
}
