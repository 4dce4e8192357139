//! Table header: file metadata plus the column schema.
//!
//! The schema has an explicit two-state lifecycle. While a [`Header`] is
//! unlocked it owns its [`Schema`] outright and columns may be added or
//! removed. The first time a record is bound to it, it is written, or it is
//! read from a file, the schema moves into an `Arc<Schema>` and from then on
//! is only ever shared, never mutated. Record count, last-update stamp and
//! language driver stay editable in both states.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use encoding_rs::{Encoding, WINDOWS_1252};
use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::sync::{Arc, OnceLock};
use tracing::debug;

use crate::column::{Column, ColumnType};
use crate::encoding::{language_driver_for, EncodingPolicy};
use crate::error::{DbfError, Result};
use crate::format::{
    header_length_for, record_count_from_len, LastUpdate, COLUMN_DESCRIPTOR_BYTES,
    DESCRIPTOR_RESERVED, FILE_DESCRIPTOR_BYTES, FILE_TYPE_DBASE3, HEADER_TERMINATOR,
    MAX_RECORD_LENGTH, NAME_BYTES, RESERVED_AFTER_DRIVER, RESERVED_BEFORE_DRIVER, VALID_FLAG,
};

/// Largest header length the 16-bit field can describe.
const MAX_HEADER_LENGTH: usize = 65535;

/// Ordered columns with their computed offsets and the table's codec.
#[derive(Debug, Clone)]
pub struct Schema {
    columns: Vec<Column>,
    record_length: usize,
    header_length: usize,
    encoding: &'static Encoding,
    /// Name -> first column index with that name. Built on first lookup.
    name_index: OnceLock<HashMap<String, usize>>,
    /// `record_length` spaces, used to blank fields and whole records.
    empty_record: OnceLock<Vec<u8>>,
}

impl Schema {
    fn new(encoding: &'static Encoding) -> Self {
        Self {
            columns: Vec::new(),
            record_length: 1,
            header_length: FILE_DESCRIPTOR_BYTES,
            encoding,
            name_index: OnceLock::new(),
            empty_record: OnceLock::new(),
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Deletion flag plus every field.
    pub fn record_length(&self) -> usize {
        self.record_length
    }

    /// Offset of the first record in the file.
    pub fn header_length(&self) -> usize {
        self.header_length
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Exact, case-sensitive lookup. With duplicate names the first wins.
    pub fn find_column(&self, name: &str) -> Option<usize> {
        self.name_index
            .get_or_init(|| {
                let mut index = HashMap::with_capacity(self.columns.len());
                for (i, col) in self.columns.iter().enumerate() {
                    index.entry(col.name().to_string()).or_insert(i);
                }
                index
            })
            .get(name)
            .copied()
    }

    /// A `record_length`-byte buffer of spaces.
    pub fn empty_record(&self) -> &[u8] {
        self.empty_record
            .get_or_init(|| vec![VALID_FLAG; self.record_length])
    }

    /// Same column count and record length, which is all a record buffer
    /// needs to be moved between two tables safely.
    pub fn is_compatible(&self, other: &Schema) -> bool {
        std::ptr::eq(self, other)
            || (self.column_count() == other.column_count()
                && self.record_length == other.record_length)
    }

    fn push(&mut self, mut column: Column) -> Result<()> {
        let record_length = self.record_length + column.length();
        if record_length > MAX_RECORD_LENGTH {
            return Err(DbfError::RecordTooLarge { record_length });
        }
        if header_length_for(self.columns.len() + 1) > MAX_HEADER_LENGTH {
            return Err(DbfError::SchemaViolation(format!(
                "too many columns; header would exceed {} bytes",
                MAX_HEADER_LENGTH
            )));
        }

        column.data_address = self.record_length;
        self.record_length = record_length;
        self.header_length += COLUMN_DESCRIPTOR_BYTES;
        self.columns.push(column);
        self.invalidate();
        Ok(())
    }

    fn remove(&mut self, index: usize) -> Result<Column> {
        if index >= self.columns.len() {
            return Err(DbfError::ColumnOutOfRange {
                index,
                count: self.columns.len(),
            });
        }
        let mut removed = self.columns.remove(index);
        for col in &mut self.columns[index..] {
            col.data_address -= removed.length();
        }
        self.record_length -= removed.length();
        self.header_length -= COLUMN_DESCRIPTOR_BYTES;
        removed.data_address = 0;
        self.invalidate();
        Ok(removed)
    }

    fn invalidate(&mut self) {
        self.name_index = OnceLock::new();
        self.empty_record = OnceLock::new();
    }
}

#[derive(Debug)]
enum Lifecycle {
    Unlocked(Schema),
    Locked(Arc<Schema>),
}

/// File-level metadata and the column schema of one table.
#[derive(Debug)]
pub struct Header {
    lifecycle: Lifecycle,
    record_count: u32,
    last_update: LastUpdate,
    language_driver: u8,
    dirty: bool,
}

impl Default for Header {
    fn default() -> Self {
        Self::new(WINDOWS_1252)
    }
}

impl Header {
    /// Creates an empty, unlocked header whose text uses `encoding`.
    ///
    /// The language driver byte is chosen to match `encoding` where the
    /// code-page table has an entry for it, and is 0 otherwise.
    pub fn new(encoding: &'static Encoding) -> Self {
        Self {
            lifecycle: Lifecycle::Unlocked(Schema::new(encoding)),
            record_count: 0,
            last_update: LastUpdate::today(),
            language_driver: language_driver_for(encoding),
            dirty: false,
        }
    }

    pub fn schema(&self) -> &Schema {
        match &self.lifecycle {
            Lifecycle::Unlocked(schema) => schema,
            Lifecycle::Locked(schema) => schema,
        }
    }

    /// Appends a column after the existing ones.
    ///
    /// # Errors
    ///
    /// - [`DbfError::Locked`] once the schema is frozen.
    /// - [`DbfError::RecordTooLarge`] if the record would exceed 65535 bytes.
    pub fn add_column(&mut self, column: Column) -> Result<()> {
        match &mut self.lifecycle {
            Lifecycle::Unlocked(schema) => schema.push(column)?,
            Lifecycle::Locked(_) => return Err(DbfError::Locked),
        }
        self.dirty = true;
        Ok(())
    }

    /// Validates and appends a column in one step.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        column_type: ColumnType,
        length: usize,
        decimal_count: usize,
    ) -> Result<()> {
        self.add_column(Column::new(name, column_type, length, decimal_count)?)
    }

    /// Removes the column at `index`; later columns shift down by its width.
    ///
    /// # Errors
    ///
    /// [`DbfError::Locked`] once the schema is frozen, or
    /// [`DbfError::ColumnOutOfRange`].
    pub fn remove_column(&mut self, index: usize) -> Result<Column> {
        let removed = match &mut self.lifecycle {
            Lifecycle::Unlocked(schema) => schema.remove(index)?,
            Lifecycle::Locked(_) => return Err(DbfError::Locked),
        };
        self.dirty = true;
        Ok(removed)
    }

    /// Freezes the schema, returning the shared handle records bind to.
    ///
    /// Idempotent: a locked header hands out clones of the same `Arc`.
    pub fn lock(&mut self) -> Arc<Schema> {
        let schema = match &mut self.lifecycle {
            Lifecycle::Locked(schema) => return Arc::clone(schema),
            Lifecycle::Unlocked(schema) => {
                let encoding = schema.encoding;
                Arc::new(std::mem::replace(schema, Schema::new(encoding)))
            }
        };
        self.lifecycle = Lifecycle::Locked(Arc::clone(&schema));
        schema
    }

    pub fn is_locked(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Locked(_))
    }

    /// `true` when the record count or the structure changed since the
    /// header was last read or written.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn columns(&self) -> &[Column] {
        self.schema().columns()
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.schema().column(index)
    }

    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.find_column(name).and_then(|i| self.column(i))
    }

    pub fn find_column(&self, name: &str) -> Option<usize> {
        self.schema().find_column(name)
    }

    pub fn column_count(&self) -> usize {
        self.schema().column_count()
    }

    pub fn record_length(&self) -> usize {
        self.schema().record_length()
    }

    pub fn header_length(&self) -> usize {
        self.schema().header_length()
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.schema().encoding()
    }

    pub fn empty_record_template(&self) -> &[u8] {
        self.schema().empty_record()
    }

    pub fn record_count(&self) -> u32 {
        self.record_count
    }

    /// Sets the stored record count.
    ///
    /// Forward-only writers cannot rewrite the header after the records, so
    /// they announce the final count here before the first write.
    pub fn set_record_count(&mut self, count: u32) {
        self.record_count = count;
        self.dirty = true;
    }

    pub fn last_update(&self) -> LastUpdate {
        self.last_update
    }

    pub fn set_last_update(&mut self, stamp: LastUpdate) {
        self.last_update = stamp;
    }

    pub fn language_driver(&self) -> u8 {
        self.language_driver
    }

    /// Changes the stored byte only; the codec already in use is kept.
    pub fn set_language_driver(&mut self, language_driver: u8) {
        self.language_driver = language_driver;
    }

    /// Serializes the header and descriptor table, then the 0x0D terminator.
    ///
    /// Writing freezes the schema and clears the dirty flag.
    pub fn write_to<W: Write>(&mut self, w: &mut W) -> Result<()> {
        let schema = self.lock();
        let mut buf = Vec::with_capacity(header_length_for(schema.column_count()));

        buf.write_u8(FILE_TYPE_DBASE3)?;
        buf.extend_from_slice(&self.last_update.to_bytes());
        buf.write_u32::<LittleEndian>(self.record_count)?;
        buf.write_u16::<LittleEndian>(schema.header_length() as u16)?;
        buf.write_u16::<LittleEndian>(schema.record_length() as u16)?;
        buf.extend_from_slice(&[0u8; RESERVED_BEFORE_DRIVER]);
        buf.write_u8(self.language_driver)?;
        buf.extend_from_slice(&[0u8; RESERVED_AFTER_DRIVER]);

        for col in schema.columns() {
            let mut name = [0u8; NAME_BYTES];
            let (encoded, _, _) = schema.encoding().encode(col.name());
            let n = encoded.len().min(NAME_BYTES);
            name[..n].copy_from_slice(&encoded[..n]);
            buf.extend_from_slice(&name);

            buf.write_u8(col.column_type().tag())?;
            buf.write_u32::<LittleEndian>(col.data_address() as u32)?;

            // Character widths above 255 borrow the decimal byte as the high byte.
            if col.column_type() == ColumnType::Character && col.length() > 255 {
                buf.write_u16::<LittleEndian>(col.length() as u16)?;
            } else {
                buf.write_u8(col.length() as u8)?;
                buf.write_u8(col.decimal_count() as u8)?;
            }
            buf.extend_from_slice(&[0u8; DESCRIPTOR_RESERVED]);
        }
        buf.write_u8(HEADER_TERMINATOR)?;

        w.write_all(&buf)?;
        self.dirty = false;
        debug!(
            columns = schema.column_count(),
            record_count = self.record_count,
            record_length = schema.record_length(),
            "wrote dbf header"
        );
        Ok(())
    }

    /// Reads a header, leaving `r` positioned at the first record.
    ///
    /// `stream_len` is the total stream size when known; it is used to
    /// recover the record count of files that store 0 there. The codec is
    /// resolved through `policy` as soon as the language driver byte has
    /// been read, before any column name is decoded.
    ///
    /// Returns `Ok(None)` when the stream is empty.
    ///
    /// # Errors
    ///
    /// - [`DbfError::InvalidFormat`] for a file-type byte other than 0x03,
    ///   an unknown column type, or a record length that is zero or does
    ///   not match the columns.
    /// - [`DbfError::SchemaViolation`] for an invalid stored column.
    /// - [`DbfError::Io`] when the stream ends inside the header.
    pub fn read_from<R: Read>(
        r: &mut R,
        stream_len: Option<u64>,
        policy: &EncodingPolicy,
    ) -> Result<Option<Self>> {
        let mut first = [0u8; 1];
        if read_fully(r, &mut first)? == 0 {
            return Ok(None);
        }
        if first[0] != FILE_TYPE_DBASE3 {
            return Err(DbfError::InvalidFormat(format!(
                "unsupported file type byte {:#04x}",
                first[0]
            )));
        }

        let mut stamp = [0u8; 3];
        r.read_exact(&mut stamp)?;
        let mut record_count = r.read_u32::<LittleEndian>()?;
        let header_length = usize::from(r.read_u16::<LittleEndian>()?);
        let stored_record_length = usize::from(r.read_u16::<LittleEndian>()?);

        if stored_record_length == 0 {
            return Err(DbfError::InvalidFormat("record length is zero".into()));
        }
        if header_length < FILE_DESCRIPTOR_BYTES {
            return Err(DbfError::InvalidFormat(format!(
                "header length {} is shorter than the fixed {} bytes",
                header_length, FILE_DESCRIPTOR_BYTES
            )));
        }

        skip(r, RESERVED_BEFORE_DRIVER)?;
        let language_driver = r.read_u8()?;
        let encoding = policy.resolve(language_driver);
        skip(r, RESERVED_AFTER_DRIVER)?;

        let slots = (header_length - FILE_DESCRIPTOR_BYTES) / COLUMN_DESCRIPTOR_BYTES;
        let mut schema = Schema::new(encoding);
        let mut consumed = FILE_DESCRIPTOR_BYTES - 1;
        let mut terminated = false;

        for _ in 0..slots {
            let mut desc = [0u8; COLUMN_DESCRIPTOR_BYTES];
            r.read_exact(&mut desc[..1])?;
            consumed += 1;
            if desc[0] == HEADER_TERMINATOR {
                terminated = true;
                break;
            }
            r.read_exact(&mut desc[1..])?;
            consumed += COLUMN_DESCRIPTOR_BYTES - 1;
            schema.push(parse_descriptor(&desc, encoding)?)?;
        }
        if !terminated {
            r.read_u8()?;
            consumed += 1;
        }
        if header_length > consumed {
            skip(r, header_length - consumed)?;
        }

        if schema.record_length() != stored_record_length {
            return Err(DbfError::InvalidFormat(format!(
                "stored record length {} does not match the {} bytes its columns need",
                stored_record_length,
                schema.record_length()
            )));
        }
        schema.header_length = header_length;

        if record_count == 0 {
            if let Some(len) = stream_len {
                let recovered = record_count_from_len(len, header_length, stored_record_length);
                record_count = u32::try_from(recovered).unwrap_or(u32::MAX);
            }
        }

        debug!(
            columns = schema.column_count(),
            record_count,
            header_length,
            encoding = encoding.name(),
            "read dbf header"
        );

        Ok(Some(Self {
            lifecycle: Lifecycle::Locked(Arc::new(schema)),
            record_count,
            last_update: LastUpdate::from_bytes(stamp),
            language_driver,
            dirty: false,
        }))
    }
}

/// Decodes one 32-byte descriptor. The stored data address is ignored.
fn parse_descriptor(desc: &[u8; COLUMN_DESCRIPTOR_BYTES], encoding: &'static Encoding) -> Result<Column> {
    let raw_name = &desc[..NAME_BYTES];
    let name_end = raw_name.iter().position(|&b| b == 0).unwrap_or(NAME_BYTES);
    let (name, _) = encoding.decode_without_bom_handling(&raw_name[..name_end]);
    let name = name.trim().to_string();

    let tag = desc[NAME_BYTES];
    let column_type = ColumnType::from_tag(tag).ok_or_else(|| {
        DbfError::InvalidFormat(format!(
            "column '{}' has unsupported type tag {:?}",
            name, tag as char
        ))
    })?;

    let (length, decimal_count) = if column_type == ColumnType::Character {
        (usize::from(u16::from_le_bytes([desc[16], desc[17]])), 0)
    } else {
        (usize::from(desc[16]), usize::from(desc[17]))
    };

    Column::new(name, column_type, length, decimal_count)
}

/// Reads until `buf` is full or the stream ends; returns the bytes read.
pub(crate) fn read_fully<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Discards exactly `n` bytes without seeking, so forward-only streams work.
fn skip<R: Read>(r: &mut R, n: usize) -> io::Result<()> {
    let copied = io::copy(&mut r.by_ref().take(n as u64), &mut io::sink())?;
    if copied < n as u64 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "stream ended inside the dbf header",
        ));
    }
    Ok(())
}
