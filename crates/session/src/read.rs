/// Read path: `read()`, `read_next()` and `read_value()`.
///
/// Random-access streams seek to the record's offset for every read;
/// `read_value()` seeks straight to one field.
/// Forward-only streams can only move ahead; skipped records are consumed
/// and discarded.
use dbf::{decode_field, record_offset, DbfError, Record, Result};
use std::io::{self, Read};

use crate::{ByteStream, DbfFile};

impl<S: ByteStream> DbfFile<S> {
    /// Reads record `index` into `record`.
    ///
    /// Returns `Ok(false)` at end of data and leaves `record` blank. On
    /// success the record's index is set and `read_next` continues after it.
    ///
    /// # Errors
    ///
    /// - [`DbfError::SchemaMismatch`] if `record` belongs to another layout.
    /// - [`DbfError::NotSeekable`] when a forward-only stream is asked for a
    ///   record it has already passed.
    pub fn read(&mut self, index: u64, record: &mut Record) -> Result<bool> {
        record.ensure_compatible(self.header.schema())?;
        let record_length = self.header.record_length();
        let pos = record_offset(self.header.header_length(), record_length, index);

        if self.stream.is_seekable() {
            let len = self.stream.stream_len()?.unwrap_or(0);
            // The last byte may be the EOF marker.
            if pos >= len.saturating_sub(1) {
                record.clear();
                return Ok(false);
            }
            self.stream.seek_to(pos)?;
        } else {
            if index < self.cursor {
                return Err(DbfError::NotSeekable("reading an earlier record"));
            }
            let skip = (index - self.cursor) * record_length as u64;
            let skipped = io::copy(&mut (&mut self.stream).take(skip), &mut io::sink())?;
            if skipped < skip {
                record.clear();
                return Ok(false);
            }
        }

        if !record.read_from(&mut self.stream)? {
            record.set_record_index(None);
            return Ok(false);
        }
        record.set_record_index(Some(index));
        self.cursor = index + 1;
        Ok(true)
    }

    /// Reads the record after the last one read, starting at 0.
    pub fn read_next(&mut self, record: &mut Record) -> Result<bool> {
        self.read(self.cursor, record)
    }

    /// Decoded value of `column` in record `row`, or `None` past the end.
    ///
    /// Only the field's bytes are read, at
    /// `header_len + row * record_len + data_address`. No record is bound,
    /// so an unlocked header stays unlocked, and the `read_next` cursor does
    /// not move.
    ///
    /// # Errors
    ///
    /// - [`DbfError::ColumnOutOfRange`] for a bad column index.
    /// - [`DbfError::NotSeekable`] on a forward-only stream.
    pub fn read_value(&mut self, row: u64, column: usize) -> Result<Option<String>> {
        let schema = self.header.schema();
        let col = schema.column(column).ok_or(DbfError::ColumnOutOfRange {
            index: column,
            count: schema.column_count(),
        })?;
        if !self.stream.is_seekable() {
            return Err(DbfError::NotSeekable("read_value"));
        }
        if !self.header_written {
            return Ok(None);
        }

        let pos = record_offset(schema.header_length(), schema.record_length(), row)
            + col.data_address() as u64;
        let len = self.stream.stream_len()?.unwrap_or(0);
        if pos >= len.saturating_sub(1) {
            return Ok(None);
        }

        self.stream.seek_to(pos)?;
        let mut field = vec![0u8; col.length()];
        match self.stream.read_exact(&mut field) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }
        decode_field(col, &field, schema.encoding(), &self.config.null_values).map(Some)
    }

    /// Moves `read_next` back to the first record.
    ///
    /// Only meaningful on random-access streams.
    pub fn rewind(&mut self) -> Result<()> {
        if !self.stream.is_seekable() {
            return Err(DbfError::NotSeekable("rewind"));
        }
        self.cursor = 0;
        Ok(())
    }
}
