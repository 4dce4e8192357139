/// Write path: `write()`, `write_and_clear()`, `update()` and
/// `write_header()`.
///
/// The header is written lazily, right before the first record. On a
/// random-access stream every append computes its index from the stream
/// length, writes the record at that offset followed by the 0x1A marker, and
/// bumps the header's record count; the header itself is rewritten on close.
/// A forward-only stream appends in order; the count stored in its header is
/// whatever was announced before the first write.
use dbf::{record_offset, DbfError, Record, Result, EOF_MARKER};
use tracing::debug;

use crate::{AccessMode, ByteStream, DbfFile};

impl<S: ByteStream> DbfFile<S> {
    /// Stores `record`.
    ///
    /// A record that already has an index (it was read or written before)
    /// overwrites that row through [`update`](Self::update). Otherwise it is
    /// appended as a new row and gets the next index.
    ///
    /// # Errors
    ///
    /// - [`DbfError::ReadOnly`] on a session opened with [`AccessMode::Read`].
    /// - [`DbfError::SchemaMismatch`] if `record` belongs to another layout.
    /// - Any [`update`](Self::update) error for an indexed record.
    pub fn write(&mut self, record: &mut Record) -> Result<()> {
        if record.record_index().is_some() {
            return self.update(record);
        }
        self.ensure_writable()?;
        record.ensure_compatible(self.header.schema())?;
        if !self.header_written {
            self.write_header()?;
        }

        let index = if self.stream.is_seekable() {
            let len = self.stream.stream_len()?.unwrap_or(0);
            let index = dbf::record_count_from_len(
                len,
                self.header.header_length(),
                self.header.record_length(),
            );
            let pos = record_offset(self.header.header_length(), self.header.record_length(), index);
            self.stream.seek_to(pos)?;
            record.write_to(&mut self.stream)?;
            self.stream.write_all(&[EOF_MARKER])?;

            let count = self.header.record_count().saturating_add(1);
            self.header.set_record_count(count);
            index
        } else {
            record.write_to(&mut self.stream)?;
            let index = self.appended;
            self.appended += 1;
            let count = self.header.record_count().saturating_add(1);
            self.header.set_record_count(count);
            index
        };

        record.set_record_index(Some(index));
        debug!(index, "appended record");
        Ok(())
    }

    /// [`write`](Self::write)s `record` and then blanks it for reuse.
    pub fn write_and_clear(&mut self, record: &mut Record) -> Result<()> {
        self.write(record)?;
        record.clear();
        Ok(())
    }

    /// Overwrites the row `record` was read from or appended as.
    ///
    /// # Errors
    ///
    /// - [`DbfError::RecordNotIndexed`] for a record with no index.
    /// - [`DbfError::NotSeekable`] on a forward-only stream.
    /// - [`DbfError::RecordOutOfRange`] if the row is past the end.
    pub fn update(&mut self, record: &Record) -> Result<()> {
        self.ensure_writable()?;
        let index = record.record_index().ok_or(DbfError::RecordNotIndexed)?;
        record.ensure_compatible(self.header.schema())?;
        if !self.stream.is_seekable() {
            return Err(DbfError::NotSeekable("update"));
        }

        let record_length = self.header.record_length();
        let pos = record_offset(self.header.header_length(), record_length, index);
        let len = self.stream.stream_len()?.unwrap_or(0);
        if !self.header_written || pos + record_length as u64 > len {
            return Err(DbfError::RecordOutOfRange { index });
        }

        self.stream.seek_to(pos)?;
        record.write_to(&mut self.stream)?;
        debug!(index, "updated record");
        Ok(())
    }

    /// Writes the header now instead of waiting for the first record.
    ///
    /// On a random-access stream this may be repeated, e.g. after changing
    /// the record count. A forward-only stream accepts it once.
    pub fn write_header(&mut self) -> Result<()> {
        self.ensure_writable()?;
        if !self.stream.seek_to(0)? && self.header_written {
            return Err(DbfError::NotSeekable("rewriting the header"));
        }
        self.header.write_to(&mut self.stream)?;
        self.header_written = true;
        if !self.stream.is_seekable() {
            self.announced = Some(self.header.record_count());
            self.header.set_record_count(0);
        }
        Ok(())
    }

    fn ensure_writable(&self) -> Result<()> {
        match self.access {
            AccessMode::ReadWrite => Ok(()),
            AccessMode::Read => Err(DbfError::ReadOnly),
        }
    }
}
