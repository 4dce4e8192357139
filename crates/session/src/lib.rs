//! # Session - one open DBF table
//!
//! [`DbfFile`] owns a [`ByteStream`] and the table's [`Header`], and moves
//! records between the two.
//!
//! ```text
//! open ──► header read (or fresh header on an empty stream)
//!            │
//!            ├── read.rs   read(index) / read_next() / read_value()
//!            │               seek to header_len + index * record_len,
//!            │               or consume in order when forward-only
//!            │
//!            ├── write.rs  write() / update() / write_header()
//!            │               header written lazily before the first record,
//!            │               appends end with the 0x1A marker
//!            │
//! close ─────┴── dirty header flushed, stream flushed
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module       | Purpose                                                |
//! |--------------|--------------------------------------------------------|
//! | [`lib.rs`]   | `DbfFile` struct, open/create, accessors, close, `Drop` |
//! | [`stream`]   | `ByteStream` trait, `File`/`Cursor` impls, `ForwardOnly` |
//! | [`read`]     | `read()`, `read_next()`, `read_value()`                 |
//! | [`write`]    | `write()`, `write_and_clear()`, `update()`, `write_header()` |
//!
//! Encoding is chosen once at open: `config.encoding`, then a `<name>.cpg`
//! sidecar next to the file, then the header's language driver byte, then
//! `config.default_encoding`.

mod read;
mod stream;
mod write;

use config::DbfConfig;
use dbf::{EncodingPolicy, Header, LastUpdate, Record, Result, EOF_MARKER};
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

pub use stream::{ByteStream, ForwardOnly};

/// How a table is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    ReadWrite,
}

#[derive(Debug, Error)]
#[error("unknown access mode '{0}', expected \"r\" or \"rw\"")]
pub struct ParseAccessModeError(String);

impl FromStr for AccessMode {
    type Err = ParseAccessModeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "r" => Ok(AccessMode::Read),
            "rw" => Ok(AccessMode::ReadWrite),
            other => Err(ParseAccessModeError(other.to_string())),
        }
    }
}

/// An open table: header plus the stream its records live in.
///
/// The stream is owned exclusively for the session's lifetime. A session is
/// not meant to be shared between threads.
pub struct DbfFile<S: ByteStream = File> {
    pub(crate) stream: S,
    pub(crate) header: Header,
    pub(crate) access: AccessMode,
    pub(crate) config: DbfConfig,

    /// `true` once the header bytes exist in the stream.
    pub(crate) header_written: bool,

    /// Index `read_next` returns next.
    pub(crate) cursor: u64,

    /// Records appended through a forward-only stream.
    pub(crate) appended: u64,

    /// Record count a forward-only stream's header was written with.
    pub(crate) announced: Option<u32>,

    pub(crate) closed: bool,
}

impl<S: ByteStream> std::fmt::Debug for DbfFile<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbfFile")
            .field("access", &self.access)
            .field("seekable", &self.stream.is_seekable())
            .field("columns", &self.header.column_count())
            .field("record_count", &self.header.record_count())
            .field("record_length", &self.header.record_length())
            .field("encoding", &self.header.encoding().name())
            .field("header_written", &self.header_written)
            .field("cursor", &self.cursor)
            .finish()
    }
}

impl DbfFile<File> {
    /// Opens the table at `path`.
    ///
    /// In [`AccessMode::ReadWrite`] a missing file is created and starts
    /// with an empty, unlocked header. When `config.read_sidecar` is set, a
    /// `<name>.cpg` file in the same directory declares the encoding.
    ///
    /// # Errors
    ///
    /// - [`dbf::DbfError::EncodingUnavailable`] if the configured or
    ///   declared codec is unknown.
    /// - Any header read error, see [`Header::read_from`].
    pub fn open<P: AsRef<Path>>(path: P, access: AccessMode, config: &DbfConfig) -> Result<Self> {
        let path = path.as_ref();
        let file = match access {
            AccessMode::Read => File::open(path)?,
            AccessMode::ReadWrite => OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(path)?,
        };

        let sidecar = if config.read_sidecar {
            match codepage::find_sidecar(path)? {
                Some(cpg) => {
                    let declared = codepage::read_declared_encoding(&cpg)?;
                    debug!(path = %cpg.display(), declared = ?declared, "found encoding sidecar");
                    declared
                }
                None => None,
            }
        } else {
            None
        };

        let policy = EncodingPolicy::from_config(config, sidecar.as_deref())?;
        debug!(path = %path.display(), ?access, "opening dbf file");
        Self::with_policy(file, access, config, policy)
    }

    /// Creates (or empties) the table at `path` for writing.
    pub fn create<P: AsRef<Path>>(path: P, config: &DbfConfig) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        let policy = EncodingPolicy::from_config(config, None)?;
        debug!(path = %path.display(), "creating dbf file");
        Self::with_policy(file, AccessMode::ReadWrite, config, policy)
    }
}

impl<S: ByteStream> DbfFile<S> {
    /// Binds an already open stream, positioned at its start.
    ///
    /// No sidecar lookup happens here; set `config.encoding` to force a codec.
    pub fn from_stream(stream: S, access: AccessMode, config: &DbfConfig) -> Result<Self> {
        let policy = EncodingPolicy::from_config(config, None)?;
        Self::with_policy(stream, access, config, policy)
    }

    fn with_policy(
        mut stream: S,
        access: AccessMode,
        config: &DbfConfig,
        policy: EncodingPolicy,
    ) -> Result<Self> {
        let len = stream.stream_len()?;
        let (header, header_written) = match Header::read_from(&mut stream, len, &policy)? {
            Some(header) => (header, true),
            None => (Header::new(policy.for_new_header()), false),
        };

        debug!(
            columns = header.column_count(),
            record_count = header.record_count(),
            encoding = header.encoding().name(),
            existing = header_written,
            "dbf session open"
        );

        Ok(Self {
            stream,
            header,
            access,
            config: config.clone(),
            header_written,
            cursor: 0,
            appended: 0,
            announced: None,
            closed: false,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Mutable header, for adding columns to a new table or announcing the
    /// record count before a forward-only write.
    pub fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    #[must_use]
    pub fn access(&self) -> AccessMode {
        self.access
    }

    pub fn config(&self) -> &DbfConfig {
        &self.config
    }

    #[must_use]
    pub fn is_seekable(&self) -> bool {
        self.stream.is_seekable()
    }

    /// Records in the table. On a forward-only writer this counts the rows
    /// appended so far, not the count stored in the already written header.
    #[must_use]
    pub fn record_count(&self) -> u32 {
        self.header.record_count()
    }

    /// A blank record bound to this table, carrying the session's truncation
    /// flags and null sentinels. Locks the header.
    pub fn new_record(&mut self) -> Record {
        Record::with_config(&mut self.header, &self.config)
    }

    /// Flushes a dirty header and the stream, then releases the stream.
    pub fn close(mut self) -> Result<()> {
        self.finish()
    }

    fn finish(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if self.access == AccessMode::ReadWrite {
            if self.stream.is_seekable() {
                if self.header.is_dirty() {
                    self.header.set_last_update(LastUpdate::today());
                    self.stream.seek_to(0)?;
                    self.header.write_to(&mut self.stream)?;
                    self.header_written = true;
                }
            } else {
                self.finish_forward_only()?;
            }
        }

        self.stream.flush()?;
        debug!(record_count = self.header.record_count(), "dbf session closed");
        Ok(())
    }

    fn finish_forward_only(&mut self) -> Result<()> {
        if !self.header_written {
            if !self.header.is_dirty() {
                return Ok(());
            }
            self.write_header()?;
        }
        self.stream.write_all(&[EOF_MARKER])?;

        if let Some(announced) = self.announced {
            if u64::from(announced) != self.appended {
                warn!(
                    announced,
                    written = self.appended,
                    "forward-only stream cannot rewrite the header record count"
                );
            }
        }
        Ok(())
    }
}

/// Best-effort close on drop.
///
/// Errors are ignored because Drop cannot report them; call
/// [`DbfFile::close`] to see them.
impl<S: ByteStream> Drop for DbfFile<S> {
    fn drop(&mut self) {
        let _ = self.finish();
    }
}

#[cfg(test)]
mod tests;
