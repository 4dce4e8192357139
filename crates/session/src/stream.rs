//! Byte streams a table session can sit on.
//!
//! Random-access streams seek to `header_len + index * record_len`;
//! forward-only streams are consumed or appended strictly in order.

use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

/// A readable, writable stream that may or may not support seeking.
pub trait ByteStream: Read + Write {
    /// Moves to absolute position `pos`.
    ///
    /// Returns `Ok(false)` without moving when the stream is forward-only.
    fn seek_to(&mut self, pos: u64) -> io::Result<bool>;

    /// Total length in bytes, or `None` when it cannot be known.
    fn stream_len(&mut self) -> io::Result<Option<u64>>;

    fn is_seekable(&self) -> bool;
}

impl ByteStream for File {
    fn seek_to(&mut self, pos: u64) -> io::Result<bool> {
        self.seek(SeekFrom::Start(pos))?;
        Ok(true)
    }

    fn stream_len(&mut self) -> io::Result<Option<u64>> {
        Ok(Some(self.metadata()?.len()))
    }

    fn is_seekable(&self) -> bool {
        true
    }
}

impl ByteStream for Cursor<Vec<u8>> {
    fn seek_to(&mut self, pos: u64) -> io::Result<bool> {
        self.set_position(pos);
        Ok(true)
    }

    fn stream_len(&mut self) -> io::Result<Option<u64>> {
        Ok(Some(self.get_ref().len() as u64))
    }

    fn is_seekable(&self) -> bool {
        true
    }
}

impl<T: ByteStream + ?Sized> ByteStream for &mut T {
    fn seek_to(&mut self, pos: u64) -> io::Result<bool> {
        (**self).seek_to(pos)
    }

    fn stream_len(&mut self) -> io::Result<Option<u64>> {
        (**self).stream_len()
    }

    fn is_seekable(&self) -> bool {
        (**self).is_seekable()
    }
}

/// Hides the seeking ability of `T`, e.g. for pipes or network sockets.
#[derive(Debug)]
pub struct ForwardOnly<T> {
    inner: T,
}

impl<T: Read + Write> ForwardOnly<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read> Read for ForwardOnly<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<T: Write> Write for ForwardOnly<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<T: Read + Write> ByteStream for ForwardOnly<T> {
    fn seek_to(&mut self, _pos: u64) -> io::Result<bool> {
        Ok(false)
    }

    fn stream_len(&mut self) -> io::Result<Option<u64>> {
        Ok(None)
    }

    fn is_seekable(&self) -> bool {
        false
    }
}
