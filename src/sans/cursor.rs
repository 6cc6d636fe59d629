//! Sequential reader over an immutable buffer.

use super::Error;

/// A position in an immutable buffer.
///
/// Reads advance the position and fail rather than return short data. Seeks
/// are absolute and may move backward, which the container format relies on
/// to follow pointers and to peek at a structure before restoring position.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// The whole underlying buffer.
    pub fn buffer(&self) -> &'a [u8] {
        self.buf
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of bytes between the position and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// Move to an absolute offset.
    ///
    /// Seeking past the end is allowed; the next read fails instead.
    pub fn seek(&mut self, offset: usize) {
        self.pos = offset;
    }

    /// Advance by a number of bytes without reading them.
    pub fn skip(&mut self, n: usize) -> Result<(), Error> {
        self.read(n).map(|_| ())
    }

    /// Take a number of bytes, advancing the position.
    pub fn read(&mut self, n: usize) -> Result<&'a [u8], Error> {
        let s = self.pos;
        let end = s.checked_add(n).filter(|&end| end <= self.buf.len());

        let Some(end) = end else {
            Err(Error::EndOfBuffer {
                offset: s,
                needed: n,
                remaining: self.remaining(),
            })?
        };

        self.pos = end;
        Ok(&self.buf[s..end])
    }

    /// Take an exact number of bytes, advancing the position.
    pub fn take<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        let mut r = [0; N];
        r.copy_from_slice(self.read(N)?);
        Ok(r)
    }
}
