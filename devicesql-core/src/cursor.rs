//! Bounds-checked little-endian access to a database image
//!
//! Every read checks `position + size <= len` first. A read that would run
//! past the end yields zero (or an empty slice) instead of failing, so a
//! truncated or corrupt file degrades to default values.

/// Read cursor over one immutable buffer
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Underlying buffer
    pub fn buffer(&self) -> &'a [u8] {
        self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Move the read position. Seeking past the end is allowed; reads from
    /// there return zero.
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// True when `size` bytes starting at `pos` lie inside the buffer
    pub fn fits(&self, pos: usize, size: usize) -> bool {
        pos.checked_add(size).is_some_and(|end| end <= self.buf.len())
    }

    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        if !self.fits(self.pos, N) {
            return None;
        }
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;
        Some(bytes)
    }

    pub fn read_u8(&mut self) -> u8 {
        self.take::<1>().map(|b| b[0]).unwrap_or(0)
    }

    pub fn read_u16(&mut self) -> u16 {
        self.take::<2>().map(u16::from_le_bytes).unwrap_or(0)
    }

    pub fn read_u32(&mut self) -> u32 {
        self.take::<4>().map(u32::from_le_bytes).unwrap_or(0)
    }

    /// Read `n` bytes, or an empty slice if fewer remain
    pub fn read_bytes(&mut self, n: usize) -> &'a [u8] {
        if !self.fits(self.pos, n) {
            return &[];
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        bytes
    }

    pub fn u8_at(&mut self, pos: usize) -> u8 {
        self.seek(pos);
        self.read_u8()
    }

    pub fn u16_at(&mut self, pos: usize) -> u16 {
        self.seek(pos);
        self.read_u16()
    }

    pub fn u32_at(&mut self, pos: usize) -> u32 {
        self.seek(pos);
        self.read_u32()
    }
}

/// Read a little-endian u32 without a cursor; zero when out of bounds
pub fn peek_u32(buf: &[u8], pos: usize) -> u32 {
    match pos.checked_add(4) {
        Some(end) if end <= buf.len() => {
            u32::from_le_bytes([buf[pos], buf[pos + 1], buf[pos + 2], buf[pos + 3]])
        }
        _ => 0,
    }
}

/// Overwrite a little-endian u32 in place. Returns false (buffer untouched)
/// when the field does not fit.
pub fn put_u32(buf: &mut [u8], pos: usize, value: u32) -> bool {
    match pos.checked_add(4) {
        Some(end) if end <= buf.len() => {
            buf[pos..end].copy_from_slice(&value.to_le_bytes());
            true
        }
        _ => false,
    }
}
