//! DeviceSQL string encoding
//!
//! Strings are referenced from rows by an offset relative to the row start.
//! The first byte at the target is a tag selecting the encoding:
//! - `0x40` long ASCII: one length byte, then that many single-byte chars
//! - `0x90` UTF-16LE: u16 byte length, then little-endian code units
//! - `<= 0x3F` short ASCII: `tag / 2` chars, trailing NULs stripped
//! - anything else: short ASCII with `(tag - 1) / 2 - 1` chars
//!
//! Decoding is total. Any bounds or decoding failure yields an empty string.

use crate::cursor::ByteCursor;

/// Flag byte values
const FLAG_LONG_ASCII: u8 = 0x40;
const FLAG_UTF16LE: u8 = 0x90;

/// Highest tag handled by the self-describing short form
const MAX_SELF_DESCRIBING_TAG: u8 = 0x3F;

/// Longest string accepted from the fallback short form
const MAX_FALLBACK_LEN: i32 = 127;

/// Longest ASCII string the self-describing short form can carry
const MAX_SELF_DESCRIBING_LEN: usize = (MAX_SELF_DESCRIBING_TAG as usize) / 2;

/// Longest ASCII string the fallback short form can carry
const MAX_SHORT_ASCII_LEN: usize = 126;

impl ByteCursor<'_> {
    /// Decode the string referenced by `relative` from a row starting at
    /// `base`. An offset of 0 is the null string.
    pub fn read_devicesql_string(&mut self, base: usize, relative: usize) -> String {
        if relative == 0 {
            return String::new();
        }
        match base.checked_add(relative) {
            Some(pos) => self.read_devicesql_string_at(pos),
            None => String::new(),
        }
    }

    /// Decode the string whose tag byte sits at `pos`
    pub fn read_devicesql_string_at(&mut self, pos: usize) -> String {
        if !self.fits(pos, 1) {
            return String::new();
        }
        let tag = self.u8_at(pos);
        match tag {
            FLAG_LONG_ASCII => {
                if !self.fits(pos, 2) {
                    return String::new();
                }
                let len = self.read_u8() as usize;
                latin1(self.read_bytes(len))
            }
            FLAG_UTF16LE => {
                if !self.fits(pos, 3) {
                    return String::new();
                }
                let len = self.read_u16() as usize;
                utf16le(self.read_bytes(len))
            }
            t if t <= MAX_SELF_DESCRIBING_TAG => {
                let len = (t / 2) as usize;
                strip_nuls(latin1(self.read_bytes(len)))
            }
            t => {
                let len = (t as i32 - 1) / 2 - 1;
                if len <= 0 || len > MAX_FALLBACK_LEN {
                    return String::new();
                }
                strip_nuls(latin1(self.read_bytes(len as usize)))
            }
        }
    }
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn utf16le(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    match String::from_utf16(&units) {
        Ok(s) => strip_nuls(s),
        Err(_) => String::new(),
    }
}

fn strip_nuls(mut s: String) -> String {
    let trimmed = s.trim_end_matches('\0').len();
    s.truncate(trimmed);
    s
}

/// Encode a string in the DeviceSQL format read by this crate
///
/// Automatically selects the appropriate encoding:
/// - Short ASCII for ASCII strings of at most 126 chars
/// - Long ASCII for ASCII strings of at most 255 chars
/// - UTF-16LE otherwise
pub fn encode_string(s: &str) -> Vec<u8> {
    let is_ascii = s.is_ascii();

    if is_ascii && s.len() <= MAX_SHORT_ASCII_LEN {
        encode_short_ascii(s)
    } else if is_ascii && s.len() <= u8::MAX as usize {
        encode_long_ascii(s)
    } else {
        encode_utf16le(s)
    }
}

/// Header byte: `(len << 1) | 1` up to 31 chars, `((len + 1) << 1) | 1` above
fn encode_short_ascii(s: &str) -> Vec<u8> {
    let len = s.len();
    let header = if len <= MAX_SELF_DESCRIBING_LEN {
        ((len as u8) << 1) | 1
    } else {
        (((len + 1) as u8) << 1) | 1
    };

    let mut result = Vec::with_capacity(len + 1);
    result.push(header);
    result.extend_from_slice(s.as_bytes());
    result
}

/// Format: [0x40, len, ...ascii_data...]
fn encode_long_ascii(s: &str) -> Vec<u8> {
    let mut result = Vec::with_capacity(2 + s.len());
    result.push(FLAG_LONG_ASCII);
    result.push(s.len() as u8);
    result.extend_from_slice(s.as_bytes());
    result
}

/// Format: [0x90, len_lo, len_hi, ...utf16_data...]
fn encode_utf16le(s: &str) -> Vec<u8> {
    let max_units = u16::MAX as usize / 2;
    let utf16_chars: Vec<u16> = s.encode_utf16().take(max_units).collect();
    let byte_len = (utf16_chars.len() * 2) as u16;

    let mut result = Vec::with_capacity(3 + byte_len as usize);
    result.push(FLAG_UTF16LE);
    result.extend_from_slice(&byte_len.to_le_bytes());
    for ch in utf16_chars {
        result.extend_from_slice(&ch.to_le_bytes());
    }
    result
}
