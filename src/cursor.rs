//! Forward-only reader over raw section bytes.
//!
//! [`ByteCursor`] is the only way the decoders touch section payloads. It
//! never rewinds: every read consumes bytes, and a failed read reports the
//! offset it stopped at.

use thiserror::Error;

/// Errors arising from reading past the end of, or misreading, a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CursorError {
    /// Fewer bytes remain than the read requires.
    #[error("unexpected end of data at offset {offset}: needed {needed} bytes, {remaining} left")]
    UnexpectedEnd {
        /// Offset where the read started.
        offset: usize,
        /// Bytes the read required.
        needed: usize,
        /// Bytes still available.
        remaining: usize,
    },

    /// A length-prefixed string is not valid UTF-8.
    #[error("invalid UTF-8 string at offset {offset}")]
    InvalidUtf8 {
        /// Offset of the string body.
        offset: usize,
    },
}

/// A sequential reader over a borrowed byte slice.
///
/// # Examples
///
/// ```
/// use phigros_save::cursor::ByteCursor;
///
/// let mut cursor = ByteCursor::new(&[1, 2, 3]);
/// assert_eq!(cursor.read_byte(), Ok(1));
/// assert_eq!(cursor.read_remaining(), &[2, 3]);
/// assert!(cursor.is_exhausted());
/// ```
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteCursor<'a> {
    /// Start reading `bytes` from the beginning.
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Number of bytes consumed so far.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Number of bytes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.offset)
    }

    /// Whether every byte has been consumed.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Read a single byte.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::UnexpectedEnd`] when the cursor is exhausted.
    pub fn read_byte(&mut self) -> Result<u8, CursorError> {
        let [byte] = self.read_array::<1>()?;
        Ok(byte)
    }

    /// Consume and return every byte not yet read.
    pub fn read_remaining(&mut self) -> &'a [u8] {
        let rest = self.bytes.get(self.offset..).unwrap_or_default();
        self.offset = self.bytes.len();
        rest
    }

    /// Consume exactly `len` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::UnexpectedEnd`] if fewer than `len` bytes
    /// remain; the cursor is left where it was.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8], CursorError> {
        let end = self.offset.checked_add(len);
        let slice = end.and_then(|end| self.bytes.get(self.offset..end));
        let Some(slice) = slice else {
            return Err(CursorError::UnexpectedEnd {
                offset: self.offset,
                needed: len,
                remaining: self.remaining(),
            });
        };
        self.offset += len;
        Ok(slice)
    }

    /// Read a variable-length short: one byte below `0x80`, otherwise
    /// seven low bits followed by a second byte holding the high bits.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::UnexpectedEnd`] if the value is cut short.
    pub fn read_var_short(&mut self) -> Result<u16, CursorError> {
        let low = self.read_byte()?;
        if low < 0x80 {
            return Ok(u16::from(low));
        }
        let high = self.read_byte()?;
        Ok(u16::from(low & 0x7f) | (u16::from(high) << 7))
    }

    /// Read a var-short length followed by that many UTF-8 bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::UnexpectedEnd`] if the string is cut short or
    /// [`CursorError::InvalidUtf8`] if its bytes are not UTF-8.
    pub fn read_string(&mut self) -> Result<String, CursorError> {
        let len = self.read_var_short()?;
        let offset = self.offset;
        let raw = self.take(usize::from(len))?;
        String::from_utf8(raw.to_vec()).map_err(|_| CursorError::InvalidUtf8 { offset })
    }

    /// Read one byte as a set of boolean flags.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::UnexpectedEnd`] when the cursor is exhausted.
    pub fn read_flags(&mut self) -> Result<Flags, CursorError> {
        self.read_byte().map(Flags)
    }

    /// Read a little-endian `u16`.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::UnexpectedEnd`] if fewer than two bytes remain.
    pub fn read_u16(&mut self) -> Result<u16, CursorError> {
        self.read_array().map(u16::from_le_bytes)
    }

    /// Read a little-endian `i32`.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::UnexpectedEnd`] if fewer than four bytes remain.
    pub fn read_i32(&mut self) -> Result<i32, CursorError> {
        self.read_array().map(i32::from_le_bytes)
    }

    /// Read a little-endian `f32`.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::UnexpectedEnd`] if fewer than four bytes remain.
    pub fn read_f32(&mut self) -> Result<f32, CursorError> {
        self.read_array().map(f32::from_le_bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CursorError> {
        let slice = self.take(N)?;
        let mut out = [0_u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }
}

/// Eight boolean flags packed into one byte, least significant bit first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Flags(u8);

impl Flags {
    /// Wrap a raw flag byte.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Return whether flag `index` is set. Indices past 7 are never set.
    #[must_use]
    pub const fn get(self, index: u32) -> bool {
        match 1_u8.checked_shl(index) {
            Some(mask) => self.0 & mask != 0,
            None => false,
        }
    }

    /// Return the raw flag byte.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }
}
