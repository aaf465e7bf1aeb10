// Bit Buffer
// MSB-first bit storage used by the block codec to push and read N-bit fields

use num_traits::Zero;

use super::bigint::RsaBigInt;

/// A growable sequence of bits backed by bytes.
///
/// Bit `i` lives in byte `i / 8` at position `7 - i % 8`, so the byte
/// representation of a buffer built from bytes is those same bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitBuffer {
    bytes: Vec<u8>,
    len: usize,
}

impl BitBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bits: usize) -> Self {
        Self {
            bytes: Vec::with_capacity((bits + 7) / 8),
            len: 0,
        }
    }

    /// View whole bytes as a bit stream, most significant bit first
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
            len: bytes.len() * 8,
        }
    }

    /// Number of bits stored
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bit(&self, index: usize) -> Option<bool> {
        if index >= self.len {
            return None;
        }
        Some(self.bytes[index / 8] & (0x80 >> (index % 8)) != 0)
    }

    pub fn push_bit(&mut self, bit: bool) {
        if self.len % 8 == 0 {
            self.bytes.push(0);
        }
        if bit {
            let last = self.bytes.len() - 1;
            self.bytes[last] |= 0x80 >> (self.len % 8);
        }
        self.len += 1;
    }

    /// Append the low `width` bits of `value`, most significant first
    pub fn push_bits(&mut self, value: &RsaBigInt, width: usize) {
        for i in (0..width).rev() {
            self.push_bit(value.bit(i as u64));
        }
    }

    pub fn push_ones(&mut self, width: usize) {
        for _ in 0..width {
            self.push_bit(true);
        }
    }

    /// Fill up to the next byte boundary with `fill`, returns the number of bits added
    pub fn pad_to_byte(&mut self, fill: bool) -> usize {
        let pad = (8 - self.len % 8) % 8;
        for _ in 0..pad {
            self.push_bit(fill);
        }
        pad
    }

    /// Read `width` bits starting at `offset` as an unsigned integer
    pub fn read(&self, offset: usize, width: usize) -> Option<RsaBigInt> {
        if offset.checked_add(width)? > self.len {
            return None;
        }

        let mut value = RsaBigInt::zero();
        for index in offset..offset + width {
            value <<= 1u32;
            if self.bytes[index / 8] & (0x80 >> (index % 8)) != 0 {
                value |= RsaBigInt::from(1u8);
            }
        }
        Some(value)
    }

    /// Keep only the first `len` bits
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        self.len = len;
        self.bytes.truncate((len + 7) / 8);
        if len % 8 != 0 {
            let last = self.bytes.len() - 1;
            self.bytes[last] &= 0xFF << (8 - len % 8);
        }
    }

    /// Bytes holding the stored bits; a trailing partial byte is zero-filled
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn reader(&self) -> BitReader<'_> {
        BitReader { buf: self, pos: 0 }
    }

    /// Consecutive `width`-bit windows; the last one may be shorter
    pub fn chunks(&self, width: usize) -> Chunks<'_> {
        assert!(width > 0, "window width must be positive");
        Chunks { buf: self, pos: 0, width }
    }
}

/// Iterator over windows of a [`BitBuffer`], yielding each value with its bit count
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    buf: &'a BitBuffer,
    pos: usize,
    width: usize,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = (RsaBigInt, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let take = self.width.min(self.buf.len().checked_sub(self.pos)?);
        if take == 0 {
            return None;
        }
        let value = self.buf.read(self.pos, take)?;
        self.pos += take;
        Some((value, take))
    }
}

/// Cursor over a [`BitBuffer`]
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    buf: &'a BitBuffer,
    pos: usize,
}

impl<'a> BitReader<'a> {
    /// Read the next `width` bits, leaving the cursor untouched when too few remain
    pub fn read(&mut self, width: usize) -> Option<RsaBigInt> {
        let value = self.buf.read(self.pos, width)?;
        self.pos += width;
        Some(value)
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}
