//! Exact-width bit sequences, most significant bit first.
//!
//! Every constructor and accessor checks its width; nothing here ever
//! silently drops a bit.

use bitvec::prelude::*;
use std::fmt;

const MAX_UINT_BITS: usize = 32;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum BitsError {
    /// `value` does not fit in `width` bits.
    ValueTooWide { value: u32, width: usize },
    /// A range `[offset, offset + len)` runs past the end of a vector of `available` bits.
    OutOfRange {
        offset: usize,
        len: usize,
        available: usize,
    },
    TooWideForInt(usize),
    NotByteAligned(usize),
}

impl fmt::Display for BitsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BitsError::ValueTooWide { value, width } => {
                write!(f, "Value {} does not fit in {} bits.", value, width)
            }
            BitsError::OutOfRange {
                offset,
                len,
                available,
            } => write!(
                f,
                "Bit range {}..{} is out of range for {} bits.",
                offset,
                offset + len,
                available
            ),
            BitsError::TooWideForInt(width) => write!(
                f,
                "Cannot convert {} bits to an integer of at most {} bits.",
                width, MAX_UINT_BITS
            ),
            BitsError::NotByteAligned(width) => {
                write!(f, "Cannot convert {} bits to whole bytes.", width)
            }
        }
    }
}

impl std::error::Error for BitsError {}

#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct BitVector {
    bits: BitVec<Msb0, u8>,
}

impl BitVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_uint(value: u32, width: usize) -> Result<Self, BitsError> {
        if width > MAX_UINT_BITS || (width < MAX_UINT_BITS && u64::from(value) >> width != 0) {
            return Err(BitsError::ValueTooWide { value, width });
        }
        let bits = (0..width).rev().map(|shift| (value >> shift) & 1 == 1);
        Ok(Self::from_bits(bits))
    }

    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        let mut bits = BitVec::new();
        bits.extend_from_bitslice(bytes.view_bits::<Msb0>());
        Self { bits }
    }

    pub fn from_bits(bits: impl IntoIterator<Item = bool>) -> Self {
        let mut retvl = Self::new();
        for bit in bits {
            retvl.bits.push(bit);
        }
        retvl
    }

    pub fn concat<'a>(parts: impl IntoIterator<Item = &'a BitVector>) -> Self {
        let mut retvl = Self::new();
        for part in parts {
            retvl.bits.extend_from_bitslice(&part.bits[..]);
        }
        retvl
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<bool> {
        if index < self.len() {
            Some(self.bits[index])
        } else {
            None
        }
    }

    pub fn slice(&self, offset: usize, len: usize) -> Result<Self, BitsError> {
        let end = offset
            .checked_add(len)
            .filter(|&end| end <= self.len())
            .ok_or(BitsError::OutOfRange {
                offset,
                len,
                available: self.len(),
            })?;
        let mut bits = BitVec::new();
        bits.extend_from_bitslice(&self.bits[offset..end]);
        Ok(Self { bits })
    }

    /// Splits into consecutive `chunk`-bit pieces; the length must be an exact multiple.
    pub fn split(&self, chunk: usize) -> Result<Vec<Self>, BitsError> {
        if chunk == 0 || self.len() % chunk != 0 {
            return Err(BitsError::OutOfRange {
                offset: self.len() - self.len() % chunk.max(1),
                len: chunk,
                available: self.len(),
            });
        }
        (0..self.len() / chunk)
            .map(|idx| self.slice(idx * chunk, chunk))
            .collect()
    }

    pub fn reversed(&self) -> Self {
        Self::from_bits((0..self.len()).rev().map(|idx| self.bits[idx]))
    }

    pub fn to_uint(&self) -> Result<u32, BitsError> {
        match self.len() {
            0 => Ok(0),
            width if width > MAX_UINT_BITS => Err(BitsError::TooWideForInt(width)),
            _ => Ok(self.bits.load_be::<u32>()),
        }
    }

    pub fn to_be_bytes(&self) -> Result<Vec<u8>, BitsError> {
        if self.len() % 8 != 0 {
            return Err(BitsError::NotByteAligned(self.len()));
        }
        Ok(self.bits.clone().into_vec())
    }
}

impl fmt::Display for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for idx in 0..self.len() {
            f.write_str(if self.bits[idx] { "1" } else { "0" })?;
        }
        Ok(())
    }
}
