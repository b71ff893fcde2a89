use num_bigint::{BigInt, BigUint};

use super::ByteOrder;

/// Widest raw slice that still decodes into a native integer; wider slices
/// go through the arbitrary-precision readers.
pub const MAX_INT_BYTES: usize = 16;

/// Integer view over a field's raw bytes.
///
/// Byte-order conventions live here so codecs and bit extraction never index
/// raw bytes themselves.
pub struct IntReader<'a> {
    raw: &'a [u8],
    order: ByteOrder,
}

impl<'a> IntReader<'a> {
    pub fn new(raw: &'a [u8], order: ByteOrder) -> Self {
        Self { raw, order }
    }

    /// Whether the slice fits into a 128-bit integer.
    pub fn fits(&self) -> bool {
        self.raw.len() <= MAX_INT_BYTES
    }

    /// Unsigned interpretation; bytes beyond the first 16 significant ones
    /// are shifted out, callers check [`IntReader::fits`] first.
    pub fn read_unsigned(&self) -> u128 {
        let fold = |acc: u128, byte: &u8| (acc << 8) | u128::from(*byte);
        match self.order {
            ByteOrder::Big => self.raw.iter().fold(0, fold),
            ByteOrder::Little => self.raw.iter().rev().fold(0, fold),
        }
    }

    /// Two's complement interpretation over the slice width.
    pub fn read_signed(&self) -> i128 {
        let bits = self.raw.len().min(MAX_INT_BYTES) * 8;
        if bits == 0 {
            return 0;
        }
        let shift = 128 - bits as u32;
        ((self.read_unsigned() << shift) as i128) >> shift
    }

    /// Unsigned interpretation of a slice of any width.
    pub fn read_wide_unsigned(&self) -> BigUint {
        match self.order {
            ByteOrder::Big => BigUint::from_bytes_be(self.raw),
            ByteOrder::Little => BigUint::from_bytes_le(self.raw),
        }
    }

    /// Two's complement interpretation of a slice of any width.
    pub fn read_wide_signed(&self) -> BigInt {
        match self.order {
            ByteOrder::Big => BigInt::from_signed_bytes_be(self.raw),
            ByteOrder::Little => BigInt::from_signed_bytes_le(self.raw),
        }
    }
}
