use crate::{ByteCursor, EndOfBuffer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BitstreamError {
    #[error(transparent)]
    EndOfBuffer(#[from] EndOfBuffer),
    #[error("exp-golomb code exceeds 32 bits")]
    ExpGolombOverflow,
}

/// MSB-first bit reader over a [`ByteCursor`].
///
/// Refills one byte at a time from the underlying cursor. Byte alignment
/// is never re-established here: a caller returning to byte-granular work
/// must discard the bit cursor at a byte boundary or accept losing the
/// partially consumed byte.
pub struct BitCursor<'c, 'a> {
    cursor: &'c mut ByteCursor<'a>,
    current_byte: u8,
    bits_left: u8,
}

impl<'c, 'a> BitCursor<'c, 'a> {
    pub fn new(cursor: &'c mut ByteCursor<'a>) -> Self {
        Self {
            cursor,
            current_byte: 0,
            bits_left: 0,
        }
    }

    /// Read the most-significant not-yet-consumed bit.
    pub fn get_bit(&mut self) -> Result<bool, BitstreamError> {
        if self.bits_left == 0 {
            self.current_byte = self.cursor.get_u8()?;
            self.bits_left = 8;
        }
        self.bits_left -= 1;
        Ok((self.current_byte >> self.bits_left) & 1 != 0)
    }

    /// Read `n` (≤ 32) bits MSB-first into a `u32`.
    pub fn get_bits(&mut self, n: u8) -> Result<u32, BitstreamError> {
        debug_assert!(n <= 32);
        let mut value = 0u32;
        for _ in 0..n {
            value = (value << 1) | self.get_bit()? as u32;
        }
        Ok(value)
    }

    /// Read an unsigned Exp-Golomb code (ue(v)).
    pub fn get_golomb_ue(&mut self) -> Result<u32, BitstreamError> {
        let mut leading_zeros = 0u8;
        while !self.get_bit()? {
            leading_zeros += 1;
            if leading_zeros > 31 {
                return Err(BitstreamError::ExpGolombOverflow);
            }
        }
        let suffix = self.get_bits(leading_zeros)?;
        Ok(((1u32 << leading_zeros) | suffix) - 1)
    }

    /// Read a signed Exp-Golomb code (se(v)).
    pub fn get_golomb_se(&mut self) -> Result<i32, BitstreamError> {
        let ue = self.get_golomb_ue()?;
        if ue == 0 {
            Ok(0)
        } else if ue & 1 == 1 {
            Ok(((ue >> 1) + 1) as i32)
        } else {
            Ok(-((ue >> 1) as i32))
        }
    }
}
