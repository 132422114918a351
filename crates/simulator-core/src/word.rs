//! Register word abstraction shared by every ISA variant.
//!
//! Registers are 32, 64 or 128 bits wide depending on the variant. The
//! [`Word`] trait exposes the handful of operations instruction semantics
//! need so that one implementation of a family serves every width.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Not};

/// Byte address in simulated memory.
pub type Address = u64;

/// Unsigned machine word of a fixed bit width.
pub trait Word:
    Copy
    + Default
    + Eq
    + Ord
    + fmt::Debug
    + fmt::LowerHex
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + BitXor<Output = Self>
    + Not<Output = Self>
    + Send
    + Sync
    + 'static
{
    /// Width of the word in bits.
    const BITS: u32;
    /// All bits clear.
    const ZERO: Self;
    /// Numeric one.
    const ONE: Self;

    /// Zero-extends a 64-bit value (truncating when the word is narrower).
    fn from_u64(value: u64) -> Self;

    /// Sign-extends a 64-bit value (truncating when the word is narrower).
    fn from_i64(value: i64) -> Self;

    /// Low 64 bits of the word.
    fn to_u64(self) -> u64;

    /// Zero-extended 128-bit view of the word.
    fn to_u128(self) -> u128;

    /// Modular addition.
    #[must_use]
    fn wrapping_add(self, rhs: Self) -> Self;

    /// Modular subtraction.
    #[must_use]
    fn wrapping_sub(self, rhs: Self) -> Self;

    /// Logical shift left; `amount` is taken modulo [`Word::BITS`].
    #[must_use]
    fn shl(self, amount: u32) -> Self;

    /// Logical shift right; `amount` is taken modulo [`Word::BITS`].
    #[must_use]
    fn shr(self, amount: u32) -> Self;

    /// Arithmetic shift right; `amount` is taken modulo [`Word::BITS`].
    #[must_use]
    fn sra(self, amount: u32) -> Self;

    /// Two's-complement signed comparison `self < rhs`.
    fn signed_lt(self, rhs: Self) -> bool;

    /// Low 32 bits of the word.
    #[allow(clippy::cast_possible_truncation)]
    fn low32(self) -> u32 {
        self.to_u64() as u32
    }

    /// Sign-extends the low 32 bits to the full word width.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    fn sext32(self) -> Self {
        Self::from_i64(i64::from(self.low32() as i32))
    }

    /// Returns true when the two's-complement value is negative.
    fn is_negative(self) -> bool {
        self.signed_lt(Self::ZERO)
    }
}

macro_rules! impl_word {
    ($unsigned:ty, $signed:ty) => {
        impl Word for $unsigned {
            const BITS: u32 = <$unsigned>::BITS;
            const ZERO: Self = 0;
            const ONE: Self = 1;

            #[allow(clippy::cast_possible_truncation, clippy::cast_lossless)]
            fn from_u64(value: u64) -> Self {
                value as $unsigned
            }

            #[allow(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                clippy::cast_lossless
            )]
            fn from_i64(value: i64) -> Self {
                value as $signed as $unsigned
            }

            #[allow(clippy::cast_possible_truncation, clippy::cast_lossless)]
            fn to_u64(self) -> u64 {
                self as u64
            }

            #[allow(clippy::cast_lossless)]
            fn to_u128(self) -> u128 {
                self as u128
            }

            fn wrapping_add(self, rhs: Self) -> Self {
                <$unsigned>::wrapping_add(self, rhs)
            }

            fn wrapping_sub(self, rhs: Self) -> Self {
                <$unsigned>::wrapping_sub(self, rhs)
            }

            fn shl(self, amount: u32) -> Self {
                <$unsigned>::wrapping_shl(self, amount)
            }

            fn shr(self, amount: u32) -> Self {
                <$unsigned>::wrapping_shr(self, amount)
            }

            #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
            fn sra(self, amount: u32) -> Self {
                <$signed>::wrapping_shr(self as $signed, amount) as $unsigned
            }

            #[allow(clippy::cast_possible_wrap)]
            fn signed_lt(self, rhs: Self) -> bool {
                (self as $signed) < (rhs as $signed)
            }
        }
    };
}

impl_word!(u32, i32);
impl_word!(u64, i64);
impl_word!(u128, i128);

#[cfg(test)]
mod tests {
    use super::Word;

    #[test]
    fn sign_extension_follows_width() {
        assert_eq!(<u32 as Word>::from_i64(-1), u32::MAX);
        assert_eq!(<u64 as Word>::from_i64(-2), u64::MAX - 1);
        assert_eq!(<u128 as Word>::from_i64(-1), u128::MAX);
        assert_eq!(<u64 as Word>::from_u64(u64::MAX).to_u128(), u128::from(u64::MAX));
    }

    #[test]
    fn sext32_replicates_bit_31() {
        assert_eq!(0x8000_0000_u64.sext32(), 0xFFFF_FFFF_8000_0000);
        assert_eq!(0x1_7FFF_FFFF_u64.sext32(), 0x7FFF_FFFF);
        assert_eq!(0x8000_0000_u32.sext32(), 0x8000_0000);
        assert_eq!(
            0x8000_0000_u128.sext32(),
            0xFFFF_FFFF_FFFF_FFFF_FFFF_FFFF_8000_0000
        );
    }

    #[test]
    fn arithmetic_shift_keeps_sign() {
        assert_eq!(Word::sra(0x8000_0000_u32, 4), 0xF800_0000);
        assert_eq!(Word::shr(0x8000_0000_u32, 4), 0x0800_0000);
        assert_eq!(Word::sra(u128::MAX, 100), u128::MAX);
    }

    #[test]
    fn signed_compare_differs_from_unsigned() {
        assert!(u64::MAX.signed_lt(0));
        assert!(u64::MAX.is_negative());
        assert!(!0_u32.signed_lt(u32::MAX));
    }
}
