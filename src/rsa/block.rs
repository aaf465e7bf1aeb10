// Block Framing Parameters
// Window widths derived from the modulus, per block scheme

use std::fmt;

use num_traits::Zero;

use super::bigint::{byte_width, from_u64, nominal_width, RsaBigInt};
use super::error::{RsaError, RsaResult};

/// How plaintext is cut into blocks and how ciphertext blocks are framed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum BlockScheme {
    /// Variable-width windows, wide ciphertext announced by an all-ones marker
    Marked,
    /// Byte-aligned ciphertext windows followed by a length trailer
    #[default]
    Unified,
    /// One byte per block, each stored in a whole number of bytes
    Bytewise,
}

impl BlockScheme {
    /// Smallest modulus the scheme can frame losslessly
    pub fn min_modulus(self) -> u32 {
        match self {
            BlockScheme::Marked | BlockScheme::Unified => 2,
            BlockScheme::Bytewise => 256,
        }
    }
}

impl fmt::Display for BlockScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BlockScheme::Marked => "marked",
            BlockScheme::Unified => "unified",
            BlockScheme::Bytewise => "bytewise",
        };
        f.write_str(name)
    }
}

/// Widths used while framing with a given modulus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    /// Nominal plaintext window, floor(log2(n)) bits
    pub window_bits: usize,
    /// Ciphertext window of the unified scheme, next multiple of 8 above `window_bits`
    pub unified_bits: usize,
    /// Ciphertext block of the bytewise scheme
    pub block_bytes: usize,
}

impl BlockLayout {
    /// Check the scheme's modulus precondition and derive the widths
    pub fn new(modulus: &RsaBigInt, scheme: BlockScheme) -> RsaResult<Self> {
        if modulus.is_zero() {
            return Err(RsaError::InvalidModulus);
        }
        let minimum = scheme.min_modulus();
        if *modulus < from_u64(u64::from(minimum)) {
            return Err(RsaError::ModulusTooSmall {
                modulus: modulus.clone(),
                minimum,
            });
        }

        let window_bits = nominal_width(modulus);
        Ok(Self {
            window_bits,
            unified_bits: unified_width(window_bits),
            block_bytes: byte_width(modulus),
        })
    }

    /// The all-ones window announcing a wide ciphertext
    pub fn marker(&self) -> RsaBigInt {
        (RsaBigInt::from(1u8) << self.window_bits) - 1u8
    }
}

/// Smallest multiple of 8 strictly greater than `window_bits`
pub fn unified_width(window_bits: usize) -> usize {
    (window_bits / 8 + 1) * 8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_for_small_modulus() {
        let layout = BlockLayout::new(&from_u64(55), BlockScheme::Marked).unwrap();
        assert_eq!(layout.window_bits, 5);
        assert_eq!(layout.unified_bits, 8);
        assert_eq!(layout.block_bytes, 1);
        assert_eq!(layout.marker(), from_u64(0b11111));
    }

    #[test]
    fn test_unified_width_is_strictly_wider() {
        assert_eq!(unified_width(1), 8);
        assert_eq!(unified_width(7), 8);
        assert_eq!(unified_width(8), 16);
        assert_eq!(unified_width(13), 16);
        assert_eq!(unified_width(16), 24);
    }

    #[test]
    fn test_preconditions() {
        assert_eq!(
            BlockLayout::new(&from_u64(0), BlockScheme::Unified),
            Err(RsaError::InvalidModulus)
        );
        assert_eq!(
            BlockLayout::new(&from_u64(1), BlockScheme::Marked),
            Err(RsaError::ModulusTooSmall { modulus: from_u64(1), minimum: 2 })
        );
        assert_eq!(
            BlockLayout::new(&from_u64(221), BlockScheme::Bytewise),
            Err(RsaError::ModulusTooSmall { modulus: from_u64(221), minimum: 256 })
        );
        assert!(BlockLayout::new(&from_u64(323), BlockScheme::Bytewise).is_ok());
    }
}
