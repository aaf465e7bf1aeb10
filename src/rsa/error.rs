// RSA Errors
// Every failure of key handling, key generation and block framing

use std::path::PathBuf;

use thiserror::Error;

use super::bigint::RsaBigInt;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RsaError {
    #[error("Key file `{}` cannot be read", path.display())]
    KeyFileMissing { path: PathBuf },

    #[error("Key file `{}` is malformed: {reason}", path.display())]
    KeyFileMalformed { path: PathBuf, reason: String },

    #[error("No modular inverse of e={e} modulo φ(n)={phi}")]
    NoInverseFound { e: RsaBigInt, phi: RsaBigInt },

    #[error("Invalid key parameters: {0}")]
    InvalidKeyParameters(String),

    #[error("Prime pool up to {limit} holds too few primes to build a keypair")]
    PrimePoolTooSmall { limit: u64 },

    #[error("Modulus must be greater than zero")]
    InvalidModulus,

    #[error("Modulus {modulus} is too small for this block scheme (minimum {minimum})")]
    ModulusTooSmall { modulus: RsaBigInt, minimum: u32 },

    #[error("Truncated ciphertext: {0}")]
    TruncatedCiphertext(String),

    #[error("Decrypted block #{index} holds {value}, which is not a byte")]
    InvalidBlock { index: usize, value: RsaBigInt },

    #[error("No data to encrypt/decrypt")]
    EmptyInput,
}

pub type RsaResult<T> = Result<T, RsaError>;
