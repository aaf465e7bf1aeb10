// RSA Big Integer Operations
// Wrapper around num-bigint for RSA-specific operations

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, ToPrimitive, Zero};

use super::error::{RsaError, RsaResult};

/// RSA Big Integer type alias
pub type RsaBigInt = BigUint;

/// Create a big integer from u64
pub fn from_u64(n: u64) -> RsaBigInt {
    RsaBigInt::from(n)
}

/// Modular exponentiation: base^exp mod modulus
/// Uses square-and-multiply algorithm
pub fn mod_pow(base: &RsaBigInt, exp: &RsaBigInt, modulus: &RsaBigInt) -> RsaResult<RsaBigInt> {
    if modulus.is_zero() {
        return Err(RsaError::InvalidModulus);
    }
    if modulus.is_one() {
        return Ok(RsaBigInt::zero());
    }

    let mut result = RsaBigInt::one();
    let mut base = base % modulus;
    let mut exp = exp.clone();

    while !exp.is_zero() {
        if exp.is_odd() {
            result = (&result * &base) % modulus;
        }
        base = (&base * &base) % modulus;
        exp >>= 1;
    }

    Ok(result)
}

/// Number of bits that always hold a value below `modulus`: floor(log2(modulus))
pub fn nominal_width(modulus: &RsaBigInt) -> usize {
    modulus.bits().saturating_sub(1) as usize
}

/// Number of whole bytes needed to store any residue of `modulus`
pub fn byte_width(modulus: &RsaBigInt) -> usize {
    (modulus.bits() as usize + 7) / 8
}

/// Greatest common divisor
pub fn gcd(a: &RsaBigInt, b: &RsaBigInt) -> RsaBigInt {
    a.gcd(b)
}

/// Trial-division primality check, enough for the toy prime pool
pub fn is_prime(n: &RsaBigInt) -> bool {
    let Some(n) = n.to_u64() else {
        return false;
    };
    if n < 2 {
        return false;
    }

    let mut divisor = 2u64;
    while divisor * divisor <= n {
        if n % divisor == 0 {
            return false;
        }
        divisor += 1;
    }
    true
}
