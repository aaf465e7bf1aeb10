// RSA Key Generation
// Implements RSA key pair generation from a bounded prime pool

use std::fmt;
use std::str::FromStr;

use num_traits::One;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::bigint::{from_u64, is_prime, RsaBigInt};
use super::block::BlockScheme;
use super::error::{RsaError, RsaResult};
use super::observer::NoopObserver;

/// Upper bound of the prime pool used by [`generate_keypair`]
pub const PRIME_LIMIT: u64 = 100;

/// RSA key: an exponent together with the shared modulus.
/// Public keys hold `(e, n)`, private keys `(d, n)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaKey {
    pub exponent: RsaBigInt,
    pub modulus: RsaBigInt,
}

/// RSA Key Pair (both public and private keys)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaKeyPair {
    pub public_key: RsaKey,
    pub private_key: RsaKey,
    pub p: RsaBigInt,
    pub q: RsaBigInt,
}

impl RsaKey {
    pub fn new(exponent: RsaBigInt, modulus: RsaBigInt) -> Self {
        Self { exponent, modulus }
    }

    pub fn from_u64(exponent: u64, modulus: u64) -> Self {
        Self::new(from_u64(exponent), from_u64(modulus))
    }

    /// Encrypt a message using this key as a public key
    pub fn encrypt(&self, plaintext: &[u8], scheme: BlockScheme) -> RsaResult<Vec<u8>> {
        super::encrypt::encrypt_bytes(plaintext, self, scheme, &mut NoopObserver)
    }

    /// Decrypt a ciphertext using this key as a private key
    pub fn decrypt(&self, ciphertext: &[u8], scheme: BlockScheme) -> RsaResult<Vec<u8>> {
        super::decrypt::decrypt_bytes(ciphertext, self, scheme, &mut NoopObserver)
    }
}

/// Key file representation: `"{exponent} {modulus}"`
impl fmt::Display for RsaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.exponent, self.modulus)
    }
}

/// Parses the first line of a key file
impl FromStr for RsaKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.lines().next().unwrap_or_default();
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 2 {
            return Err(format!("expected two integers, found {} fields", parts.len()));
        }

        let parse = |part: &str| {
            part.parse::<RsaBigInt>()
                .map_err(|e| format!("`{part}` is not a non-negative integer: {e}"))
        };
        Ok(Self::new(parse(parts[0])?, parse(parts[1])?))
    }
}

impl RsaKeyPair {
    /// Build a key pair from two distinct primes and a public exponent,
    /// searching for the private exponent
    pub fn from_primes(p: RsaBigInt, q: RsaBigInt, e: RsaBigInt) -> RsaResult<Self> {
        if p == q {
            return Err(RsaError::InvalidKeyParameters(format!("p and q must differ, both are {p}")));
        }
        if !is_prime(&p) || !is_prime(&q) {
            return Err(RsaError::InvalidKeyParameters(format!("p={p} and q={q} must be prime")));
        }

        // Step 1: Compute n = p * q
        let n = &p * &q;

        // Step 2: Compute φ(n) = (p-1)(q-1)
        let phi = (&p - 1u8) * (&q - 1u8);
        log::debug!("p = {p}, q = {q}, n = {n}, φ(n) = {phi}");

        if e <= RsaBigInt::one() || e >= phi {
            return Err(RsaError::InvalidKeyParameters(format!("e={e} must lie in (1, {phi})")));
        }

        // Step 3: Find d with d * e ≡ 1 (mod φ(n))
        let d = find_private_exponent(&e, &phi)?;
        log::debug!("e = {e}, d = {d}");

        Ok(RsaKeyPair {
            public_key: RsaKey::new(e, n.clone()),
            private_key: RsaKey::new(d, n),
            p,
            q,
        })
    }

    /// Euler's totient of the modulus
    pub fn phi(&self) -> RsaBigInt {
        (&self.p - 1u8) * (&self.q - 1u8)
    }

    pub fn modulus(&self) -> &RsaBigInt {
        &self.public_key.modulus
    }
}

/// Primes in `[2, limit]`, each candidate tested against the primes already found
pub fn prime_pool(limit: u64) -> Vec<u64> {
    let mut primes: Vec<u64> = Vec::new();
    for candidate in 2..=limit {
        if primes.iter().all(|prime| candidate % prime != 0) {
            primes.push(candidate);
        }
    }
    primes
}

/// Smallest d in `[2, φ)` with `d * e mod φ = 1`, found by linear search
pub fn find_private_exponent(e: &RsaBigInt, phi: &RsaBigInt) -> RsaResult<RsaBigInt> {
    let one = RsaBigInt::one();
    let mut d = from_u64(2);
    while &d < phi {
        if (&d * e) % phi == one {
            return Ok(d);
        }
        d += 1u8;
    }

    Err(RsaError::NoInverseFound {
        e: e.clone(),
        phi: phi.clone(),
    })
}

/// Generate an RSA key pair from the primes below [`PRIME_LIMIT`].
/// The same seed always yields the same key pair; `None` seeds from the OS.
pub fn generate_keypair(seed: Option<u64>) -> RsaResult<RsaKeyPair> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    generate_keypair_with(&mut rng, PRIME_LIMIT)
}

/// Generate an RSA key pair from the primes in `[2, limit]` using `rng`
pub fn generate_keypair_with<R: Rng + ?Sized>(rng: &mut R, limit: u64) -> RsaResult<RsaKeyPair> {
    let pool = prime_pool(limit);
    log::debug!("prime pool up to {limit} holds {} primes", pool.len());
    // [2, 3, 5] is the smallest pool with a usable draw (p=2, q=5, e=3)
    if pool.len() < 3 {
        return Err(RsaError::PrimePoolTooSmall { limit });
    }

    loop {
        // Step 1: Draw two distinct primes p and q
        let drawn: Vec<u64> = pool.choose_multiple(rng, 2).copied().collect();
        let (p, q) = (drawn[0], drawn[1]);
        let phi = (p - 1) * (q - 1);

        // Step 2: Pick e among the remaining primes below φ(n) that do not divide it
        let candidates: Vec<u64> = pool
            .iter()
            .copied()
            .filter(|&e| e != p && e != q && e < phi && phi % e != 0)
            .collect();

        match candidates.choose(rng) {
            Some(&e) => return RsaKeyPair::from_primes(from_u64(p), from_u64(q), from_u64(e)),
            None => log::debug!("no exponent candidates for p = {p}, q = {q}, drawing again"),
        }
    }
}
