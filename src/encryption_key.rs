use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Zero};
use thiserror::Error;

use crate::functions::{random_int, FunctionError};

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("plaintext out of range [0, n)")]
    InvalidPlaintext,
    #[error("blinding factor is not invertible modulo n")]
    InvalidRandomness,
    #[error("ciphertext out of range [0, n^2)")]
    InvalidCiphertext,
    #[error("decryption failed: modular inverse does not exist")]
    DecryptionFailed,
    #[error("random number generation failed: {0}")]
    RandomNumber(#[from] FunctionError),
}

/// The public half of a Paillier key pair. Safe to copy across role
/// boundaries; holds no secret material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionKey {
    n: BigInt,
    n_squared: BigInt,
    g: BigInt,
    bit_length: usize,
}

impl EncryptionKey {
    pub(crate) fn new(n: BigInt, n_squared: BigInt, g: BigInt, bit_length: usize) -> Self {
        EncryptionKey {
            n,
            n_squared,
            g,
            bit_length,
        }
    }

    /// Rebuilds a public key from transmitted `(g, n)` components, as a role
    /// that did not generate the keys receives them.
    pub fn from_parts(g: BigInt, n: BigInt) -> Self {
        let n_squared = &n * &n;
        let bit_length = n.bits() as usize;
        EncryptionKey {
            n,
            n_squared,
            g,
            bit_length,
        }
    }

    pub fn n(&self) -> &BigInt {
        &self.n
    }

    pub fn n_squared(&self) -> &BigInt {
        &self.n_squared
    }

    pub fn g(&self) -> &BigInt {
        &self.g
    }

    pub fn bit_length(&self) -> usize {
        self.bit_length
    }

    /// Encrypts `m`, sampling the blinding factor internally. A sampled `r`
    /// that is not invertible modulo n is discarded and redrawn.
    pub fn encrypt(&self, m: &BigInt) -> Result<BigInt, CryptoError> {
        if m < &BigInt::zero() || m >= &self.n {
            return Err(CryptoError::InvalidPlaintext);
        }
        let r = loop {
            let r = random_int(self.bit_length)?;
            if r > BigInt::zero() && r.gcd(&self.n) == BigInt::one() {
                break r;
            }
        };
        Ok(self.raw_encrypt(m, &r))
    }

    /// Encrypts `m` with a caller-supplied blinding factor,
    /// c = g^m * r^n mod n^2. Requires `0 <= m < n` and `gcd(r, n) = 1`.
    pub fn encrypt_with_randomness(&self, m: &BigInt, r: &BigInt) -> Result<BigInt, CryptoError> {
        if m < &BigInt::zero() || m >= &self.n {
            return Err(CryptoError::InvalidPlaintext);
        }
        if r <= &BigInt::zero() || r.gcd(&self.n) != BigInt::one() {
            return Err(CryptoError::InvalidRandomness);
        }
        Ok(self.raw_encrypt(m, r))
    }

    fn raw_encrypt(&self, m: &BigInt, r: &BigInt) -> BigInt {
        let g_to_m = self.g.modpow(m, &self.n_squared);
        let r_to_n = r.modpow(&self.n, &self.n_squared);
        (g_to_m * r_to_n) % &self.n_squared
    }
}
