use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Zero};
use thiserror::Error;
use zeroize::Zeroize;

use crate::decryption_key::DecryptionKey;
use crate::encryption_key::EncryptionKey;
use crate::functions::{generate_prime, l_function, FunctionError};

/// Attempts at finding primes for which g = 2 passes the validity check
/// before key generation gives up. The check fails with negligible
/// probability for random primes, so one round is almost always enough.
const MAX_ATTEMPTS: u32 = 16;

#[derive(Error, Debug)]
pub enum KeyGenError {
    #[error("bit length too small: {0} < 64")]
    BitLengthTooSmall(usize),
    #[error("prime generation failed: {0}")]
    PrimeGeneration(#[from] FunctionError),
    #[error("no valid key pair after {0} attempts")]
    AttemptsExhausted(u32),
}

/// A full Paillier key pair. The primes and the derived private exponent
/// stay with whichever role generated them; other roles only ever receive
/// the public components (and, in the verifier-decrypts deployment, lambda).
#[derive(Debug, Clone)]
pub struct KeyPair {
    p: BigInt,
    q: BigInt,
    decryption_key: DecryptionKey,
}

impl Zeroize for KeyPair {
    fn zeroize(&mut self) {
        self.p = BigInt::zero();
        self.q = BigInt::zero();
        self.decryption_key.zeroize();
    }
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl KeyPair {
    /// Generates a key pair with an n of `bit_length` bits, each prime
    /// probable with error at most `2^-certainty`, and g fixed to 2.
    ///
    /// Primes for which the generator check `gcd(L(g^lambda mod n^2), n) = 1`
    /// fails are thrown away and resampled rather than aborting.
    pub fn generate(bit_length: usize, certainty: u32) -> Result<Self, KeyGenError> {
        if bit_length < 64 {
            return Err(KeyGenError::BitLengthTooSmall(bit_length));
        }
        let p_size = (bit_length + 1) / 2;
        let q_size = bit_length - p_size;

        for _ in 0..MAX_ATTEMPTS {
            let p = generate_prime(p_size, certainty)?;
            let q = loop {
                let q = generate_prime(q_size, certainty)?;
                if q != p {
                    break q;
                }
            };

            let n = &p * &q;
            let n_squared = &n * &n;
            let g = BigInt::from(2);
            let lambda = (&p - BigInt::one()).lcm(&(&q - BigInt::one()));

            // g is usable iff L(g^lambda mod n^2) is invertible modulo n
            let l = l_function(&g.modpow(&lambda, &n_squared), &n);
            if l.gcd(&n) != BigInt::one() {
                continue;
            }

            let public = EncryptionKey::new(n, n_squared, g, bit_length);
            match DecryptionKey::new(lambda, public) {
                Ok(decryption_key) => {
                    return Ok(KeyPair {
                        p,
                        q,
                        decryption_key,
                    })
                }
                // inverse vanished despite the gcd check: bad primes, retry
                Err(_) => continue,
            }
        }
        Err(KeyGenError::AttemptsExhausted(MAX_ATTEMPTS))
    }

    pub fn public(&self) -> &EncryptionKey {
        self.decryption_key.public()
    }

    pub fn decryption_key(&self) -> &DecryptionKey {
        &self.decryption_key
    }
}
