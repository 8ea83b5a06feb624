use num_bigint::BigInt;
use num_traits::Zero;
use zeroize::Zeroize;

use crate::encryption_key::{CryptoError, EncryptionKey};
use crate::functions::{l_function, mod_inverse};

/// The private half of a Paillier key pair: lambda together with the
/// precomputed decryption factor mu = L(g^lambda mod n^2)^-1 mod n.
#[derive(Debug, Clone)]
pub struct DecryptionKey {
    lambda: BigInt,
    mu: BigInt,
    public: EncryptionKey,
}

impl Zeroize for DecryptionKey {
    fn zeroize(&mut self) {
        self.lambda = BigInt::zero();
        self.mu = BigInt::zero();
        // the public key is not sensitive
    }
}

impl Drop for DecryptionKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl DecryptionKey {
    pub(crate) fn new(lambda: BigInt, public: EncryptionKey) -> Result<Self, CryptoError> {
        let g_to_lambda = public.g().modpow(&lambda, public.n_squared());
        let mu = mod_inverse(&l_function(&g_to_lambda, public.n()), public.n())
            .ok_or(CryptoError::DecryptionFailed)?;
        Ok(DecryptionKey { lambda, mu, public })
    }

    /// Rebuilds a decryption key from a transmitted `(lambda, g, n)` bundle.
    /// Fails when the components do not belong together (mu does not exist).
    pub fn from_parts(lambda: BigInt, g: BigInt, n: BigInt) -> Result<Self, CryptoError> {
        DecryptionKey::new(lambda, EncryptionKey::from_parts(g, n))
    }

    pub fn public(&self) -> &EncryptionKey {
        &self.public
    }

    pub fn lambda(&self) -> &BigInt {
        &self.lambda
    }

    /// Decrypts `c`, m = L(c^lambda mod n^2) * mu mod n.
    /// Requires `0 <= c < n^2`.
    pub fn decrypt(&self, c: &BigInt) -> Result<BigInt, CryptoError> {
        if c < &BigInt::zero() || c >= self.public.n_squared() {
            return Err(CryptoError::InvalidCiphertext);
        }
        let c_to_lambda = c.modpow(&self.lambda, self.public.n_squared());
        Ok(l_function(&c_to_lambda, self.public.n()) * &self.mu % self.public.n())
    }
}
