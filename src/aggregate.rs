use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Zero};
use thiserror::Error;

use crate::encryption_key::EncryptionKey;

#[derive(Error, Debug)]
pub enum AggregationError {
    #[error("empty ciphertext list")]
    EmptyCiphertextList,
    #[error("account ciphertext list has odd length: {0}")]
    OddAccountList(usize),
    #[error("ciphertext {0} out of bounds")]
    CiphertextOutOfBounds(usize),
    #[error("scalar must be positive")]
    NonPositiveScalar,
}

/// Folds a list of ciphertexts produced under `key` into one ciphertext of
/// the modular sum of their plaintexts: the product modulo n^2, starting
/// from the multiplicative identity. Multiplication modulo n^2 is
/// commutative and associative, so the order of the list does not matter.
pub fn sum_ciphertexts(
    key: &EncryptionKey,
    ciphertexts: &[BigInt],
) -> Result<BigInt, AggregationError> {
    if ciphertexts.is_empty() {
        return Err(AggregationError::EmptyCiphertextList);
    }
    let mut sum = BigInt::one();
    for (i, c) in ciphertexts.iter().enumerate() {
        if c < &BigInt::zero() || c >= key.n_squared() {
            return Err(AggregationError::CiphertextOutOfBounds(i));
        }
        sum = (&sum * c) % key.n_squared();
    }
    Ok(sum)
}

/// The paired-account variant: balances arrive as (checking, savings)
/// couples, so the list must have even length.
pub fn sum_account_pairs(
    key: &EncryptionKey,
    ciphertexts: &[BigInt],
) -> Result<BigInt, AggregationError> {
    if ciphertexts.len() % 2 != 0 {
        return Err(AggregationError::OddAccountList(ciphertexts.len()));
    }
    sum_ciphertexts(key, ciphertexts)
}

/// Plaintext scalar multiplication under encryption: c^k mod n^2 decrypts
/// to k times the plaintext of c. Used to mask a comparison result.
pub fn scale(key: &EncryptionKey, c: &BigInt, k: &BigInt) -> Result<BigInt, AggregationError> {
    if c < &BigInt::zero() || c >= key.n_squared() {
        return Err(AggregationError::CiphertextOutOfBounds(0));
    }
    if k <= &BigInt::zero() {
        return Err(AggregationError::NonPositiveScalar);
    }
    Ok(c.modpow(k, key.n_squared()))
}

/// Plain modular sum of plaintexts; the local cross-check for the
/// homomorphic path, never transmitted.
pub fn sum_plaintexts(plaintexts: &[BigInt], n: &BigInt) -> BigInt {
    let sum: BigInt = plaintexts.iter().sum();
    sum.mod_floor(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keygen::KeyPair;

    const TEST_BITLEN: usize = 256;
    const TEST_C: u32 = 40;

    fn test_key() -> KeyPair {
        KeyPair::generate(TEST_BITLEN, TEST_C).expect("key generation failed")
    }

    fn encrypt_all(key: &KeyPair, values: &[u64]) -> Vec<BigInt> {
        values
            .iter()
            .map(|v| key.public().encrypt(&BigInt::from(*v)).unwrap())
            .collect()
    }

    #[test]
    fn test_sum_matches_plaintext_sum() {
        let keys = test_key();
        let values = [10000u64, 15000, 5000, 4000];
        let ciphertexts = encrypt_all(&keys, &values);
        let cipher_sum = sum_ciphertexts(keys.public(), &ciphertexts).unwrap();
        let decrypted = keys.decryption_key().decrypt(&cipher_sum).unwrap();
        let plaintexts: Vec<BigInt> = values.iter().map(|v| BigInt::from(*v)).collect();
        assert_eq!(decrypted, sum_plaintexts(&plaintexts, keys.public().n()));
    }

    #[test]
    fn test_sum_is_order_independent() {
        let keys = test_key();
        let ciphertexts = encrypt_all(&keys, &[1, 2, 3, 4, 5, 6]);
        let forward = sum_ciphertexts(keys.public(), &ciphertexts).unwrap();
        let mut reversed = ciphertexts.clone();
        reversed.reverse();
        assert_eq!(forward, sum_ciphertexts(keys.public(), &reversed).unwrap());
        let mut rotated = ciphertexts;
        rotated.rotate_left(2);
        assert_eq!(forward, sum_ciphertexts(keys.public(), &rotated).unwrap());
    }

    #[test]
    fn test_sum_rejects_empty_list() {
        let keys = test_key();
        assert!(matches!(
            sum_ciphertexts(keys.public(), &[]),
            Err(AggregationError::EmptyCiphertextList)
        ));
    }

    #[test]
    fn test_sum_rejects_out_of_bounds() {
        let keys = test_key();
        let mut ciphertexts = encrypt_all(&keys, &[1, 2]);
        ciphertexts.push(keys.public().n_squared().clone());
        assert!(matches!(
            sum_ciphertexts(keys.public(), &ciphertexts),
            Err(AggregationError::CiphertextOutOfBounds(2))
        ));
    }

    #[test]
    fn test_account_pairs_reject_odd_list() {
        let keys = test_key();
        let ciphertexts = encrypt_all(&keys, &[1, 2, 3]);
        assert!(matches!(
            sum_account_pairs(keys.public(), &ciphertexts),
            Err(AggregationError::OddAccountList(3))
        ));
        assert!(sum_account_pairs(keys.public(), &ciphertexts[..2]).is_ok());
    }

    #[test]
    fn test_scale_decrypts_to_multiple() {
        let keys = test_key();
        let m = BigInt::from(250);
        let k = BigInt::from(17);
        let c = keys.public().encrypt(&m).unwrap();
        let scaled = scale(keys.public(), &c, &k).unwrap();
        assert_eq!(
            keys.decryption_key().decrypt(&scaled).unwrap(),
            (&m * &k) % keys.public().n()
        );
    }

    #[test]
    fn test_scale_rejects_nonpositive_scalar() {
        let keys = test_key();
        let c = keys.public().encrypt(&BigInt::from(1)).unwrap();
        assert!(matches!(
            scale(keys.public(), &c, &BigInt::zero()),
            Err(AggregationError::NonPositiveScalar)
        ));
        assert!(matches!(
            scale(keys.public(), &c, &BigInt::from(-3)),
            Err(AggregationError::NonPositiveScalar)
        ));
    }

    #[test]
    fn test_sum_plaintexts_reduces_mod_n() {
        let n = BigInt::from(100);
        let values = [BigInt::from(60), BigInt::from(70)];
        assert_eq!(sum_plaintexts(&values, &n), BigInt::from(30));
    }
}
