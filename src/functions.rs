use num_bigint::{BigInt, Sign};
use num_traits::{One, Zero};
use rand::{rngs::OsRng, RngCore};
use rug::{integer::Order, rand::RandState, Integer};
use std::convert::TryInto;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FunctionError {
    #[error("random number generation failed")]
    RandomNumberGeneration,
    #[error("invalid bit length")]
    InvalidBitLength,
}

pub fn random_int(bits: usize) -> Result<BigInt, FunctionError> {
    let max = BigInt::from(1) << bits;
    random_mod(&max, &mut rand::rngs::OsRng)
}

pub fn random_mod(n: &BigInt, rng: &mut impl RngCore) -> Result<BigInt, FunctionError> {
    if n <= &BigInt::zero() {
        return Err(FunctionError::RandomNumberGeneration);
    }
    let mut bytes = vec![0u8; (n.bits() as usize + 7) / 8];
    let mut result;
    loop {
        rng.fill_bytes(&mut bytes);
        result = BigInt::from_bytes_be(Sign::Plus, &bytes);
        if result < *n {
            break;
        }
    }
    Ok(result)
}

/// Generates a probable prime of exactly `bit_len` bits with error
/// probability at most `2^-certainty` (each Miller-Rabin round contributes
/// a factor of 1/4).
pub fn generate_prime(bit_len: usize, certainty: u32) -> Result<BigInt, FunctionError> {
    if bit_len < 2 {
        return Err(FunctionError::InvalidBitLength);
    }
    let bit_len_u32 =
        TryInto::<u32>::try_into(bit_len).map_err(|_| FunctionError::InvalidBitLength)?;
    let reps = ((certainty + 1) / 2).max(1);
    let mut seed = [0u8; 32];
    OsRng.fill_bytes(&mut seed);
    let mut rand_state = RandState::new();
    rand_state.seed(&Integer::from_digits(&seed, Order::Msf));
    loop {
        let mut candidate: Integer = Integer::random_bits(bit_len_u32, &mut rand_state).into();
        candidate.set_bit(bit_len_u32 - 1, true);
        candidate.set_bit(0, true);
        if candidate.is_probably_prime(reps) != rug::integer::IsPrime::No {
            return Ok(BigInt::from_bytes_be(
                Sign::Plus,
                &candidate.to_digits::<u8>(Order::Msf),
            ));
        }
    }
}

/// The Paillier L function, L(x) = (x - 1) / n. The division is exact for
/// every x produced by exponentiation to lambda modulo n^2.
pub fn l_function(x: &BigInt, n: &BigInt) -> BigInt {
    (x - BigInt::one()) / n
}

pub fn mod_inverse(a: &BigInt, m: &BigInt) -> Option<BigInt> {
    a.modinv(m)
}
