//! This crate implements the Paillier additively homomorphic cryptosystem
//! and a privacy-preserving threshold balance check built on it.
//!
//! Based on:
//! [Paillier, 1999](https://link.springer.com/chapter/10.1007/3-540-48910-X_16)
//! Three honest-but-curious roles take part: a Client holding the key pair
//! and a threshold, a Bank encrypting its account balances, and a Verifier
//! who learns only whether the summed balances reach the threshold, never
//! the balances or the gap.
//!
//! # Example
//! ```no_run
//! use num_bigint::BigInt;
//! use paillier_balance_check::protocol::{run_threshold_check, Deployment, Verdict};
//!
//! let balances = vec![BigInt::from(10000), BigInt::from(15000)];
//! let verdict = run_threshold_check(
//!     512,
//!     64,
//!     balances,
//!     BigInt::from(20000),
//!     Deployment::VerifierDecrypts,
//! )
//! .unwrap();
//! assert_eq!(verdict, Verdict::Pass);
//! ```

pub mod aggregate;
pub mod decryption_key;
pub mod encryption_key;
pub mod functions;
pub mod keygen;
pub mod protocol;
pub mod wire;

pub use aggregate::{scale, sum_account_pairs, sum_ciphertexts, sum_plaintexts, AggregationError};
pub use decryption_key::DecryptionKey;
pub use encryption_key::{CryptoError, EncryptionKey};
pub use keygen::{KeyGenError, KeyPair};
pub use protocol::{
    run_threshold_check, Bank, Client, Deployment, ProtocolError, ThresholdRun, Verdict, Verifier,
    VerifierKey,
};
pub use wire::{CipherBundle, WireError};
