//! Textual exchange formats crossing role boundaries. All fields are
//! positional, so the ordering is part of the format and is versioned.
//!
//! Ciphertext bundle, version 1, comma-separated decimal fields:
//!
//! ```text
//! 1,c_1,...,c_k,n,cipher_threshold,cipher_mask
//! ```
//!
//! with the leading version field, then the ciphertext list, then the
//! public modulus, the threshold ciphertext and the mask ciphertext.
//!
//! Verifier key bundle: `lambda,g,n`, three decimal fields.
//!
//! Balance files are line oriented, one decimal integer per line, order
//! preserving; blank lines are skipped.

use num_bigint::BigInt;
use thiserror::Error;

use crate::protocol::VerifierKey;

pub const BUNDLE_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum WireError {
    #[error("line {0} is not a decimal integer: {1:?}")]
    InvalidBalance(usize, String),
    #[error("field {0} is not a decimal integer: {1:?}")]
    InvalidField(usize, String),
    #[error("unsupported bundle version: {0:?}")]
    UnsupportedVersion(String),
    #[error("bundle has {got} fields, expected at least {expected}")]
    TooFewFields { expected: usize, got: usize },
    #[error("verifier key bundle has {0} fields, expected 3")]
    WrongKeyFieldCount(usize),
}

/// Parses a balance file: one decimal integer per line, file order
/// preserved. Rejected before anything reaches the core.
pub fn parse_balances(text: &str) -> Result<Vec<BigInt>, WireError> {
    let mut balances = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value = line
            .parse::<BigInt>()
            .map_err(|_| WireError::InvalidBalance(i + 1, line.to_string()))?;
        balances.push(value);
    }
    Ok(balances)
}

/// Everything the combination step needs, in transit between the Bank/
/// Client side and the aggregating party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherBundle {
    pub ciphertexts: Vec<BigInt>,
    pub n: BigInt,
    pub cipher_threshold: BigInt,
    pub cipher_mask: BigInt,
}

impl CipherBundle {
    pub fn encode(&self) -> String {
        let mut fields = Vec::with_capacity(self.ciphertexts.len() + 4);
        fields.push(BUNDLE_VERSION.to_string());
        for c in &self.ciphertexts {
            fields.push(c.to_string());
        }
        fields.push(self.n.to_string());
        fields.push(self.cipher_threshold.to_string());
        fields.push(self.cipher_mask.to_string());
        fields.join(",")
    }

    pub fn decode(text: &str) -> Result<Self, WireError> {
        let fields: Vec<&str> = text.split(',').map(str::trim).collect();
        // version + at least one ciphertext + the three trailing fields
        if fields.len() < 5 {
            return Err(WireError::TooFewFields {
                expected: 5,
                got: fields.len(),
            });
        }
        if fields[0] != BUNDLE_VERSION.to_string() {
            return Err(WireError::UnsupportedVersion(fields[0].to_string()));
        }
        let parsed = fields
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, f)| {
                f.parse::<BigInt>()
                    .map_err(|_| WireError::InvalidField(i + 1, f.to_string()))
            })
            .collect::<Result<Vec<BigInt>, WireError>>()?;
        let mut parsed = parsed;
        let cipher_mask = parsed.pop().ok_or(WireError::TooFewFields {
            expected: 5,
            got: fields.len(),
        })?;
        let cipher_threshold = parsed.pop().ok_or(WireError::TooFewFields {
            expected: 5,
            got: fields.len(),
        })?;
        let n = parsed.pop().ok_or(WireError::TooFewFields {
            expected: 5,
            got: fields.len(),
        })?;
        Ok(CipherBundle {
            ciphertexts: parsed,
            n,
            cipher_threshold,
            cipher_mask,
        })
    }
}

/// `lambda,g,n` as decimal strings. Lambda is private key material; the
/// verifier-decrypts deployment sends it anyway, by design.
pub fn encode_verifier_key(key: &VerifierKey) -> String {
    format!("{},{},{}", key.lambda, key.g, key.n)
}

pub fn decode_verifier_key(text: &str) -> Result<VerifierKey, WireError> {
    let fields: Vec<&str> = text.split(',').map(str::trim).collect();
    if fields.len() != 3 {
        return Err(WireError::WrongKeyFieldCount(fields.len()));
    }
    let mut parsed = fields
        .iter()
        .enumerate()
        .map(|(i, f)| {
            f.parse::<BigInt>()
                .map_err(|_| WireError::InvalidField(i + 1, f.to_string()))
        })
        .collect::<Result<Vec<BigInt>, WireError>>()?;
    let n = parsed.pop().ok_or(WireError::WrongKeyFieldCount(0))?;
    let g = parsed.pop().ok_or(WireError::WrongKeyFieldCount(1))?;
    let lambda = parsed.pop().ok_or(WireError::WrongKeyFieldCount(2))?;
    Ok(VerifierKey { lambda, g, n })
}
