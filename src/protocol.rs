//! The threshold-comparison protocol between three honest-but-curious
//! roles: a Client who owns the keys and the threshold, a Bank whose
//! account balances must stay encrypted, and a Verifier who learns only
//! whether the summed balances reach the threshold.
//!
//! The comparison works on residues modulo n: the encrypted difference
//! `sum - threshold` decrypts either to the true non-negative gap or, when
//! the balances fall short, to `n + gap`, a residue just below n. Scaling
//! the encrypted difference by a small positive mask hides the magnitude of
//! the gap from the Verifier while preserving which side of the boundary
//! the residue lands on.

use num_bigint::BigInt;
use num_traits::One;
use rand::rngs::OsRng;
use rand::Rng;
use thiserror::Error;

use crate::aggregate::{scale, sum_account_pairs, AggregationError};
use crate::decryption_key::DecryptionKey;
use crate::encryption_key::{CryptoError, EncryptionKey};
use crate::functions::{mod_inverse, random_mod, FunctionError};
use crate::keygen::{KeyGenError, KeyPair};

/// Masks are drawn from [1, 2^MASK_BITS]. Keeping them small keeps the
/// masked gap far below the wraparound boundary.
const MASK_BITS: usize = 16;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("key generation failed: {0}")]
    KeyGen(#[from] KeyGenError),
    #[error("encryption failed: {0}")]
    Crypto(#[from] CryptoError),
    #[error("aggregation failed: {0}")]
    Aggregation(#[from] AggregationError),
    #[error("random number generation failed: {0}")]
    Random(#[from] FunctionError),
    #[error("threshold ciphertext is not invertible modulo n^2")]
    ThresholdNotInvertible,
    #[error("protocol step out of order: expected state {expected:?}, found {found:?}")]
    OutOfOrder { expected: State, found: State },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
}

/// Who performs the final decryption. `VerifierDecrypts` hands lambda to
/// the Verifier, matching the original deployment; `ClientDecrypts` keeps
/// the private exponent with the key holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deployment {
    VerifierDecrypts,
    ClientDecrypts,
}

/// The bundle a Verifier needs to decrypt on its own. Note that lambda is
/// private key material; sending it is the chosen trust boundary of the
/// verifier-decrypts deployment, not an oversight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierKey {
    pub lambda: BigInt,
    pub g: BigInt,
    pub n: BigInt,
}

/// Largest residue still read as a non-negative difference. Anything above
/// n/2 can only be a wrapped negative: legitimate balances, thresholds and
/// masked gaps are vanishingly small next to a several-hundred-bit n.
pub fn boundary(n: &BigInt) -> BigInt {
    n >> 1
}

pub fn classify(residue: &BigInt, n: &BigInt) -> Verdict {
    if residue > &boundary(n) {
        Verdict::Fail
    } else {
        Verdict::Pass
    }
}

/// Maps a decrypted residue back to a signed difference for client-side
/// diagnostics. Never part of the Verifier surface.
pub fn signed_residue(residue: &BigInt, n: &BigInt) -> BigInt {
    if residue > &boundary(n) {
        residue - n
    } else {
        residue.clone()
    }
}

/// The key holder. Generates the key pair, chooses the threshold and
/// samples the mask; private components never leave this role.
pub struct Client {
    keys: KeyPair,
    threshold: BigInt,
    mask: BigInt,
}

impl Client {
    pub fn new(
        bit_length: usize,
        certainty: u32,
        threshold: BigInt,
    ) -> Result<Self, ProtocolError> {
        let keys = KeyPair::generate(bit_length, certainty)?;
        let upper = BigInt::from(1) << MASK_BITS;
        let mask = random_mod(&upper, &mut OsRng)? + BigInt::one();
        Ok(Client {
            keys,
            threshold,
            mask,
        })
    }

    pub fn public_key(&self) -> &EncryptionKey {
        self.keys.public()
    }

    pub fn verifier_key(&self) -> VerifierKey {
        VerifierKey {
            lambda: self.keys.decryption_key().lambda().clone(),
            g: self.keys.public().g().clone(),
            n: self.keys.public().n().clone(),
        }
    }

    pub fn threshold(&self) -> &BigInt {
        &self.threshold
    }

    pub fn mask(&self) -> &BigInt {
        &self.mask
    }

    pub fn encrypt_threshold(&self) -> Result<BigInt, ProtocolError> {
        Ok(self.keys.public().encrypt(&self.threshold)?)
    }

    pub fn encrypt_mask(&self) -> Result<BigInt, ProtocolError> {
        Ok(self.keys.public().encrypt(&self.mask)?)
    }

    /// Decryption path for the client-decrypts deployment.
    pub fn decrypt(&self, c: &BigInt) -> Result<BigInt, ProtocolError> {
        Ok(self.keys.decryption_key().decrypt(c)?)
    }
}

/// The data holder. Receives the public key, never any private component;
/// balances come in (checking, savings) pairs per account.
pub struct Bank {
    key: EncryptionKey,
    balances: Vec<BigInt>,
}

impl Bank {
    pub fn new(key: EncryptionKey, balances: Vec<BigInt>) -> Self {
        Bank { key, balances }
    }

    /// Demo fixture: `accounts` accounts with uniformly drawn checking and
    /// savings balances in `[min, max]`.
    pub fn with_random_accounts(key: EncryptionKey, min: u64, max: u64, accounts: usize) -> Self {
        let mut rng = OsRng;
        let mut balances = Vec::with_capacity(accounts * 2);
        for _ in 0..accounts {
            let checking = rng.gen_range(min..=max);
            let savings = rng.gen_range(min..=max);
            balances.push(BigInt::from(checking));
            balances.push(BigInt::from(savings));
        }
        Bank { key, balances }
    }

    pub fn balances(&self) -> &[BigInt] {
        &self.balances
    }

    pub fn encrypt_balances(&self) -> Result<Vec<BigInt>, ProtocolError> {
        let mut ciphertexts = Vec::with_capacity(self.balances.len());
        for balance in &self.balances {
            ciphertexts.push(self.key.encrypt(balance)?);
        }
        Ok(ciphertexts)
    }
}

/// The judging role. Holds a rebuilt decryption key in the
/// verifier-decrypts deployment and sees only the masked residue.
pub struct Verifier {
    key: DecryptionKey,
}

impl Verifier {
    pub fn new(bundle: VerifierKey) -> Result<Self, ProtocolError> {
        let key = DecryptionKey::from_parts(bundle.lambda, bundle.g, bundle.n)?;
        Ok(Verifier { key })
    }

    pub fn decrypt(&self, cipher_result: &BigInt) -> Result<BigInt, ProtocolError> {
        Ok(self.key.decrypt(cipher_result)?)
    }

    pub fn verdict(&self, cipher_result: &BigInt) -> Result<Verdict, ProtocolError> {
        let residue = self.key.decrypt(cipher_result)?;
        Ok(classify(&residue, self.key.public().n()))
    }
}

/// Combination step run on ciphertexts only: fold the balances, divide out
/// the threshold ciphertext, then raise to the mask.
///
/// `decrypt(result) == mask * (sum(balances) - threshold) mod n`.
pub fn combine(
    key: &EncryptionKey,
    cipher_balances: &[BigInt],
    cipher_threshold: &BigInt,
    mask: &BigInt,
) -> Result<BigInt, ProtocolError> {
    let cipher_sum = sum_account_pairs(key, cipher_balances)?;
    let threshold_inv =
        mod_inverse(cipher_threshold, key.n_squared()).ok_or(ProtocolError::ThresholdNotInvertible)?;
    let cipher_diff = (cipher_sum * threshold_inv) % key.n_squared();
    Ok(scale(key, &cipher_diff, mask)?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    KeysGenerated,
    BalancesEncrypted,
    SumAggregated,
    DifferenceComputed,
    MaskApplied,
    Decrypted,
    VerdictIssued,
}

/// One protocol run, stepping through its states in order. Each step
/// consumes the output of the previous one; calling a step from the wrong
/// state is an error, and `VerdictIssued` is terminal.
pub struct ThresholdRun {
    client: Client,
    deployment: Deployment,
    state: State,
    cipher_balances: Vec<BigInt>,
    cipher_threshold: Option<BigInt>,
    cipher_sum: Option<BigInt>,
    cipher_diff: Option<BigInt>,
    cipher_result: Option<BigInt>,
    residue: Option<BigInt>,
}

impl ThresholdRun {
    pub fn new(client: Client, deployment: Deployment) -> Self {
        ThresholdRun {
            client,
            deployment,
            state: State::KeysGenerated,
            cipher_balances: Vec::new(),
            cipher_threshold: None,
            cipher_sum: None,
            cipher_diff: None,
            cipher_result: None,
            residue: None,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn require(&self, expected: State) -> Result<(), ProtocolError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ProtocolError::OutOfOrder {
                expected,
                found: self.state,
            })
        }
    }

    /// Takes the Bank's ciphertext list; the Client encrypts its threshold
    /// alongside.
    pub fn receive_balances(&mut self, cipher_balances: Vec<BigInt>) -> Result<(), ProtocolError> {
        self.require(State::KeysGenerated)?;
        self.cipher_threshold = Some(self.client.encrypt_threshold()?);
        self.cipher_balances = cipher_balances;
        self.state = State::BalancesEncrypted;
        Ok(())
    }

    pub fn aggregate(&mut self) -> Result<&BigInt, ProtocolError> {
        self.require(State::BalancesEncrypted)?;
        let sum = sum_account_pairs(self.client.public_key(), &self.cipher_balances)?;
        self.state = State::SumAggregated;
        Ok(self.cipher_sum.insert(sum))
    }

    pub fn compute_difference(&mut self) -> Result<&BigInt, ProtocolError> {
        self.require(State::SumAggregated)?;
        let diff = {
            let key = self.client.public_key();
            let cipher_sum = self.cipher_sum.as_ref().ok_or(ProtocolError::OutOfOrder {
                expected: State::SumAggregated,
                found: self.state,
            })?;
            let cipher_threshold =
                self.cipher_threshold
                    .as_ref()
                    .ok_or(ProtocolError::OutOfOrder {
                        expected: State::SumAggregated,
                        found: self.state,
                    })?;
            let threshold_inv = mod_inverse(cipher_threshold, key.n_squared())
                .ok_or(ProtocolError::ThresholdNotInvertible)?;
            (cipher_sum * threshold_inv) % key.n_squared()
        };
        self.state = State::DifferenceComputed;
        Ok(self.cipher_diff.insert(diff))
    }

    pub fn apply_mask(&mut self) -> Result<&BigInt, ProtocolError> {
        self.require(State::DifferenceComputed)?;
        let masked = {
            let cipher_diff = self.cipher_diff.as_ref().ok_or(ProtocolError::OutOfOrder {
                expected: State::DifferenceComputed,
                found: self.state,
            })?;
            scale(self.client.public_key(), cipher_diff, self.client.mask())?
        };
        self.state = State::MaskApplied;
        Ok(self.cipher_result.insert(masked))
    }

    pub fn decrypt(&mut self) -> Result<(), ProtocolError> {
        self.require(State::MaskApplied)?;
        let cipher_result = self.cipher_result.as_ref().ok_or(ProtocolError::OutOfOrder {
            expected: State::MaskApplied,
            found: self.state,
        })?;
        let residue = match self.deployment {
            Deployment::VerifierDecrypts => {
                let verifier = Verifier::new(self.client.verifier_key())?;
                verifier.decrypt(cipher_result)?
            }
            Deployment::ClientDecrypts => self.client.decrypt(cipher_result)?,
        };
        self.residue = Some(residue);
        self.state = State::Decrypted;
        Ok(())
    }

    pub fn issue_verdict(&mut self) -> Result<Verdict, ProtocolError> {
        self.require(State::Decrypted)?;
        let residue = self.residue.as_ref().ok_or(ProtocolError::OutOfOrder {
            expected: State::Decrypted,
            found: self.state,
        })?;
        let verdict = classify(residue, self.client.public_key().n());
        self.state = State::VerdictIssued;
        Ok(verdict)
    }
}

/// Drives a whole run: key generation through verdict.
pub fn run_threshold_check(
    bit_length: usize,
    certainty: u32,
    balances: Vec<BigInt>,
    threshold: BigInt,
    deployment: Deployment,
) -> Result<Verdict, ProtocolError> {
    let client = Client::new(bit_length, certainty, threshold)?;
    let bank = Bank::new(client.public_key().clone(), balances);
    let mut run = ThresholdRun::new(client, deployment);
    run.receive_balances(bank.encrypt_balances()?)?;
    run.aggregate()?;
    run.compute_difference()?;
    run.apply_mask()?;
    run.decrypt()?;
    run.issue_verdict()
}
