use num_bigint::BigInt;
use paillier_balance_check::protocol::{
    classify, combine, Bank, Client, Deployment, ThresholdRun, Verdict, Verifier,
};
use paillier_balance_check::wire::{
    decode_verifier_key, encode_verifier_key, parse_balances, CipherBundle,
};
use paillier_balance_check::{sum_ciphertexts, sum_plaintexts};

const BITLEN: usize = 256;
const CERTAINTY: u32 = 40;

#[test]
fn test_full_run_verifier_decrypts() {
    // Client generates keys and commits to a threshold
    let client = Client::new(BITLEN, CERTAINTY, BigInt::from(20000)).unwrap();

    // Bank only ever sees the public key
    let bank = Bank::new(
        client.public_key().clone(),
        vec![BigInt::from(10000), BigInt::from(15000)],
    );
    let cipher_balances = bank.encrypt_balances().unwrap();

    let mut run = ThresholdRun::new(client, Deployment::VerifierDecrypts);
    run.receive_balances(cipher_balances).unwrap();
    run.aggregate().unwrap();
    run.compute_difference().unwrap();
    run.apply_mask().unwrap();
    run.decrypt().unwrap();

    // 25000 >= 20000
    assert_eq!(run.issue_verdict().unwrap(), Verdict::Pass);
}

#[test]
fn test_full_run_below_threshold_fails() {
    let client = Client::new(BITLEN, CERTAINTY, BigInt::from(20000)).unwrap();
    let bank = Bank::new(
        client.public_key().clone(),
        vec![BigInt::from(5000), BigInt::from(4000)],
    );
    let cipher_balances = bank.encrypt_balances().unwrap();

    let mut run = ThresholdRun::new(client, Deployment::ClientDecrypts);
    run.receive_balances(cipher_balances).unwrap();
    run.aggregate().unwrap();
    run.compute_difference().unwrap();
    run.apply_mask().unwrap();
    run.decrypt().unwrap();

    assert_eq!(run.issue_verdict().unwrap(), Verdict::Fail);
}

#[test]
fn test_roles_communicate_over_wire_formats() {
    // Client side
    let client = Client::new(BITLEN, CERTAINTY, BigInt::from(20000)).unwrap();
    let key_text = encode_verifier_key(&client.verifier_key());

    // Bank side: balances come from a line-oriented file
    let balances = parse_balances("10000\n15000\n").unwrap();
    let bank = Bank::new(client.public_key().clone(), balances);
    let bundle = CipherBundle {
        ciphertexts: bank.encrypt_balances().unwrap(),
        n: client.public_key().n().clone(),
        cipher_threshold: client.encrypt_threshold().unwrap(),
        cipher_mask: client.encrypt_mask().unwrap(),
    };
    let bundle_text = bundle.encode();

    // Aggregating side: works from the decoded bundle plus the plaintext
    // mask supplied by the client
    let received = CipherBundle::decode(&bundle_text).unwrap();
    assert_eq!(received, bundle);
    let cipher_result = combine(
        client.public_key(),
        &received.ciphertexts,
        &received.cipher_threshold,
        client.mask(),
    )
    .unwrap();

    // Verifier side: rebuilt entirely from the transmitted key bundle
    let verifier = Verifier::new(decode_verifier_key(&key_text).unwrap()).unwrap();
    assert_eq!(verifier.verdict(&cipher_result).unwrap(), Verdict::Pass);
}

#[test]
fn test_verifier_learns_only_masked_residue() {
    let client = Client::new(BITLEN, CERTAINTY, BigInt::from(20000)).unwrap();
    let bank = Bank::new(
        client.public_key().clone(),
        vec![BigInt::from(5000), BigInt::from(4000)],
    );
    let cipher_result = combine(
        client.public_key(),
        &bank.encrypt_balances().unwrap(),
        &client.encrypt_threshold().unwrap(),
        client.mask(),
    )
    .unwrap();

    let verifier = Verifier::new(client.verifier_key()).unwrap();
    let residue = verifier.decrypt(&cipher_result).unwrap();

    // the masked residue differs from the raw gap unless the mask is 1
    let n = client.public_key().n();
    let raw_gap = n - BigInt::from(11000);
    if client.mask() != &BigInt::from(1) {
        assert_ne!(residue, raw_gap);
    }
    assert_eq!(classify(&residue, n), Verdict::Fail);
}

#[test]
fn test_homomorphic_sum_against_plaintext_sum() {
    let client = Client::new(BITLEN, CERTAINTY, BigInt::from(1)).unwrap();
    let pk = client.public_key();
    let plaintexts: Vec<BigInt> = [4357u64, 9001, 25000, 1, 0, 123456]
        .iter()
        .map(|v| BigInt::from(*v))
        .collect();
    let ciphertexts: Vec<BigInt> = plaintexts
        .iter()
        .map(|m| pk.encrypt(m).unwrap())
        .collect();
    let cipher_sum = sum_ciphertexts(pk, &ciphertexts).unwrap();
    let decrypted = client.decrypt(&cipher_sum).unwrap();
    assert_eq!(decrypted, sum_plaintexts(&plaintexts, pk.n()));
}

#[test]
fn test_randomized_bank_accounts_end_to_end() {
    let client = Client::new(BITLEN, CERTAINTY, BigInt::from(30000)).unwrap();
    let bank = Bank::with_random_accounts(client.public_key().clone(), 5000, 25000, 3);
    let expected_sum: BigInt = bank.balances().iter().sum();

    let cipher_result = combine(
        client.public_key(),
        &bank.encrypt_balances().unwrap(),
        &client.encrypt_threshold().unwrap(),
        client.mask(),
    )
    .unwrap();
    let verifier = Verifier::new(client.verifier_key()).unwrap();
    let verdict = verifier.verdict(&cipher_result).unwrap();

    // 6 balances of at least 5000 always reach a 30000 threshold
    assert!(expected_sum >= BigInt::from(30000));
    assert_eq!(verdict, Verdict::Pass);
}
