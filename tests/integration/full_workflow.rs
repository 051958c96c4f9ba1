//! Integration test: full end-to-end workflow.
//!
//! Tests the complete lifecycle through the backend:
//! 1. Generate, sign, and verify with a custodied wallet
//! 2. Reject identifier collisions between import and generate
//! 3. Issue a challenge, sign it client-side, and log in
//! 4. Replay, expiry, and reissue of challenges
//! 5. The same flows over file-backed and sealed storage

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use solvault::backend::{
    ChallengeRequest, GenerateKeypairRequest, ImportKeypairRequest, SignMessageRequest,
    VerifyMessageRequest, WriteConfigRequest,
};
use solvault::crypto::seal::SealKey;
use solvault::crypto::signing::{sign_message, signature_from_base58, signature_to_base58, verify};
use solvault::message::offchain::PREAMBLE_LEN;
use solvault::{
    frame, Backend, FileStorage, LoginRequest, ManualClock, MemoryStorage, OsRandom,
    Rejection, SealedStorage, SigningMode, Storage, VaultError, WalletKeypair,
};

const T0: i64 = 1_700_000_000;

fn memory_backend() -> (Backend, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(T0));
    let backend = Backend::with_collaborators(
        Arc::new(MemoryStorage::new()),
        Arc::new(OsRandom),
        clock.clone(),
    );
    (backend, clock)
}

/// Client side of a login: sign the nonce as an off-chain message.
fn login_request(wallet: &WalletKeypair, nonce: &str) -> LoginRequest {
    let signature = sign_message(wallet, nonce.as_bytes(), SigningMode::Offchain)
        .expect("nonce should frame");
    LoginRequest {
        public_key: wallet.public_key().to_base58(),
        nonce: nonce.to_string(),
        signature: signature_to_base58(&signature),
    }
}

#[test]
fn full_workflow_custody_and_signing() {
    let (backend, _) = memory_backend();

    // ── Step 1: Generate and sign "hello" in both modes ─────────────────
    let created = backend
        .generate_keypair(&GenerateKeypairRequest { id: "w1".into() })
        .expect("generate should succeed");
    assert!(!created.public_key.is_empty());

    let public_key = solvault::PublicKey::from_base58(&created.public_key).unwrap();

    for mode in [SigningMode::Raw, SigningMode::Offchain] {
        let signed = backend
            .sign_message(&SignMessageRequest {
                id: "w1".into(),
                message: STANDARD.encode("hello"),
                mode,
            })
            .expect("signing should succeed");

        // Signature checks out against the framed bytes independently
        let sig = signature_from_base58(&signed.signature).unwrap();
        let framed = frame(b"hello", mode).unwrap();
        assert!(verify(public_key.verifying_key(), &framed, &sig));
        if mode == SigningMode::Offchain {
            assert_eq!(framed.len(), PREAMBLE_LEN + 5);
        }

        let verified = backend
            .verify_message(&VerifyMessageRequest {
                id: "w1".into(),
                message: STANDARD.encode("hello"),
                mode,
                signature: signed.signature.clone(),
            })
            .expect("verify should succeed");
        assert!(verified.verified, "{mode:?} signature should verify");

        // Wrong message does not verify
        let tampered = backend
            .verify_message(&VerifyMessageRequest {
                id: "w1".into(),
                message: STANDARD.encode("hellp"),
                mode,
                signature: signed.signature,
            })
            .expect("verify should succeed");
        assert!(!tampered.verified);
    }

    // ── Step 2: Import then generate under the same id ──────────────────
    let wallet = WalletKeypair::generate(&OsRandom).unwrap();
    backend
        .import_keypair(&ImportKeypairRequest {
            id: "imported".into(),
            private_key: wallet.private_key_base58(),
        })
        .expect("import should succeed");
    let err = backend
        .generate_keypair(&GenerateKeypairRequest {
            id: "imported".into(),
        })
        .unwrap_err();
    assert!(matches!(err, VaultError::AlreadyExists(_)));
    assert!(err.is_client_error());

    // Stored key is untouched by the failed generate
    assert_eq!(
        backend.read_keypair("imported").unwrap().private_key,
        wallet.private_key_base58()
    );

    let mut keys = backend.list_keypairs().unwrap().keys;
    keys.sort();
    assert_eq!(keys, vec!["imported", "w1"]);

    // ── Step 3: Delete ──────────────────────────────────────────────────
    backend.delete_keypair("w1").unwrap();
    backend.delete_keypair("w1").expect("delete is idempotent");
    assert!(matches!(
        backend.read_keypair("w1"),
        Err(VaultError::NotFound(_))
    ));
}

#[test]
fn full_workflow_challenge_login() {
    let (backend, clock) = memory_backend();
    let wallet = WalletKeypair::generate(&OsRandom).unwrap();
    let pk = wallet.public_key().to_base58();

    backend
        .write_config(&WriteConfigRequest {
            token_policies: vec!["reader".into(), "signer".into()],
            token_ttl: Some(600),
            token_max_ttl: Some(7200),
        })
        .unwrap();

    // ── Step 1: Issue, sign, authenticate ───────────────────────────────
    let challenge = backend
        .issue_challenge(&ChallengeRequest {
            public_key: pk.clone(),
        })
        .expect("issue should succeed");
    assert!(challenge.nonce.starts_with("vault:solana:"));
    assert_eq!(challenge.expires_at, T0 + 300);

    let request = login_request(&wallet, &challenge.nonce);
    let grant = backend.authenticate(&request).expect("login should succeed");
    assert_eq!(grant.identity, pk);
    assert_eq!(grant.display_name, format!("solana-{}", &pk[..8]));
    assert_eq!(grant.policies, vec!["reader", "signer"]);
    assert_eq!(grant.ttl, 600);
    assert_eq!(grant.max_ttl, 7200);
    assert!(grant.renewable);
    assert_eq!(grant.metadata.get("public_key"), Some(&pk));

    // ── Step 2: Replay is rejected ──────────────────────────────────────
    let err = backend.authenticate(&request).unwrap_err();
    assert!(matches!(err, VaultError::Rejected(Rejection::NoChallenge)));

    // ── Step 3: Expiry, then nothing left to consume ────────────────────
    let challenge = backend
        .issue_challenge(&ChallengeRequest {
            public_key: pk.clone(),
        })
        .unwrap();
    clock.advance(301);
    let request = login_request(&wallet, &challenge.nonce);
    assert!(matches!(
        backend.authenticate(&request),
        Err(VaultError::Rejected(Rejection::Expired))
    ));
    assert!(matches!(
        backend.authenticate(&request),
        Err(VaultError::Rejected(Rejection::NoChallenge))
    ));

    // ── Step 4: Reissue replaces the earlier nonce ──────────────────────
    let first = backend
        .issue_challenge(&ChallengeRequest {
            public_key: pk.clone(),
        })
        .unwrap();
    let second = backend
        .issue_challenge(&ChallengeRequest {
            public_key: pk.clone(),
        })
        .unwrap();
    assert_ne!(first.nonce, second.nonce);

    assert!(matches!(
        backend.authenticate(&login_request(&wallet, &first.nonce)),
        Err(VaultError::Rejected(Rejection::NonceMismatch))
    ));
    // Mismatch keeps the live challenge
    backend
        .authenticate(&login_request(&wallet, &second.nonce))
        .expect("second nonce should still be valid");
}

#[test]
fn full_workflow_raw_signed_nonce_is_rejected() {
    let (backend, _) = memory_backend();
    let wallet = WalletKeypair::generate(&OsRandom).unwrap();
    let pk = wallet.public_key().to_base58();

    let challenge = backend
        .issue_challenge(&ChallengeRequest {
            public_key: pk.clone(),
        })
        .unwrap();
    let raw = sign_message(&wallet, challenge.nonce.as_bytes(), SigningMode::Raw).unwrap();
    let err = backend
        .authenticate(&LoginRequest {
            public_key: pk.clone(),
            nonce: challenge.nonce,
            signature: signature_to_base58(&raw),
        })
        .unwrap_err();
    assert!(matches!(err, VaultError::Rejected(Rejection::SignatureInvalid)));

    // The failed attempt consumed the challenge
    let challenge = backend
        .issue_challenge(&ChallengeRequest { public_key: pk })
        .unwrap();
    backend
        .authenticate(&login_request(&wallet, &challenge.nonce))
        .expect("fresh challenge should succeed");
}

#[test]
fn full_workflow_other_key_cannot_use_challenge() {
    let (backend, _) = memory_backend();
    let owner = WalletKeypair::generate(&OsRandom).unwrap();
    let intruder = WalletKeypair::generate(&OsRandom).unwrap();

    let challenge = backend
        .issue_challenge(&ChallengeRequest {
            public_key: owner.public_key().to_base58(),
        })
        .unwrap();

    // Intruder presents the owner's nonce under its own key: no challenge exists for it
    assert!(matches!(
        backend.authenticate(&login_request(&intruder, &challenge.nonce)),
        Err(VaultError::Rejected(Rejection::NoChallenge))
    ));

    // Intruder signs but claims the owner's key
    let mut forged = login_request(&intruder, &challenge.nonce);
    forged.public_key = owner.public_key().to_base58();
    assert!(matches!(
        backend.authenticate(&forged),
        Err(VaultError::Rejected(Rejection::SignatureInvalid))
    ));
}

#[test]
fn full_workflow_file_storage_persists_across_backends() {
    let dir = tempfile::tempdir().unwrap();
    let wallet = WalletKeypair::generate(&OsRandom).unwrap();

    {
        let backend = Backend::new(Arc::new(FileStorage::new(dir.path()).unwrap()));
        backend
            .import_keypair(&ImportKeypairRequest {
                id: "persisted".into(),
                private_key: wallet.private_key_base58(),
            })
            .unwrap();
    }

    let backend = Backend::new(Arc::new(FileStorage::new(dir.path()).unwrap()));
    assert_eq!(
        backend.read_public_key("persisted").unwrap().public_key,
        wallet.public_key().to_base58()
    );

    let challenge = backend
        .issue_challenge(&ChallengeRequest {
            public_key: wallet.public_key().to_base58(),
        })
        .unwrap();
    let grant = backend
        .authenticate(&login_request(&wallet, &challenge.nonce))
        .unwrap();
    assert!(grant.policies.is_empty());
    assert_eq!(grant.ttl, 3600);
    assert_eq!(grant.max_ttl, 86400);
}

#[test]
fn full_workflow_sealed_storage_hides_private_keys() {
    let dir = tempfile::tempdir().unwrap();
    let wallet = WalletKeypair::generate(&OsRandom).unwrap();
    let key = [9u8; 32];

    let files = FileStorage::new(dir.path()).unwrap();
    let backend = Backend::new(Arc::new(SealedStorage::new(
        files,
        SealKey::from_bytes(key),
        Arc::new(OsRandom),
    )));
    backend
        .import_keypair(&ImportKeypairRequest {
            id: "cold".into(),
            private_key: wallet.private_key_base58(),
        })
        .unwrap();
    assert_eq!(
        backend.read_keypair("cold").unwrap().private_key,
        wallet.private_key_base58()
    );

    // On disk the record does not contain the private key text
    let raw = FileStorage::new(dir.path())
        .unwrap()
        .get("wallet/cold")
        .unwrap()
        .expect("record should exist");
    let on_disk = String::from_utf8_lossy(&raw.value);
    assert!(!on_disk.contains(&wallet.private_key_base58()));

    // A different key cannot open it
    let wrong = Backend::new(Arc::new(SealedStorage::new(
        FileStorage::new(dir.path()).unwrap(),
        SealKey::from_bytes([1u8; 32]),
        Arc::new(OsRandom),
    )));
    let err = wrong.read_keypair("cold").unwrap_err();
    assert!(matches!(err, VaultError::UnsealFailed(_)));
    assert!(!err.is_client_error());
}
