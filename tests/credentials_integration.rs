//! Integration tests for credential encryption and the on-disk store
//!
//! Tests the full flow: prompt -> encrypt -> file -> decrypt

use dop::credentials::{CredentialStore, ScriptedPrompter, StoreError};
use dop::crypto::{decrypt, encrypt, EncryptedBlob, IV_SIZE, SALT_SIZE};
use dop::CredentialRecord;
use proptest::prelude::*;
use secrecy::SecretString;
use tempfile::tempdir;

fn password(s: &str) -> SecretString {
    SecretString::from(s.to_string())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_roundtrip(client_id in ".*", api_key in ".*", pw in ".*") {
        let record = CredentialRecord::new(client_id, api_key);
        let blob = encrypt(&record, &password(&pw)).unwrap();

        prop_assert_eq!(decrypt(&blob, &password(&pw)).unwrap(), record);
    }

    #[test]
    fn prop_wrong_password_never_yields_original(
        client_id in "[a-z0-9]{1,24}",
        api_key in "[A-Za-z0-9]{1,40}",
        pw1 in ".{1,16}",
        pw2 in ".{1,16}",
    ) {
        prop_assume!(pw1 != pw2);
        let record = CredentialRecord::new(client_id, api_key);
        let blob = encrypt(&record, &password(&pw1)).unwrap();

        match decrypt(&blob, &password(&pw2)) {
            Ok(other) => prop_assert_ne!(other, record),
            Err(e) => prop_assert!(e.is_decode()),
        }
    }

    #[test]
    fn prop_blob_text_roundtrip(
        salt in proptest::collection::vec(any::<u8>(), SALT_SIZE),
        iv in proptest::collection::vec(any::<u8>(), IV_SIZE),
        ciphertext in proptest::collection::vec(any::<u8>(), 0..256),
    ) {
        let blob = EncryptedBlob { salt, iv, ciphertext };
        let encoded = blob.encode().unwrap();

        prop_assert_eq!(EncryptedBlob::decode(&encoded).unwrap(), blob);
    }
}

#[test]
fn test_example_pair() {
    let record = CredentialRecord::new("client123", "keyABC");
    let blob = encrypt(&record, &password("hunter2")).unwrap();

    assert_eq!(
        decrypt(&blob, &password("hunter2")).unwrap(),
        CredentialRecord::new("client123", "keyABC")
    );
    assert!(decrypt(&blob, &password("wrongpass")).unwrap_err().is_decode());
}

/// First run: input, save, then a later process loads with the same password
#[test]
fn test_first_use_then_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dop").join("credentials.json");

    let mut store = CredentialStore::new(&path);
    assert!(!store.available());

    let mut prompter = ScriptedPrompter::new(["client123", "keyABC", "hunter2"]);
    store.input(&mut prompter).unwrap();
    store.save(&mut prompter).unwrap();
    assert!(prompter.notices().iter().any(|n| n.contains("credentials.json")));

    let content = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(value.as_array().map(Vec::len), Some(3));
    assert!(!content.contains("keyABC"));

    let mut reloaded = CredentialStore::new(&path);
    reloaded
        .load(&mut ScriptedPrompter::new(["wrong", "hunter2"]))
        .unwrap();
    assert_eq!(reloaded.get().unwrap().client_id, "client123");
    assert_eq!(reloaded.get().unwrap().api_key.expose(), "keyABC");
}

/// Saving again replaces the file with fresh salt and IV
#[test]
fn test_resave_rotates_salt_and_iv() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("credentials.json");

    let mut store = CredentialStore::new(&path);
    store.set(CredentialRecord::new("client123", "keyABC")).unwrap();

    store.save(&mut ScriptedPrompter::new(["pw"])).unwrap();
    let first = EncryptedBlob::decode(&std::fs::read_to_string(&path).unwrap()).unwrap();

    store.save(&mut ScriptedPrompter::new(["pw"])).unwrap();
    let second = EncryptedBlob::decode(&std::fs::read_to_string(&path).unwrap()).unwrap();

    assert_ne!(first.salt, second.salt);
    assert_ne!(first.iv, second.iv);
}

/// A file with a spaced JSON payload and a trailing newline
#[test]
fn test_loads_legacy_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("credentials.json");
    std::fs::write(
        &path,
        "[\"000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f\", \
         \"6465666768696a6b6c6d6e6f70717273\", \
         \"12943c28c0c01cbb9cbde6fcf3c5a9845c69528d7289bf\"]\n",
    )
    .unwrap();

    let mut store = CredentialStore::new(&path);
    store.load(&mut ScriptedPrompter::new(["hunter2"])).unwrap();

    assert_eq!(store.get().unwrap(), &CredentialRecord::new("client123", "keyABC"));
}

#[test]
fn test_exhaustion_reports_attempts() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("credentials.json");

    let mut store = CredentialStore::new(&path);
    store.set(CredentialRecord::new("client123", "keyABC")).unwrap();
    store.save(&mut ScriptedPrompter::new(["right"])).unwrap();

    let mut reloaded = CredentialStore::new(&path);
    let err = reloaded
        .load(&mut ScriptedPrompter::new(["x", "y", "z"]))
        .unwrap_err();

    assert!(matches!(err, StoreError::AttemptsExhausted { attempts: 3 }));
    assert!(err.to_string().contains("bad password"));
}
