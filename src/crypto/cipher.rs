//! AES-256-CFB8 encryption with a single-round SHA-256 key derivation

use aes::cipher::{AsyncStreamCipher, KeyIvInit};
use rand::{rngs::OsRng, RngCore};
use secrecy::{zeroize::Zeroizing, ExposeSecret, SecretBox, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::CredentialRecord;

type Aes256Cfb8Enc = cfb8::Encryptor<aes::Aes256>;
type Aes256Cfb8Dec = cfb8::Decryptor<aes::Aes256>;

/// Cryptographic errors
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// The decrypted bytes are not a credential pair. Almost always a wrong password.
    #[error("Decrypted data could not be decoded: {0}")]
    Decode(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}

impl CryptoError {
    /// Whether this error is the wrong-password signal
    pub fn is_decode(&self) -> bool {
        matches!(self, CryptoError::Decode(_))
    }
}

/// Size of the AES-256 key in bytes
pub const KEY_SIZE: usize = 32;

/// Size of the key derivation salt in bytes
pub const SALT_SIZE: usize = 32;

/// Size of the CFB initialization vector (one AES block)
pub const IV_SIZE: usize = 16;

/// A key derived from a password and salt
pub struct DerivedKey {
    key: SecretBox<[u8; KEY_SIZE]>,
}

impl DerivedKey {
    fn as_bytes(&self) -> &[u8] {
        self.key.expose_secret().as_slice()
    }
}

/// Salt, IV and ciphertext of one encrypted credential pair.
///
/// Stored as a JSON array of three lowercase hex strings:
/// `[salt_hex, iv_hex, ciphertext_hex]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "[String; 3]", try_from = "[String; 3]")]
pub struct EncryptedBlob {
    pub salt: Vec<u8>,
    pub iv: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

impl EncryptedBlob {
    /// Serialize to the on-disk text form
    pub fn encode(&self) -> Result<String, CryptoError> {
        serde_json::to_string(self).map_err(|e| CryptoError::InvalidFormat(e.to_string()))
    }

    /// Parse the on-disk text form
    pub fn decode(s: &str) -> Result<Self, CryptoError> {
        serde_json::from_str(s).map_err(|e| CryptoError::InvalidFormat(e.to_string()))
    }
}

impl From<EncryptedBlob> for [String; 3] {
    fn from(blob: EncryptedBlob) -> Self {
        [
            hex::encode(blob.salt),
            hex::encode(blob.iv),
            hex::encode(blob.ciphertext),
        ]
    }
}

impl TryFrom<[String; 3]> for EncryptedBlob {
    type Error = CryptoError;

    fn try_from([salt, iv, ciphertext]: [String; 3]) -> Result<Self, Self::Error> {
        let salt = hex::decode(salt)
            .map_err(|e| CryptoError::InvalidFormat(format!("Invalid salt: {}", e)))?;
        let iv =
            hex::decode(iv).map_err(|e| CryptoError::InvalidFormat(format!("Invalid IV: {}", e)))?;
        let ciphertext = hex::decode(ciphertext)
            .map_err(|e| CryptoError::InvalidFormat(format!("Invalid ciphertext: {}", e)))?;

        if salt.len() != SALT_SIZE {
            return Err(CryptoError::InvalidFormat(format!(
                "Invalid salt length: expected {}, got {}",
                SALT_SIZE,
                salt.len()
            )));
        }

        if iv.len() != IV_SIZE {
            return Err(CryptoError::InvalidFormat(format!(
                "Invalid IV length: expected {}, got {}",
                IV_SIZE,
                iv.len()
            )));
        }

        Ok(Self {
            salt,
            iv,
            ciphertext,
        })
    }
}

/// Derive the AES-256 key for `password` and `salt`.
///
/// `SHA256(lower_hex(SHA256(salt)) || password)`. The digest of the salt is
/// hashed in its hex form, not as raw bytes.
pub fn make_key(password: &SecretString, salt: &[u8]) -> DerivedKey {
    let salt_hash = hex::encode(Sha256::digest(salt));

    let mut hasher = Sha256::new();
    hasher.update(salt_hash.as_bytes());
    hasher.update(password.expose_secret().as_bytes());

    let key: [u8; KEY_SIZE] = hasher.finalize().into();
    DerivedKey {
        key: SecretBox::new(Box::new(key)),
    }
}

/// Encrypt a credential pair with a fresh salt and IV
pub fn encrypt(record: &CredentialRecord, password: &SecretString) -> Result<EncryptedBlob, CryptoError> {
    let mut salt = vec![0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);
    let mut iv = vec![0u8; IV_SIZE];
    OsRng.fill_bytes(&mut iv);

    let key = make_key(password, &salt);

    let mut buf = serde_json::to_vec(&(record.client_id.as_str(), record.api_key.expose()))
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    Aes256Cfb8Enc::new_from_slices(key.as_bytes(), &iv)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?
        .encrypt(&mut buf);

    Ok(EncryptedBlob {
        salt,
        iv,
        ciphertext: buf,
    })
}

/// Decrypt a credential pair.
///
/// Returns [`CryptoError::Decode`] when the plaintext is not UTF-8 or not a
/// JSON array of exactly two strings. There is no integrity check beyond that.
pub fn decrypt(blob: &EncryptedBlob, password: &SecretString) -> Result<CredentialRecord, CryptoError> {
    let key = make_key(password, &blob.salt);

    let mut buf = Zeroizing::new(blob.ciphertext.clone());
    Aes256Cfb8Dec::new_from_slices(key.as_bytes(), &blob.iv)
        .map_err(|e| CryptoError::InvalidFormat(e.to_string()))?
        .decrypt(&mut buf[..]);

    let text = std::str::from_utf8(&buf)
        .map_err(|e| CryptoError::Decode(format!("Invalid UTF-8: {}", e)))?;

    let (client_id, api_key): (String, String) = serde_json::from_str(text)
        .map_err(|e| CryptoError::Decode(format!("Not a credential pair: {}", e)))?;

    Ok(CredentialRecord::new(client_id, api_key))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Fixture with a spaced payload: salt 00..1f, IV 64..73, password "hunter2",
    // payload `["client123", "keyABC"]` with a space after the comma.
    const LEGACY_BLOB: &str = r#"["000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f", "6465666768696a6b6c6d6e6f70717273", "12943c28c0c01cbb9cbde6fcf3c5a9845c69528d7289bf"]"#;

    fn password(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    fn sequential_salt() -> Vec<u8> {
        (0u8..32).collect()
    }

    #[test]
    fn test_make_key_known_answer() {
        let key = make_key(&password("hunter2"), &sequential_salt());

        assert_eq!(
            hex::encode(key.as_bytes()),
            "45127d2712e087fafd242a5be0a649863e26d0bce743edc9d0abf5983aacf9a8"
        );
    }

    #[test]
    fn test_make_key_is_deterministic() {
        let salt = sequential_salt();
        let a = make_key(&password("pw"), &salt);
        let b = make_key(&password("pw"), &salt);

        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_make_key_depends_on_salt_and_password() {
        let salt = sequential_salt();
        let mut other_salt = salt.clone();
        other_salt[0] ^= 1;

        let base = make_key(&password("pw"), &salt);
        assert_ne!(base.as_bytes(), make_key(&password("pw"), &other_salt).as_bytes());
        assert_ne!(base.as_bytes(), make_key(&password("pw2"), &salt).as_bytes());
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let record = CredentialRecord::new("client123", "keyABC");
        let blob = encrypt(&record, &password("hunter2")).unwrap();

        let decrypted = decrypt(&blob, &password("hunter2")).unwrap();
        assert_eq!(decrypted, record);
    }

    #[test]
    fn test_wrong_password_fails_to_decode() {
        let record = CredentialRecord::new("client123", "keyABC");
        let blob = encrypt(&record, &password("hunter2")).unwrap();

        let err = decrypt(&blob, &password("wrongpass")).unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn test_decrypt_legacy_blob() {
        let blob = EncryptedBlob::decode(LEGACY_BLOB).unwrap();
        let record = decrypt(&blob, &password("hunter2")).unwrap();

        assert_eq!(record, CredentialRecord::new("client123", "keyABC"));
    }

    #[test]
    fn test_decrypt_legacy_blob_wrong_password() {
        let blob = EncryptedBlob::decode(LEGACY_BLOB).unwrap();
        let err = decrypt(&blob, &password("wrongpass")).unwrap_err();

        assert!(matches!(err, CryptoError::Decode(ref m) if m.contains("UTF-8")));
    }

    #[test]
    fn test_fresh_randomness_per_encryption() {
        let record = CredentialRecord::new("client123", "keyABC");
        let a = encrypt(&record, &password("hunter2")).unwrap();
        let b = encrypt(&record, &password("hunter2")).unwrap();

        assert_ne!(a.salt, b.salt);
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_encoded_blob_is_array_of_three_hex_strings() {
        let record = CredentialRecord::new("client123", "keyABC");
        let blob = encrypt(&record, &password("hunter2")).unwrap();
        let encoded = blob.encode().unwrap();

        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 3);
        for item in items {
            let s = item.as_str().unwrap();
            assert!(s.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        }
        assert_eq!(items[0].as_str().unwrap().len(), SALT_SIZE * 2);
        assert_eq!(items[1].as_str().unwrap().len(), IV_SIZE * 2);

        assert_eq!(EncryptedBlob::decode(&encoded).unwrap(), blob);
    }

    #[test]
    fn test_decode_rejects_malformed_blobs() {
        let salt = "00".repeat(SALT_SIZE);
        let iv = "00".repeat(IV_SIZE);

        let cases = [
            String::from("not json"),
            format!(r#"["{}", "{}"]"#, salt, iv),
            format!(r#"["{}", "{}", "ab", "cd"]"#, salt, iv),
            format!(r#"["{}", "{}", "zz"]"#, salt, iv),
            format!(r#"["{}", "0011", "ab"]"#, salt),
            format!(r#"["0011", "{}", "ab"]"#, iv),
            format!(r#"{{"salt": "{}"}}"#, salt),
        ];

        for case in &cases {
            let err = EncryptedBlob::decode(case).unwrap_err();
            assert!(
                matches!(err, CryptoError::InvalidFormat(_)),
                "expected format error for {}",
                case
            );
        }
    }

    #[test]
    fn test_decode_accepts_empty_ciphertext() {
        let encoded = format!(r#"["{}", "{}", ""]"#, "ab".repeat(SALT_SIZE), "cd".repeat(IV_SIZE));
        let blob = EncryptedBlob::decode(&encoded).unwrap();

        assert!(blob.ciphertext.is_empty());
        // Empty plaintext is not a credential pair
        assert!(decrypt(&blob, &password("x")).unwrap_err().is_decode());
    }

    #[test]
    fn test_unicode_secrets_roundtrip() {
        let record = CredentialRecord::new("클라이언트", "ключ-\"quoted\"");
        let blob = encrypt(&record, &password("pässwörd")).unwrap();

        assert_eq!(decrypt(&blob, &password("pässwörd")).unwrap(), record);
    }
}
