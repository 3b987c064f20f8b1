//! Cryptographic utilities for dop
//!
//! Encrypts the credential pair with AES-256 in CFB-8 mode under a key
//! derived from a password and a random salt. The scheme carries no
//! authentication tag: a wrong password is only noticed when the decrypted
//! bytes fail to decode.

mod cipher;

pub use cipher::{
    decrypt, encrypt, make_key, CryptoError, DerivedKey, EncryptedBlob, IV_SIZE, KEY_SIZE,
    SALT_SIZE,
};
