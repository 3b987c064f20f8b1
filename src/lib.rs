//! dop - a DigitalOcean API client
//!
//! Wraps the DigitalOcean v1 REST API (droplets, images, sizes, regions,
//! SSH keys, domains, DNS records, events) and keeps the account's client id
//! and API key in a password-protected file on disk.

pub mod client;
pub mod config;
pub mod credentials;
pub mod crypto;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Core error types for dop
#[derive(Error, Debug)]
pub enum DopError {
    #[error("Credential store error: {0}")]
    Store(#[from] credentials::StoreError),

    #[error("API error: {0}")]
    Client(#[from] client::ClientError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] crypto::CryptoError),
}

/// A secret string wrapper that never shows up in `Debug` output
#[derive(Debug, Clone)]
pub struct Secret(SecretString);

impl Secret {
    /// Create a new secret from a string
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretString::from(value.into()))
    }

    /// Expose the secret value
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl From<String> for Secret {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for Secret {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// The plaintext secret pair every API call is authenticated with
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    /// DigitalOcean client id
    pub client_id: String,
    /// DigitalOcean API key
    pub api_key: Secret,
}

impl CredentialRecord {
    pub fn new(client_id: impl Into<String>, api_key: impl Into<Secret>) -> Self {
        Self {
            client_id: client_id.into(),
            api_key: api_key.into(),
        }
    }
}

impl PartialEq for CredentialRecord {
    fn eq(&self, other: &Self) -> bool {
        self.client_id == other.client_id && self.api_key.expose() == other.api_key.expose()
    }
}

impl Eq for CredentialRecord {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_debug_hides_api_key() {
        let record = CredentialRecord::new("client123", "keyABC");
        let debug = format!("{:?}", record);

        assert!(debug.contains("client123"));
        assert!(!debug.contains("keyABC"));
    }

    #[test]
    fn test_record_equality_compares_secret() {
        let a = CredentialRecord::new("client123", "keyABC");
        let b = CredentialRecord::new("client123", "keyABC");
        let c = CredentialRecord::new("client123", "other");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
