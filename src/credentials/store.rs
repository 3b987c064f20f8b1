//! Encrypted file holding the client id and API key

use super::Prompter;
use crate::crypto::{self, CryptoError, EncryptedBlob};
use crate::CredentialRecord;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Password attempts allowed by [`CredentialStore::load`] unless configured otherwise
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

const INPUT_BANNER: &str = "\
Every API call needs a Client Id and an API Key.
These credentials can be obtained here: https://cloud.digitalocean.com/api_access
";

/// Credential store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Credential file not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encryption error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Failed to decrypt credentials after {attempts} attempts: bad password")]
    AttemptsExhausted { attempts: u32 },

    #[error("No credentials loaded")]
    Empty,

    #[error("Invalid credentials: {0}")]
    Invalid(String),
}

/// Password-protected credential file.
///
/// The file is read and written whole, without locking.
#[derive(Debug)]
pub struct CredentialStore {
    path: PathBuf,
    max_attempts: u32,
    record: Option<CredentialRecord>,
}

impl CredentialStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            record: None,
        }
    }

    /// Set the password attempt budget for [`load`](Self::load) (at least one)
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a credential file exists
    pub fn available(&self) -> bool {
        self.path.is_file()
    }

    /// Read the file and decrypt it, asking for the password until it works
    /// or the attempt budget runs out.
    ///
    /// Only a decode failure (wrong password) is retried. A missing or
    /// malformed file fails immediately.
    pub fn load(&mut self, prompt: &mut dyn Prompter) -> Result<(), StoreError> {
        if !self.available() {
            return Err(StoreError::NotFound(self.path.clone()));
        }

        let content = fs::read_to_string(&self.path)?;
        let blob = EncryptedBlob::decode(content.trim())?;

        self.record = None;
        for attempt in 1..=self.max_attempts {
            let password = prompt.password("Password to restore DigitalOcean credentials: ")?;

            match crypto::decrypt(&blob, &password) {
                Ok(record) => {
                    debug!(attempt, path = %self.path.display(), "Credentials decrypted");
                    self.record = Some(record);
                    return Ok(());
                }
                Err(e) if e.is_decode() => {
                    let retries_left = self.max_attempts - attempt;
                    warn!(attempt, retries_left, "Bad credential password");
                    prompt.notice(&format!("bad password. {} retries left", retries_left))?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(StoreError::AttemptsExhausted {
            attempts: self.max_attempts,
        })
    }

    /// Ask for the client id and API key in plain text
    pub fn input(&mut self, prompt: &mut dyn Prompter) -> Result<(), StoreError> {
        prompt.notice(INPUT_BANNER)?;

        let client_id = prompt.line("Please enter DO Client Id: ")?.trim().to_string();
        let api_key = prompt.line("Please enter DO API Key: ")?.trim().to_string();

        self.set(CredentialRecord::new(client_id, api_key))
    }

    /// Replace the held credentials
    pub fn set(&mut self, record: CredentialRecord) -> Result<(), StoreError> {
        if record.client_id.is_empty() {
            return Err(StoreError::Invalid("client id must not be empty".to_string()));
        }
        if record.api_key.expose().is_empty() {
            return Err(StoreError::Invalid("API key must not be empty".to_string()));
        }

        self.record = Some(record);
        Ok(())
    }

    /// The held credentials
    pub fn get(&self) -> Result<&CredentialRecord, StoreError> {
        self.record.as_ref().ok_or(StoreError::Empty)
    }

    /// Encrypt the held credentials under a newly prompted password and
    /// write them to the file
    pub fn save(&self, prompt: &mut dyn Prompter) -> Result<(), StoreError> {
        let record = self.get()?;

        prompt.notice(&format!(
            "You're going to store DigitalOcean credentials in file: {}",
            self.path.display()
        ))?;
        let password = prompt.password("Please enter encryption password: ")?;

        let content = crypto::encrypt(record, &password)?.encode()?;

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        // The previous file stays intact until the rename. The temp file is
        // created owner-only (0600 on Unix) under a unique name.
        let mut temp = NamedTempFile::new_in(parent)?;
        temp.write_all(content.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| e.error)?;

        info!(path = %self.path.display(), "Credentials saved");
        Ok(())
    }
}
