//! Password-protected persistence of the API credential pair
//!
//! [`CredentialStore`] owns the file and the retry policy; terminal
//! interaction goes through a [`Prompter`] supplied by the caller.

mod prompt;
mod store;

pub use prompt::{Prompter, ScriptedPrompter, TerminalPrompter, PASSWORD_ENV};
pub use store::{CredentialStore, StoreError, DEFAULT_MAX_ATTEMPTS};
