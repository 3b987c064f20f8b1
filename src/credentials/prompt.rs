//! Interactive input for the credential store

use secrecy::SecretString;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Environment variable consulted before prompting for a password
pub const PASSWORD_ENV: &str = "DOP_PASSWORD";

/// Source of user input for the credential store
pub trait Prompter {
    /// Ask for a secret; input must not be echoed
    fn password(&mut self, message: &str) -> io::Result<SecretString>;

    /// Ask for a plain line of text, without the trailing newline
    fn line(&mut self, message: &str) -> io::Result<String>;

    /// Show an informational message
    fn notice(&mut self, message: &str) -> io::Result<()>;
}

/// Prompts on the controlling terminal, writing to stderr
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    pub fn new() -> Self {
        Self
    }
}

impl Prompter for TerminalPrompter {
    fn password(&mut self, message: &str) -> io::Result<SecretString> {
        if let Ok(password) = std::env::var(PASSWORD_ENV) {
            return Ok(SecretString::from(password));
        }

        eprint!("{}", message);
        io::stderr().flush()?;

        let password = rpassword::read_password()?;
        Ok(SecretString::from(password))
    }

    fn line(&mut self, message: &str) -> io::Result<String> {
        eprint!("{}", message);
        io::stderr().flush()?;

        let mut input = String::new();
        io::stdin().lock().read_line(&mut input)?;
        Ok(input.trim_end_matches(['\r', '\n']).to_string())
    }

    fn notice(&mut self, message: &str) -> io::Result<()> {
        eprintln!("{}", message);
        Ok(())
    }
}

/// Replays canned answers in order and records every notice.
///
/// Useful when input comes from somewhere other than a terminal.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    notices: Vec<String>,
    asked: usize,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            notices: Vec::new(),
            asked: 0,
        }
    }

    /// Notices shown so far
    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    /// Number of questions asked so far
    pub fn asked(&self) -> usize {
        self.asked
    }

    fn next(&mut self, message: &str) -> io::Result<String> {
        self.asked += 1;
        self.answers.pop_front().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("no scripted answer for prompt: {}", message),
            )
        })
    }
}

impl Prompter for ScriptedPrompter {
    fn password(&mut self, message: &str) -> io::Result<SecretString> {
        self.next(message).map(SecretString::from)
    }

    fn line(&mut self, message: &str) -> io::Result<String> {
        self.next(message)
    }

    fn notice(&mut self, message: &str) -> io::Result<()> {
        self.notices.push(message.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_scripted_prompter_replays_in_order() {
        let mut prompter = ScriptedPrompter::new(["first", "second"]);

        assert_eq!(prompter.line("a: ").unwrap(), "first");
        assert_eq!(prompter.password("b: ").unwrap().expose_secret(), "second");
        assert_eq!(prompter.asked(), 2);
    }

    #[test]
    fn test_scripted_prompter_runs_dry() {
        let mut prompter = ScriptedPrompter::new(Vec::<String>::new());
        let err = prompter.line("anything: ").unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_scripted_prompter_records_notices() {
        let mut prompter = ScriptedPrompter::default();
        prompter.notice("hello").unwrap();

        assert_eq!(prompter.notices(), ["hello".to_string()]);
    }
}
