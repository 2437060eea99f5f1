//! Passphrase reading functionality

use crate::error::{ErrorCategory, ErrorKind, LockboxError, Result};
use std::io::{self, IsTerminal, Read, Write};
use zeroize::Zeroizing;

/// Trait for reading passphrases from various sources
pub trait PassphraseReader {
    /// Read a passphrase as arbitrary bytes (not necessarily UTF-8)
    ///
    /// Returns the passphrase wrapped in `Zeroizing` to ensure it is securely
    /// wiped from memory when dropped.
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>>;
}

/// Returns a fixed passphrase (for `--passphrase` and tests)
pub struct ConstantPassphraseReader {
    passphrase: Zeroizing<Vec<u8>>,
}

impl ConstantPassphraseReader {
    pub fn new(passphrase: Vec<u8>) -> Self {
        Self {
            passphrase: Zeroizing::new(passphrase),
        }
    }
}

impl PassphraseReader for ConstantPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        Ok(Zeroizing::new((*self.passphrase).clone()))
    }
}

/// Reads passphrase from any io::Read source
///
/// Everything up to EOF is the passphrase, minus a single trailing line
/// ending so that `echo secret | lockbox ...` works as expected.
pub struct ReaderPassphraseReader {
    reader: Box<dyn Read>,
}

impl ReaderPassphraseReader {
    pub fn new(reader: Box<dyn Read>) -> Self {
        Self { reader }
    }
}

impl PassphraseReader for ReaderPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        let mut data = Zeroizing::new(Vec::new());
        self.reader.read_to_end(&mut data).map_err(|e| {
            LockboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("error reading passphrase: {}", e),
                e,
            )
        })?;
        if data.ends_with(b"\n") {
            data.pop();
            if data.ends_with(b"\r") {
                data.pop();
            }
        }
        Ok(data)
    }
}

/// Reads passphrase from terminal with no echo
#[derive(Default)]
pub struct TerminalPassphraseReader {
    confirm: bool,
}

impl TerminalPassphraseReader {
    pub fn new() -> Self {
        Self { confirm: false }
    }

    /// Prompts twice and fails unless both entries match. Used when a
    /// typo would otherwise lock the user out of the file being written.
    pub fn confirming() -> Self {
        Self { confirm: true }
    }

    fn prompt(label: &str) -> Result<Zeroizing<Vec<u8>>> {
        let mut stderr = io::stderr();
        stderr
            .write_all(label.as_bytes())
            .and_then(|_| stderr.flush())
            .map_err(|e| {
                LockboxError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    format!("failed to write prompt: {}", e),
                    e,
                )
            })?;

        // Read password *without echo*
        // Note: rpassword returns String (UTF-8 only), not zeroized
        let passphrase = rpassword::read_password().map_err(|e| {
            LockboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::PassphraseUnavailable,
                format!("failure reading passphrase: {}", e),
                e,
            )
        })?;

        Ok(Zeroizing::new(passphrase.into_bytes()))
    }
}

impl PassphraseReader for TerminalPassphraseReader {
    /// Read passphrase from terminal.
    ///
    /// Note: Terminal input is limited to UTF-8 due to rpassword library constraints.
    /// For non-UTF-8 passphrases, use --passphrase-stdin instead.
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        if !io::stdin().is_terminal() {
            return Err(LockboxError::with_kind(
                ErrorCategory::User,
                ErrorKind::PassphraseUnavailable,
                "cannot read passphrase from terminal - stdin is not a terminal",
            ));
        }

        let passphrase = Self::prompt("Passphrase (lockbox): ")?;
        if self.confirm {
            let again = Self::prompt("Confirm passphrase (lockbox): ")?;
            if *again != *passphrase {
                return Err(LockboxError::with_kind(
                    ErrorCategory::User,
                    ErrorKind::PassphraseUnavailable,
                    "passphrases do not match",
                ));
            }
        }
        Ok(passphrase)
    }
}

/// Reads a passphrase and rejects the empty one.
pub(crate) fn read_nonempty(reader: &mut dyn PassphraseReader) -> Result<Zeroizing<Vec<u8>>> {
    let passphrase = reader.read_passphrase()?;
    if passphrase.is_empty() {
        return Err(LockboxError::with_kind(
            ErrorCategory::User,
            ErrorKind::PassphraseUnavailable,
            "passphrase must not be empty",
        ));
    }
    Ok(passphrase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_reader() {
        let mut reader = ConstantPassphraseReader::new(b"test123".to_vec());
        assert_eq!(&*reader.read_passphrase().unwrap(), b"test123");
        assert_eq!(&*reader.read_passphrase().unwrap(), b"test123");
    }

    /// Tests the terminal reader. This is ignored by default and must be run
    /// explicitly and with human input:
    ///
    /// cargo test test_terminal_reader_interactive -- --ignored --nocapture
    #[test]
    #[ignore]
    fn test_terminal_reader_interactive() {
        let mut reader = TerminalPassphraseReader::confirming();
        println!("\nPlease enter a test passphrase twice:");
        let passphrase = reader.read_passphrase().unwrap();
        assert!(!passphrase.is_empty(), "Expected non-empty passphrase");
    }

    #[test]
    fn test_reader_passphrase_reader() {
        let data = b"mypassword";
        let mut reader = ReaderPassphraseReader::new(Box::new(&data[..]));
        assert_eq!(&*reader.read_passphrase().unwrap(), b"mypassword");
    }

    #[test]
    fn test_reader_strips_one_line_ending() {
        let mut reader = ReaderPassphraseReader::new(Box::new(&b"secret\n"[..]));
        assert_eq!(&*reader.read_passphrase().unwrap(), b"secret");

        let mut reader = ReaderPassphraseReader::new(Box::new(&b"secret\r\n"[..]));
        assert_eq!(&*reader.read_passphrase().unwrap(), b"secret");

        let mut reader = ReaderPassphraseReader::new(Box::new(&b"secret\n\n"[..]));
        assert_eq!(&*reader.read_passphrase().unwrap(), b"secret\n");
    }

    #[test]
    fn test_reader_passphrase_reader_empty() {
        let mut reader = ReaderPassphraseReader::new(Box::new(&b""[..]));
        assert_eq!(&*reader.read_passphrase().unwrap(), b"");
    }

    /// ReaderPassphraseReader accepts arbitrary byte sequences, not just
    /// valid UTF-8, so --passphrase-stdin works with any passphrase.
    #[test]
    fn test_reader_passphrase_reader_non_utf8() {
        let data: &[u8] = &[0xff, 0xfe, 0x00, 0x01];
        let mut reader = ReaderPassphraseReader::new(Box::new(data));
        assert_eq!(&*reader.read_passphrase().unwrap(), data);
    }

    #[test]
    fn test_read_nonempty_rejects_empty() {
        let mut reader = ConstantPassphraseReader::new(Vec::new());
        let err = read_nonempty(&mut reader).expect_err("empty passphrase");
        assert_eq!(err.kind, Some(ErrorKind::PassphraseUnavailable));

        let mut reader = ConstantPassphraseReader::new(b"x".to_vec());
        assert_eq!(&*read_nonempty(&mut reader).unwrap(), b"x");
    }
}
