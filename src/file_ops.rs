//! File encryption/decryption operations
//!
//! This module provides high-level file operations for encrypting, decrypting,
//! and updating files using the lockbox container format.

use crate::container;
use crate::error::{ErrorCategory, ErrorKind, LockboxError, Result};
use crate::params::CryptoParams;
use crate::passphrase::{PassphraseReader, read_nonempty};
use crate::varmor;
use std::ffi::OsStr;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

/// File extension appended on encrypt and stripped on decrypt.
pub const EXTENSION: &str = "lockbox";

/// Knobs shared by all file operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileOptions {
    pub params: CryptoParams,
    /// Read and write the base64url text form instead of raw bytes.
    pub armor: bool,
    /// Replace an existing destination instead of failing.
    pub force: bool,
}

/// `secrets.txt` -> `secrets.txt.lockbox`
pub fn default_encrypt_output(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".");
    name.push(EXTENSION);
    PathBuf::from(name)
}

/// `secrets.txt.lockbox` -> `secrets.txt`
pub fn default_decrypt_output(input: &Path) -> Result<PathBuf> {
    if input.extension() == Some(OsStr::new(EXTENSION)) {
        Ok(input.with_extension(""))
    } else {
        Err(LockboxError::new(
            ErrorCategory::User,
            format!(
                "cannot derive output path: {} does not end in .{}; pass --output",
                input.display(),
                EXTENSION
            ),
        ))
    }
}

/// Encrypt a file with a passphrase
///
/// Reads plaintext from `input_path`, seals it using a passphrase from
/// `passphrase_reader`, and writes the container to `output_path`.
///
/// The output file is created with mode 0o600 (read/write for owner only) on Unix systems.
pub fn encrypt_file(
    input_path: &Path,
    output_path: &Path,
    passphrase_reader: &mut dyn PassphraseReader,
    opts: &FileOptions,
) -> Result<()> {
    ensure_writable(output_path, opts.force)?;

    let plaintext = Zeroizing::new(fs::read(input_path).map_err(|e| read_error(input_path, e))?);
    let passphrase = read_nonempty(passphrase_reader)?;
    let sealed = container::seal(&opts.params, &passphrase, &plaintext)
        .map_err(|e| e.with_context("encryption failed"))?;
    let encoded = encode(sealed, opts.armor);

    write_file_atomic(output_path, &encoded, opts.force)
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))?;

    tracing::info!(
        input = %input_path.display(),
        output = %output_path.display(),
        "encrypted file"
    );
    Ok(())
}

/// Decrypt a file with a passphrase
///
/// Reads a container from `input_path`, opens it using a passphrase from
/// `passphrase_reader`, and writes the plaintext to `output_path`. Nothing
/// is written unless authentication succeeds.
///
/// The output file is created with mode 0o600 (read/write for owner only) on Unix systems.
pub fn decrypt_file(
    input_path: &Path,
    output_path: &Path,
    passphrase_reader: &mut dyn PassphraseReader,
    opts: &FileOptions,
) -> Result<()> {
    ensure_writable(output_path, opts.force)?;

    let raw = fs::read(input_path).map_err(|e| read_error(input_path, e))?;
    let sealed = decode(raw, opts.armor)?;
    let passphrase = read_nonempty(passphrase_reader)?;
    let plaintext = container::open(&opts.params, &passphrase, &sealed)
        .map_err(|e| e.with_context("failed to decrypt"))?;

    write_file_atomic(output_path, &plaintext, opts.force)
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))?;

    tracing::info!(
        input = %input_path.display(),
        output = %output_path.display(),
        "decrypted file"
    );
    Ok(())
}

/// Update an encrypted file with new plaintext using the same passphrase
///
/// This function:
/// 1. Opens the existing container at `crypt_path` to validate the passphrase
/// 2. Reads new plaintext from `plain_path`
/// 3. Seals the new plaintext with the validated passphrase (fresh salt/nonce)
/// 4. Atomically replaces `crypt_path`
///
/// The passphrase validation prevents accidental passphrase changes.
pub fn update_file(
    plain_path: &Path,
    crypt_path: &Path,
    passphrase_reader: &mut dyn PassphraseReader,
    opts: &FileOptions,
) -> Result<()> {
    let raw = fs::read(crypt_path).map_err(|e| read_error(crypt_path, e))?;
    let existing = decode(raw, opts.armor)?;

    let passphrase = read_nonempty(passphrase_reader)?;

    // Validate passphrase by opening the existing file (discard plaintext)
    container::open(&opts.params, &passphrase, &existing)
        .map_err(|e| e.with_context("failed to decrypt"))?;

    let new_plaintext =
        Zeroizing::new(fs::read(plain_path).map_err(|e| read_error(plain_path, e))?);
    let sealed = container::seal(&opts.params, &passphrase, &new_plaintext)
        .map_err(|e| e.with_context("failed to encrypt"))?;
    let encoded = encode(sealed, opts.armor);

    write_file_atomic(crypt_path, &encoded, true)?;

    tracing::info!(
        input = %plain_path.display(),
        output = %crypt_path.display(),
        "updated encrypted file"
    );
    Ok(())
}

fn encode(sealed: Vec<u8>, armor: bool) -> Vec<u8> {
    if armor {
        varmor::wrap(&sealed).into_bytes()
    } else {
        sealed
    }
}

fn decode(raw: Vec<u8>, armor: bool) -> Result<Vec<u8>> {
    if !armor {
        return Ok(raw);
    }
    let armored = String::from_utf8(raw).map_err(|e| {
        LockboxError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::ArmoringInvalid,
            "armored input is not valid UTF-8",
            e,
        )
    })?;
    varmor::unwrap(&armored).map_err(|e| e.with_context("failed to unarmor"))
}

/// Fails early, before any passphrase prompt, if `path` would be clobbered.
fn ensure_writable(path: &Path, force: bool) -> Result<()> {
    if !force && path.exists() {
        return Err(output_exists(path));
    }
    Ok(())
}

fn output_exists(path: &Path) -> LockboxError {
    LockboxError::with_kind(
        ErrorCategory::User,
        ErrorKind::OutputExists,
        format!("{} already exists (use --force to overwrite)", path.display()),
    )
}

/// Write `contents` to `path` via tempfile + fsync + rename.
///
/// Either the complete file appears at `path` or nothing does; an error
/// midway leaves only the tempfile, which is removed on drop. Unless
/// `overwrite` is set the rename refuses to replace an existing file.
fn write_file_atomic(path: &Path, contents: &[u8], overwrite: bool) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp_file = tempfile::Builder::new()
        .prefix(".lockbox-tmp")
        .tempfile_in(dir)
        .map_err(|e| io_error(ErrorCategory::User, "failed to create tempfile", e))?;

    temp_file
        .write_all(contents)
        .map_err(|e| io_error(ErrorCategory::Internal, "failed to write to tempfile", e))?;
    // Flush and fsync() such that the rename later, if it succeeds, will
    // always point to a valid file.
    temp_file
        .flush()
        .map_err(|e| io_error(ErrorCategory::Internal, "failed to flush tempfile", e))?;
    temp_file.as_file().sync_all().map_err(|e| {
        io_error(
            ErrorCategory::Internal,
            "failed to sync file prior to rename",
            e,
        )
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp_file
            .as_file()
            .set_permissions(fs::Permissions::from_mode(0o600))
            .map_err(|e| {
                io_error(
                    ErrorCategory::Internal,
                    "failed to set tempfile permissions",
                    e,
                )
            })?;
    }

    let persisted = if overwrite {
        temp_file.persist(path)
    } else {
        temp_file.persist_noclobber(path)
    };
    persisted.map_err(|e| {
        if e.error.kind() == io::ErrorKind::AlreadyExists {
            output_exists(path)
        } else {
            LockboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("failed to rename to target file {}", path.display()),
                e,
            )
        }
    })?;
    Ok(())
}

fn io_error(category: ErrorCategory, msg: &str, err: io::Error) -> LockboxError {
    LockboxError::with_kind_and_source(category, ErrorKind::Io, msg, err)
}

fn read_error(path: &Path, err: io::Error) -> LockboxError {
    let category = if err.kind() == io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    LockboxError::with_kind_and_source(
        category,
        ErrorKind::Io,
        format!("failed to read from {}", path.display()),
        err,
    )
}
