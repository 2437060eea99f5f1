//! Authenticated container: scrypt + AES-256-GCM
//!
//! This module implements passphrase-based encryption using:
//! - scrypt for key derivation from passphrase
//! - AES-256-GCM with a detached tag for authenticated encryption
//!
//! The binary format is:
//! - salt: 16 bytes
//! - nonce: 12 bytes
//! - tag: 16 bytes
//! - ciphertext: variable length, same as the plaintext
//!
//! There is no magic, version or length field. The ciphertext runs to the
//! end of the input.

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce, Tag};
use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use crate::error::{ErrorCategory, ErrorKind, LockboxError, Result};
use crate::kdf::{DerivedKey, derive_key};
use crate::params::{CryptoParams, HEADER_LEN, NONCE_LEN, SALT_LEN, TAG_LEN};

/// The fixed-width prefix of a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHeader {
    pub salt: [u8; SALT_LEN],
    pub nonce: [u8; NONCE_LEN],
    pub tag: [u8; TAG_LEN],
}

impl ContainerHeader {
    /// Splits `data` into its header and ciphertext tail.
    ///
    /// Fails with `MalformedContainer` if `data` is shorter than the header.
    pub fn parse(data: &[u8]) -> Result<(Self, &[u8])> {
        if data.len() < HEADER_LEN {
            return Err(LockboxError::with_kind(
                ErrorCategory::User,
                ErrorKind::MalformedContainer,
                format!(
                    "input too short to be a lockbox container ({} bytes, need at least {})",
                    data.len(),
                    HEADER_LEN
                ),
            ));
        }

        let (salt, rest) = data.split_at(SALT_LEN);
        let (nonce, rest) = rest.split_at(NONCE_LEN);
        let (tag, ciphertext) = rest.split_at(TAG_LEN);

        let header = Self {
            salt: to_array(salt)?,
            nonce: to_array(nonce)?,
            tag: to_array(tag)?,
        };
        Ok((header, ciphertext))
    }

    /// Appends the header bytes in on-disk order.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.tag);
    }
}

fn to_array<const N: usize>(bytes: &[u8]) -> Result<[u8; N]> {
    bytes.try_into().map_err(|_| {
        LockboxError::new(
            ErrorCategory::Internal,
            format!("expected {} header bytes, got {}", N, bytes.len()),
        )
    })
}

fn cipher_for(key: &DerivedKey) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()))
}

/// Seal plaintext with a password using a fresh random salt and nonce.
///
/// Returns `salt(16) + nonce(12) + tag(16) + ciphertext`, always
/// `HEADER_LEN + plaintext.len()` bytes long.
pub fn seal(params: &CryptoParams, password: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    seal_with(params, password, plaintext, &salt, &nonce)
}

/// Seal plaintext with a password using the provided salt and nonce.
///
/// This function is ONLY for generating deterministic test output.
/// NEVER use this in production - always use `seal()` which generates
/// a random salt and nonce.
pub fn seal_with(
    params: &CryptoParams,
    password: &[u8],
    plaintext: &[u8],
    salt: &[u8; SALT_LEN],
    nonce: &[u8; NONCE_LEN],
) -> Result<Vec<u8>> {
    let key = derive_key(password, salt, &params.kdf)?;

    let mut header = ContainerHeader {
        salt: *salt,
        nonce: *nonce,
        tag: [0u8; TAG_LEN],
    };

    // Encrypted in place; wiped on drop whether or not sealing succeeds.
    let mut body = Zeroizing::new(plaintext.to_vec());
    let tag = cipher_for(&key)
        .encrypt_in_place_detached(Nonce::from_slice(nonce), b"", &mut body[..])
        .map_err(|_| {
            LockboxError::with_kind(
                ErrorCategory::Internal,
                ErrorKind::Cipher,
                "AES-256-GCM refused to seal input",
            )
        })?;
    header.tag.copy_from_slice(&tag);

    let mut output = Vec::with_capacity(HEADER_LEN + body.len());
    header.write_to(&mut output);
    output.extend_from_slice(&body);

    tracing::debug!(
        plaintext_len = plaintext.len(),
        container_len = output.len(),
        "sealed container"
    );
    Ok(output)
}

/// Open a container with a password.
///
/// The tag is verified before any plaintext is produced. A wrong password
/// and every kind of corruption all surface as the same
/// `AuthenticationFailed` error.
pub fn open(
    params: &CryptoParams,
    password: &[u8],
    container: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    let (header, ciphertext) = ContainerHeader::parse(container)?;

    let key = derive_key(password, &header.salt, &params.kdf)?;

    let mut buffer = Zeroizing::new(ciphertext.to_vec());
    cipher_for(&key)
        .decrypt_in_place_detached(
            Nonce::from_slice(&header.nonce),
            b"",
            &mut buffer[..],
            Tag::from_slice(&header.tag),
        )
        .map_err(|_| {
            tracing::debug!(container_len = container.len(), "container failed authentication");
            LockboxError::with_kind(
                ErrorCategory::User,
                ErrorKind::AuthenticationFailed,
                "bad passphrase or corrupted/tampered input",
            )
        })?;

    tracing::debug!(plaintext_len = buffer.len(), "opened container");
    Ok(buffer)
}
