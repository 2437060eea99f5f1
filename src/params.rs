//! Fixed cryptographic policy
//!
//! Field widths are part of the on-disk format and live here as constants.
//! The scrypt cost factors are carried in [`CryptoParams`], which is built
//! once by the caller and handed to every seal/open so that a future cost
//! change touches a single value.

use crate::error::{ErrorCategory, ErrorKind, LockboxError, Result};

/// Length of salt in bytes
pub const SALT_LEN: usize = 16;

/// Length of nonce in bytes
pub const NONCE_LEN: usize = 12;

/// Length of the AEAD authentication tag in bytes
pub const TAG_LEN: usize = 16;

/// Length of derived key in bytes
pub const KEY_LEN: usize = 32;

/// Fixed-width prefix of every container: salt + nonce + tag
pub const HEADER_LEN: usize = SALT_LEN + NONCE_LEN + TAG_LEN;

/// log2 of the scrypt N parameter (CPU/memory cost), N = 2^14
const SCRYPT_LOG_N: u8 = 14;

/// scrypt r parameter (block size)
const SCRYPT_R: u32 = 8;

/// scrypt p parameter (parallelization)
const SCRYPT_P: u32 = 1;

/// scrypt cost factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    log_n: u8,
    r: u32,
    p: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            log_n: SCRYPT_LOG_N,
            r: SCRYPT_R,
            p: SCRYPT_P,
        }
    }
}

impl KdfParams {
    /// Builds a parameter set, rejecting anything scrypt itself would refuse.
    pub fn new(log_n: u8, r: u32, p: u32) -> Result<Self> {
        let params = Self { log_n, r, p };
        params.to_scrypt()?;
        Ok(params)
    }

    pub fn log_n(&self) -> u8 {
        self.log_n
    }

    pub fn r(&self) -> u32 {
        self.r
    }

    pub fn p(&self) -> u32 {
        self.p
    }

    pub(crate) fn to_scrypt(self) -> Result<scrypt::Params> {
        scrypt::Params::new(self.log_n, self.r, self.p, KEY_LEN).map_err(|e| {
            LockboxError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::KeyDerivation,
                format!(
                    "invalid scrypt parameters (log_n={}, r={}, p={})",
                    self.log_n, self.r, self.p
                ),
                e,
            )
        })
    }
}

/// Process-wide cryptographic configuration.
///
/// There is no negotiation: containers do not record which parameters
/// sealed them, so opening must use the same value that sealing did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CryptoParams {
    pub kdf: KdfParams,
}

impl CryptoParams {
    pub fn new(kdf: KdfParams) -> Self {
        Self { kdf }
    }
}
