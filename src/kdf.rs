//! Password-based key derivation using scrypt

use std::fmt;

use zeroize::Zeroizing;

use crate::error::{ErrorCategory, ErrorKind, LockboxError, Result};
use crate::params::{KEY_LEN, KdfParams, SALT_LEN};

/// A 32-byte symmetric key derived from a password.
///
/// The bytes are wiped when the value is dropped.
pub struct DerivedKey(Zeroizing<[u8; KEY_LEN]>);

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey(<redacted>)")
    }
}

/// Derive a 32-byte key from a password and salt using scrypt.
///
/// Deterministic for a given (password, salt, params). The salt width is
/// enforced by the type; callers parsing untrusted input must check length
/// before getting here.
pub fn derive_key(
    password: &[u8],
    salt: &[u8; SALT_LEN],
    params: &KdfParams,
) -> Result<DerivedKey> {
    let scrypt_params = params.to_scrypt()?;

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    scrypt::scrypt(password, salt, &scrypt_params, &mut key[..]).map_err(|e| {
        LockboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::KeyDerivation,
            "scrypt key derivation failed",
            e,
        )
    })?;

    Ok(DerivedKey(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    #[test]
    fn test_deterministic() {
        let salt = [42u8; SALT_LEN];
        let params = KdfParams::default();

        let k1 = derive_key(b"password", &salt, &params).unwrap();
        let k2 = derive_key(b"password", &salt, &params).unwrap();

        assert_eq!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_salt_changes_key() {
        let params = KdfParams::default();

        let k1 = derive_key(b"password", &[1u8; SALT_LEN], &params).unwrap();
        let k2 = derive_key(b"password", &[2u8; SALT_LEN], &params).unwrap();

        assert_ne!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_params_change_key() {
        let salt = [7u8; SALT_LEN];
        let cheap = KdfParams::new(10, 8, 1).unwrap();

        let k1 = derive_key(b"pw", &salt, &cheap).unwrap();
        let k2 = derive_key(b"pw", &salt, &KdfParams::default()).unwrap();

        assert_ne!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_known_answer() {
        // Same inputs through Python's hashlib.scrypt(n=16384, r=8, p=1, dklen=32).
        let key = derive_key(b"a", &[b'b'; SALT_LEN], &KdfParams::default()).unwrap();
        assert_eq!(
            hex(key.as_bytes()),
            "fa7a48fce91313520c4b8baf9a01043a3c619fdee1363bbd455a83c01c7ea3ca"
        );
    }

    #[test]
    fn test_empty_password_still_derives() {
        let key = derive_key(b"", &[0u8; SALT_LEN], &KdfParams::default()).unwrap();
        assert_ne!(key.as_bytes(), &[0u8; KEY_LEN]);
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = derive_key(b"pw", &[0u8; SALT_LEN], &KdfParams::default()).unwrap();
        assert_eq!(format!("{:?}", key), "DerivedKey(<redacted>)");
    }
}
