//! Versioned armoring for binary containers
//!
//! Optional text form of a container, for pasting into places that only
//! carry text. The armored format is:
//! - Free of whitespace (including newlines)
//! - Safe to embed in URLs
//! - Safe to pass unescaped in a POSIX shell

use crate::error::{ErrorCategory, ErrorKind, LockboxError, Result};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

/// Magic prefix for all armor versions
const MAGIC_PREFIX: &str = "lockbox";

/// Version 1 magic marker
const V1_MAGIC: &str = "lockbox1:";

/// Wrap bytes in armor, returning the armored string
///
/// Format: lockbox1:{base64url-no-padding}
pub fn wrap(body: &[u8]) -> String {
    let encoded = URL_SAFE_NO_PAD.encode(body);
    format!("{}{}", V1_MAGIC, encoded)
}

/// Unwrap an armored string, returning the original bytes
///
/// Surrounding whitespace (such as a trailing newline added by an editor)
/// is ignored.
pub fn unwrap(armored: &str) -> Result<Vec<u8>> {
    let armored = armored.trim();
    if armored.len() < V1_MAGIC.len() {
        return Err(LockboxError::with_kind(
            ErrorCategory::User,
            ErrorKind::ArmoringInvalid,
            "input size smaller than magic marker; likely truncated",
        ));
    }

    if let Some(encoded) = armored.strip_prefix(V1_MAGIC) {
        let body = URL_SAFE_NO_PAD.decode(encoded).map_err(|e| {
            LockboxError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::ArmoringDecode,
                format!("base64 decoding failed: {}", e),
                e,
            )
        })?;
        Ok(body)
    } else if armored.starts_with(MAGIC_PREFIX) {
        Err(LockboxError::with_kind(
            ErrorCategory::User,
            ErrorKind::ArmoringFromFuture,
            "input claims to be lockbox armor, but not a version we support",
        ))
    } else {
        Err(LockboxError::with_kind(
            ErrorCategory::User,
            ErrorKind::ArmoringInvalid,
            "input unrecognized as armored lockbox data",
        ))
    }
}
