//! Lockbox - Password-based file encryption using scrypt and AES-256-GCM

#![forbid(unsafe_code)]

pub mod container;
pub mod error;
pub mod file_ops;
pub mod kdf;
pub mod params;
pub mod passphrase;
pub mod varmor;

pub use container::{open, seal};
pub use error::{ErrorCategory, ErrorKind, LockboxError, Result};
pub use params::CryptoParams;
