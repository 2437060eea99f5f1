//! Golden test vector validation
//!
//! The vectors were produced by an independent scrypt + AES-256-GCM
//! implementation and pin the exact container layout.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use lockbox::container::{self, ContainerHeader};
use lockbox::params::{HEADER_LEN, NONCE_LEN, SALT_LEN};
use lockbox::{CryptoParams, ErrorKind};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct GoldenVector {
    plaintext: String,
    ciphertext: String,
    passphrase: String,
    nonce: String,
    salt: String,
    comment: String,
}

struct Decoded {
    plaintext: Vec<u8>,
    container: Vec<u8>,
    passphrase: Vec<u8>,
    salt: [u8; SALT_LEN],
    nonce: [u8; NONCE_LEN],
}

fn decode(vector: &GoldenVector) -> Decoded {
    let field = |name: &str, value: &str| {
        BASE64_STANDARD
            .decode(value)
            .unwrap_or_else(|e| panic!("{}: bad base64 in {}: {}", vector.comment, name, e))
    };
    Decoded {
        plaintext: field("plaintext", &vector.plaintext),
        container: field("ciphertext", &vector.ciphertext),
        passphrase: field("passphrase", &vector.passphrase),
        salt: field("salt", &vector.salt)
            .try_into()
            .expect("salt must be 16 bytes"),
        nonce: field("nonce", &vector.nonce)
            .try_into()
            .expect("nonce must be 12 bytes"),
    }
}

fn load_golden_vectors() -> Vec<GoldenVector> {
    let json_data = include_str!("../testdata/golden-vectors.json");
    serde_json::from_str(json_data).expect("failed to parse golden vectors")
}

#[test]
fn test_golden_vectors_seal_exactly() {
    let params = CryptoParams::default();
    let vectors = load_golden_vectors();
    assert!(!vectors.is_empty(), "No golden vectors were tested");

    for vector in &vectors {
        let v = decode(vector);
        let sealed =
            container::seal_with(&params, &v.passphrase, &v.plaintext, &v.salt, &v.nonce)
                .unwrap_or_else(|e| panic!("{}: failed to seal: {}", vector.comment, e));

        assert_eq!(sealed, v.container, "ciphertext mismatch: {}", vector.comment);
        assert_eq!(sealed.len(), HEADER_LEN + v.plaintext.len());
    }
}

#[test]
fn test_golden_vectors_open() {
    let params = CryptoParams::default();

    for vector in &load_golden_vectors() {
        let v = decode(vector);

        let (header, _) = ContainerHeader::parse(&v.container).unwrap();
        assert_eq!(header.salt, v.salt, "{}", vector.comment);
        assert_eq!(header.nonce, v.nonce, "{}", vector.comment);

        let opened = container::open(&params, &v.passphrase, &v.container)
            .unwrap_or_else(|e| panic!("{}: failed to open: {}", vector.comment, e));
        assert_eq!(*opened, v.plaintext, "plaintext mismatch: {}", vector.comment);
    }
}

#[test]
fn test_golden_vectors_reject_wrong_passphrase() {
    let params = CryptoParams::default();

    for vector in &load_golden_vectors() {
        let v = decode(vector);
        let mut wrong = v.passphrase.clone();
        wrong.push(b'!');

        let err = container::open(&params, &wrong, &v.container)
            .expect_err("wrong passphrase must not open");
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed), "{}", vector.comment);
    }
}
