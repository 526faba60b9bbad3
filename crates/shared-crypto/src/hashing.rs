//! # SHA-256 Hashing
//!
//! Spec-mandated hash for keyshare identifiers and coordinator election
//! (spec.md §3 — "identified by a SHA-256 of the originating event ID";
//! §4.4 — deterministic coordinator election).

use sha2::{Digest, Sha256};

/// SHA-256 digest (256-bit).
pub type Hash = [u8; 32];

/// Hash a single input with SHA-256.
pub fn sha256(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash multiple inputs concatenated in order, without an intermediate
/// allocation.
pub fn sha256_many(inputs: &[&[u8]]) -> Hash {
    let mut hasher = Sha256::new();
    for input in inputs {
        hasher.update(input);
    }
    hasher.finalize().into()
}

/// SHA-256 rendered as lowercase hex, used for the keyshare storage key.
pub fn sha256_hex(data: &[u8]) -> String {
    hex_encode(&sha256(data))
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        write!(out, "{b:02x}").expect("writing to a String cannot fail");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let h1 = sha256(b"test");
        let h2 = sha256(b"test");
        assert_eq!(h1, h2);
    }

    #[test]
    fn different_inputs_differ() {
        assert_ne!(sha256(b"input1"), sha256(b"input2"));
    }

    #[test]
    fn many_matches_concatenation() {
        let concatenated = sha256(b"abcdef");
        let streamed = sha256_many(&[b"abc", b"def"]);
        assert_eq!(concatenated, streamed);
    }

    #[test]
    fn hex_is_lowercase_and_64_chars() {
        let hex = sha256_hex(b"event-id-123");
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
