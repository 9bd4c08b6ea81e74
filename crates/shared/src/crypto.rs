//! Cryptographic utilities for session token digests and invite codes.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Invite code alphabet, restricted to characters that cannot be confused
/// with each other when read aloud or copied by hand (no 0/O, 1/I/l).
pub const INVITE_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of generated invite codes.
pub const INVITE_CODE_LENGTH: usize = 8;

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generates a random invite code from the unambiguous alphabet.
pub fn generate_invite_code() -> String {
    let mut rng = rand::thread_rng();

    (0..INVITE_CODE_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..INVITE_CODE_ALPHABET.len());
            INVITE_CODE_ALPHABET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        let hash = sha256_hex("test");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn test_sha256_hex_empty_string() {
        let hash = sha256_hex("");
        assert_eq!(hash.len(), 64);
        // SHA256 of empty string
        assert_eq!(
            hash,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_sha256_hex_deterministic() {
        let hash1 = sha256_hex("same_input");
        let hash2 = sha256_hex("same_input");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_sha256_hex_different_inputs() {
        let hash1 = sha256_hex("input1");
        let hash2 = sha256_hex("input2");
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_generate_invite_code_length() {
        let code = generate_invite_code();
        assert_eq!(code.len(), INVITE_CODE_LENGTH);
    }

    #[test]
    fn test_generate_invite_code_charset() {
        let code = generate_invite_code();
        assert!(!code.contains('0'));
        assert!(!code.contains('O'));
        assert!(!code.contains('1'));
        assert!(!code.contains('I'));
        assert!(!code.contains('l'));
        assert!(code
            .bytes()
            .all(|b| INVITE_CODE_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_generate_invite_code_unique() {
        let code1 = generate_invite_code();
        let code2 = generate_invite_code();
        // Collisions are possible but astronomically unlikely for 32^8
        assert_ne!(code1, code2);
    }
}
