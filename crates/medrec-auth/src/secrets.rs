//! One-time secrets: email verification codes and password reset tokens.
//!
//! Reset tokens are 256-bit random values, base64url-encoded without
//! padding so they can travel in a URL path. Only their SHA-256 digest is
//! persisted.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};

/// Generate a 6-digit numeric verification code.
#[must_use]
pub fn generate_verification_code() -> String {
    OsRng.gen_range(100_000..1_000_000u32).to_string()
}

/// Generate a URL-safe reset token with 256 bits of entropy.
#[must_use]
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hex-encoded SHA-256 of a reset token, the form kept in storage.
#[must_use]
pub fn hash_reset_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Compares two codes without short-circuiting on the first mismatch.
#[must_use]
pub fn codes_match(expected: &str, provided: &str) -> bool {
    let (a, b) = (expected.as_bytes(), provided.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
