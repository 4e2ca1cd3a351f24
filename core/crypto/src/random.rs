//! Secure random generation.
//!
//! Everything here draws from the thread-local CSPRNG seeded by the OS.

use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
    Engine as _,
};
use rand::{Rng, RngCore};
use zeroize::Zeroize;

use sealkit_common::{Error, Result};

use crate::keys::KEY_LENGTH;

/// Bytes behind a token from [`generate_secure_token`] (256 bits).
pub const SECURE_TOKEN_BYTES: usize = 32;

/// Bytes behind a string from [`generate_short_unique_string`] (96 bits).
pub const SHORT_UNIQUE_BYTES: usize = 12;

/// Default spread for [`generate_id_with_variable_sequence`].
pub const DEFAULT_SEQUENCE_VARIABILITY: u32 = 100;

/// Generate `length` cryptographically secure random bytes.
pub fn generate_bytes(length: usize) -> Vec<u8> {
    let mut buffer = vec![0u8; length];
    rand::thread_rng().fill_bytes(&mut buffer);
    buffer
}

/// Fill `buffer` with cryptographically secure random bytes.
pub fn fill_bytes(buffer: &mut [u8]) {
    rand::thread_rng().fill_bytes(buffer);
}

/// Generate a random AES-256 key as standard Base64.
pub fn generate_aes256_key_string() -> String {
    let mut key = [0u8; KEY_LENGTH];
    fill_bytes(&mut key);
    let encoded = STANDARD.encode(key);
    key.zeroize();
    encoded
}

/// Generate a 256-bit URL-safe token (Base64 URL alphabet, no padding).
pub fn generate_secure_token() -> String {
    URL_SAFE_NO_PAD.encode(generate_bytes(SECURE_TOKEN_BYTES))
}

/// Generate a 96-bit URL-safe identifier (Base64 URL alphabet, no padding).
pub fn generate_short_unique_string() -> String {
    URL_SAFE_NO_PAD.encode(generate_bytes(SHORT_UNIQUE_BYTES))
}

/// Produce the next id in a sequence that is increasing but not guessable.
///
/// The step is uniform in `[variability / 25, variability]`.
///
/// # Errors
/// - `InvalidInput` if the next id would exceed `i64::MAX`
pub fn generate_id_with_variable_sequence(previous_id: i64, variability: u32) -> Result<i64> {
    let min = i64::from(variability / 25);
    let max = i64::from(variability);
    let step = rand::thread_rng().gen_range(min..=max);
    previous_id
        .checked_add(step)
        .ok_or_else(|| Error::InvalidInput(format!("Id sequence overflow after {}", previous_id)))
}
