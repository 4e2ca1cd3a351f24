//! Hashing primitives: Keccak-512 and HMAC-SHA256.
//!
//! Keccak-512 here is the original Keccak submission (0x01 domain padding),
//! not FIPS 202 SHA3-512. Stored CBC hash prefixes depend on that choice.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use sha3::{Digest, Keccak512};
use subtle::ConstantTimeEq;

use sealkit_common::{Error, Result};

/// Keccak-512 digest size in bytes.
pub const KECCAK512_SIZE: usize = 64;

/// HMAC-SHA256 output size in bytes.
pub const HMAC_SHA256_SIZE: usize = 32;

type HmacSha256 = Hmac<Sha256>;

/// Keccak-512 of `data`.
pub fn keccak512(data: &[u8]) -> [u8; KECCAK512_SIZE] {
    let digest = Keccak512::digest(data);
    let mut out = [0u8; KECCAK512_SIZE];
    out.copy_from_slice(&digest);
    out
}

/// Keccak-512 of the UTF-8 bytes of `data`.
pub fn keccak512_str(data: &str) -> [u8; KECCAK512_SIZE] {
    keccak512(data.as_bytes())
}

/// Check `hash` against the Keccak-512 of `data` in constant time.
pub fn verify_hash(data: &str, hash: &[u8]) -> bool {
    keccak512_str(data).as_slice().ct_eq(hash).into()
}

/// HMAC-SHA256 over the concatenation of `messages`.
pub fn hmac_sha256(key: &[u8], messages: &[&str]) -> Result<[u8; HMAC_SHA256_SIZE]> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key)
        .map_err(|e| Error::Crypto(format!("HMAC initialisation failed: {}", e)))?;
    for message in messages {
        mac.update(message.as_bytes());
    }

    let mut out = [0u8; HMAC_SHA256_SIZE];
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

/// HMAC-SHA256 with a UTF-8 string key.
pub fn hmac_sha256_str_key(key: &str, messages: &[&str]) -> Result<[u8; HMAC_SHA256_SIZE]> {
    hmac_sha256(key.as_bytes(), messages)
}

/// HMAC-SHA256 as lowercase hex.
pub fn hmac_sha256_hex(key: &[u8], messages: &[&str]) -> Result<String> {
    let mac = hmac_sha256(key, messages)?;
    Ok(mac.iter().map(|b| format!("{:02x}", b)).collect())
}

/// HMAC-SHA256 as standard Base64.
pub fn hmac_sha256_base64(key: &[u8], messages: &[&str]) -> Result<String> {
    Ok(STANDARD.encode(hmac_sha256(key, messages)?))
}
