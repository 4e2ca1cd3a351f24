//! AES key handling with secure memory.
//!
//! Keys cross every public boundary as Base64 strings and live inside the
//! library as [`AesKey`], which zeroizes its bytes on drop so key material
//! does not persist in memory after use.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use sealkit_common::{Error, Result};

/// Length of encryption keys in bytes (256-bit).
pub const KEY_LENGTH: usize = 32;

/// Length of each SIV sub-key (CMAC half and CTR half).
pub(crate) const HALF_KEY_LENGTH: usize = KEY_LENGTH / 2;

/// A 256-bit AES key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AesKey {
    key: [u8; KEY_LENGTH],
}

impl AesKey {
    /// Create a key from raw bytes.
    pub fn from_bytes(key: [u8; KEY_LENGTH]) -> Self {
        Self { key }
    }

    /// Decode a Base64 key string.
    ///
    /// # Errors
    /// - `InvalidKey` if the string is empty, not Base64, or not 32 bytes
    pub fn from_base64(key: &str) -> Result<Self> {
        decode(key)
    }

    /// Get the key bytes.
    ///
    /// # Security
    /// The returned slice should be used immediately and not stored.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }

    /// Encode the key as standard padded Base64.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.key)
    }

    /// Generate a random key.
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut key = [0u8; KEY_LENGTH];
        rand::thread_rng().fill_bytes(&mut key);
        Self { key }
    }

    /// Split into the (CMAC, CTR) halves used by the SIV constructions.
    pub(crate) fn siv_halves(&self) -> (&[u8], &[u8]) {
        self.key.split_at(HALF_KEY_LENGTH)
    }
}

impl PartialEq for AesKey {
    fn eq(&self, other: &Self) -> bool {
        self.key.ct_eq(&other.key).into()
    }
}

impl Eq for AesKey {}

impl fmt::Debug for AesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AesKey([REDACTED])")
    }
}

/// Check that `key` is Base64 and decodes to exactly [`KEY_LENGTH`] bytes.
pub fn validate(key: &str) -> Result<()> {
    decode(key).map(|_| ())
}

/// Decode a Base64 key string after validating it.
///
/// # Errors
/// - `InvalidKey` if the string is empty or whitespace
/// - `InvalidKey` if the string is not valid Base64
/// - `InvalidKey` if the decoded length is not [`KEY_LENGTH`]
pub fn decode(key: &str) -> Result<AesKey> {
    if key.trim().is_empty() {
        return Err(Error::InvalidKey("Key must not be empty".to_string()));
    }

    let mut bytes = STANDARD
        .decode(key)
        .map_err(|_| Error::InvalidKey("Key must be valid Base64".to_string()))?;

    if bytes.len() != KEY_LENGTH {
        let len = bytes.len();
        bytes.zeroize();
        return Err(Error::InvalidKey(format!(
            "Key must be {} bytes (256 bits), got {}",
            KEY_LENGTH, len
        )));
    }

    let mut key = [0u8; KEY_LENGTH];
    key.copy_from_slice(&bytes);
    bytes.zeroize();
    Ok(AesKey::from_bytes(key))
}

/// Encode a key as Base64.
pub fn encode(key: &AesKey) -> String {
    key.to_base64()
}

/// Pick the key for one call.
///
/// An explicit key always wins and is validated; otherwise the configured
/// default is used.
///
/// # Errors
/// - `InvalidKey` if the explicit key is invalid
/// - `InvalidKey` if there is neither an explicit nor a default key
pub fn resolve_key(explicit: Option<&str>, default: Option<&AesKey>) -> Result<AesKey> {
    match (explicit, default) {
        (Some(key), _) => decode(key),
        (None, Some(key)) => Ok(key.clone()),
        (None, None) => Err(Error::InvalidKey(
            "No key configured; provide a key or set one in CryptoConfig".to_string(),
        )),
    }
}

/// Serde adapter storing an optional key as a Base64 string.
pub(crate) mod optional_base64 {
    use serde::{Deserialize, Deserializer, Serializer};
    use zeroize::Zeroize;

    use super::AesKey;

    pub fn serialize<S: Serializer>(
        key: &Option<AesKey>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match key {
            Some(key) => serializer.serialize_some(&key.to_base64()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Option<AesKey>, D::Error> {
        let Some(mut raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let key = super::decode(&raw).map_err(serde::de::Error::custom);
        raw.zeroize();
        key.map(Some)
    }
}
