//! Password hashing using Argon2id.
//!
//! Argon2id is a memory-hard password hashing function that provides
//! resistance to both GPU and time-memory trade-off attacks.
//!
//! Stored hashes have the layout `salt || hash`, where the salt length is
//! [`Argon2Params::salt_size`] and the hash is [`HASH_LENGTH`] bytes.

use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::debug;

use sealkit_common::{Error, Result};

use crate::config::CryptoConfig;
use crate::random;

/// Length of the derived hash in bytes.
pub const HASH_LENGTH: usize = 32;

/// Smallest salt the Argon2 implementation accepts.
const MIN_SALT_SIZE: usize = 8;

/// Parameters for Argon2id hashing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argon2Params {
    /// Salt length in bytes.
    pub salt_size: usize,
    /// Degree of parallelism (lanes).
    pub parallelism: u32,
    /// Number of iterations.
    pub iterations: u32,
    /// Memory cost in KiB (e.g., 131072 = 128 MiB).
    pub memory_kib: u32,
}

impl Argon2Params {
    /// Check the parameters against the Argon2 limits.
    ///
    /// # Errors
    /// - `InvalidInput` if the salt is shorter than 8 bytes
    /// - `InvalidInput` if Argon2 rejects the cost parameters
    pub fn validate(&self) -> Result<()> {
        if self.salt_size < MIN_SALT_SIZE {
            return Err(Error::InvalidInput(format!(
                "Salt size must be at least {} bytes",
                MIN_SALT_SIZE
            )));
        }
        self.to_params().map(|_| ())
    }

    fn to_params(&self) -> Result<Params> {
        Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(HASH_LENGTH),
        )
        .map_err(|e| Error::InvalidInput(format!("Invalid Argon2id parameters: {}", e)))
    }
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            salt_size: 16,
            parallelism: 8,
            iterations: 5,
            memory_kib: 128 * 1024, // 128 MiB
        }
    }
}

/// Argon2id hasher bound to one set of parameters.
#[derive(Debug, Clone)]
pub struct Argon2Id {
    params: Argon2Params,
}

impl Argon2Id {
    /// Create a hasher using the parameters from `config`.
    pub fn new(config: &CryptoConfig) -> Self {
        Self {
            params: config.argon2().clone(),
        }
    }

    /// Create a hasher with explicit parameters.
    ///
    /// # Errors
    /// - `InvalidInput` if the parameters are out of range
    pub fn with_params(params: Argon2Params) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Hash a password with a fresh random salt.
    ///
    /// # Postconditions
    /// - Returns `salt || hash`
    ///
    /// # Security
    /// - Password is not stored or logged
    pub fn hash_password(&self, password: &str) -> Result<Vec<u8>> {
        let salt = random::generate_bytes(self.params.salt_size);
        self.hash_with_salt(password.as_bytes(), &salt)
    }

    /// Verify a password against a stored `salt || hash`.
    ///
    /// This performs constant-time comparison to prevent timing attacks.
    ///
    /// # Errors
    /// - `InvalidInput` if the stored hash is not longer than the salt
    pub fn verify_hash(&self, password: &str, password_hash: &[u8]) -> Result<bool> {
        if password_hash.len() <= self.params.salt_size {
            return Err(Error::InvalidInput(format!(
                "Hash must be longer than {} bytes",
                self.params.salt_size
            )));
        }

        let salt = &password_hash[..self.params.salt_size];
        let candidate = self.hash_with_salt(password.as_bytes(), salt)?;

        let equal: bool = candidate.as_slice().ct_eq(password_hash).into();
        debug!(verified = equal, "Argon2id verification finished");
        Ok(equal)
    }

    fn hash_with_salt(&self, password: &[u8], salt: &[u8]) -> Result<Vec<u8>> {
        let argon2 = Argon2::new(
            Algorithm::Argon2id,
            Version::V0x13,
            self.params.to_params()?,
        );

        let mut output = Vec::with_capacity(salt.len() + HASH_LENGTH);
        output.extend_from_slice(salt);
        output.resize(salt.len() + HASH_LENGTH, 0);
        argon2
            .hash_password_into(password, salt, &mut output[salt.len()..])
            .map_err(|e| Error::Crypto(format!("Argon2id hashing failed: {}", e)))?;

        Ok(output)
    }
}
