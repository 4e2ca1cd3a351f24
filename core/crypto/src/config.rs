//! Library configuration.
//!
//! A [`CryptoConfig`] is built once by the hosting application and handed to
//! each component constructor. It is immutable after construction; a
//! component keeps its own copy of the default key.

use serde::{Deserialize, Serialize};

use sealkit_common::{Error, Result};

use crate::argon2id::Argon2Params;
use crate::keys::{self, AesKey};

/// Configuration shared by the SealKit components.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoConfig {
    /// Default AES key used when a call does not pass one explicitly.
    #[serde(default, with = "keys::optional_base64")]
    aes_key: Option<AesKey>,
    /// Argon2id password hashing parameters.
    #[serde(default)]
    argon2: Argon2Params,
}

impl CryptoConfig {
    /// Create an empty configuration: no default key, default Argon2id
    /// parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default AES key from its Base64 form.
    ///
    /// # Errors
    /// - `InvalidKey` if the key is not Base64 or not 32 bytes
    pub fn with_aes_key(mut self, key: &str) -> Result<Self> {
        self.aes_key = Some(keys::decode(key)?);
        Ok(self)
    }

    /// Set the default AES key from an already decoded key.
    pub fn with_key(mut self, key: AesKey) -> Self {
        self.aes_key = Some(key);
        self
    }

    /// Set the Argon2id parameters.
    ///
    /// # Errors
    /// - `InvalidInput` if the parameters are out of range
    pub fn with_argon2(mut self, params: Argon2Params) -> Result<Self> {
        params.validate()?;
        self.argon2 = params;
        Ok(self)
    }

    /// The configured default key, if any.
    pub fn aes_key(&self) -> Option<&AesKey> {
        self.aes_key.as_ref()
    }

    /// The Argon2id parameters.
    pub fn argon2(&self) -> &Argon2Params {
        &self.argon2
    }

    /// Serialize configuration to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize configuration from JSON.
    ///
    /// The key is validated while parsing; Argon2id parameters are range
    /// checked afterwards.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))?;
        config.argon2.validate()?;
        Ok(config)
    }

    /// Serialize to bytes for storage.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let config: Self =
            serde_json::from_slice(bytes).map_err(|e| Error::Serialization(e.to_string()))?;
        config.argon2.validate()?;
        Ok(config)
    }
}
