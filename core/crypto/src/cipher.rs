//! Common interface over the symmetric formats.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use sealkit_common::{Error, Result};

use crate::cbc::Aes256Cbc;
use crate::config::CryptoConfig;
use crate::gcm::Aes256Gcm;
use crate::siv::Aes256Siv;
use crate::siv_legacy::Aes256SivLegacy;

/// Ciphertext format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// AES-256-CBC, optionally prefixed with a Keccak-512 hash.
    CbcLegacy { include_hash: bool },
    /// Chunked AES-256-GCM container.
    Gcm,
    /// Deterministic AES-SIV.
    Siv,
    /// AES-SIV as written by older releases.
    SivLegacy,
}

impl Algorithm {
    /// Every supported format.
    pub const ALL: [Algorithm; 5] = [
        Algorithm::CbcLegacy { include_hash: true },
        Algorithm::CbcLegacy {
            include_hash: false,
        },
        Algorithm::Gcm,
        Algorithm::Siv,
        Algorithm::SivLegacy,
    ];

    /// Stable identifier, e.g. for configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::CbcLegacy { include_hash: true } => "cbc-legacy-hashed",
            Algorithm::CbcLegacy {
                include_hash: false,
            } => "cbc-legacy",
            Algorithm::Gcm => "gcm",
            Algorithm::Siv => "siv",
            Algorithm::SivLegacy => "siv-legacy",
        }
    }

    /// Whether equal plaintexts encrypt to equal ciphertexts.
    pub fn is_deterministic(&self) -> bool {
        matches!(self, Algorithm::Siv | Algorithm::SivLegacy)
    }

    /// Whether tampering is detected on decryption.
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Algorithm::CbcLegacy { .. })
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Algorithm::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown algorithm: {}", s)))
    }
}

/// Byte-level encryption shared by every format.
///
/// `key` is a Base64 AES-256 key that overrides the configured default for
/// this call only.
pub trait Cipher: Send + Sync {
    /// Format this cipher reads and writes.
    fn algorithm(&self) -> Algorithm;

    /// Encrypt `plaintext`.
    ///
    /// # Errors
    /// - `InvalidKey` if neither `key` nor a configured default is usable
    fn encrypt(&self, plaintext: &[u8], key: Option<&str>) -> Result<Vec<u8>>;

    /// Decrypt `ciphertext`.
    ///
    /// # Errors
    /// - `InvalidKey` if neither `key` nor a configured default is usable
    /// - Format-specific integrity and structure errors
    fn decrypt(&self, ciphertext: &[u8], key: Option<&str>) -> Result<Vec<u8>>;
}

/// One instance of every format, built from one configuration.
#[derive(Debug, Clone)]
pub struct CipherSuite {
    cbc_hashed: Aes256Cbc,
    cbc_plain: Aes256Cbc,
    gcm: Aes256Gcm,
    siv: Aes256Siv,
    siv_legacy: Aes256SivLegacy,
}

impl CipherSuite {
    /// Build every format with the key held by `config`.
    pub fn new(config: &CryptoConfig) -> Self {
        Self {
            cbc_hashed: Aes256Cbc::new(config).with_hash(true),
            cbc_plain: Aes256Cbc::new(config).with_hash(false),
            gcm: Aes256Gcm::new(config),
            siv: Aes256Siv::new(config),
            siv_legacy: Aes256SivLegacy::new(config),
        }
    }

    /// Cipher for `algorithm`.
    pub fn cipher(&self, algorithm: Algorithm) -> &dyn Cipher {
        match algorithm {
            Algorithm::CbcLegacy { include_hash: true } => &self.cbc_hashed,
            Algorithm::CbcLegacy {
                include_hash: false,
            } => &self.cbc_plain,
            Algorithm::Gcm => &self.gcm,
            Algorithm::Siv => &self.siv,
            Algorithm::SivLegacy => &self.siv_legacy,
        }
    }

    /// CBC with the hash prefix.
    pub fn cbc(&self) -> &Aes256Cbc {
        &self.cbc_hashed
    }

    /// Streaming GCM.
    pub fn gcm(&self) -> &Aes256Gcm {
        &self.gcm
    }

    /// Current SIV.
    pub fn siv(&self) -> &Aes256Siv {
        &self.siv
    }

    /// Legacy SIV, for reading old values.
    pub fn siv_legacy(&self) -> &Aes256SivLegacy {
        &self.siv_legacy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suite() -> CipherSuite {
        CipherSuite::new(&CryptoConfig::new().with_key(crate::keys::AesKey::generate()))
    }

    #[test]
    fn test_every_algorithm_round_trips() {
        let suite = suite();
        for algorithm in Algorithm::ALL {
            let cipher = suite.cipher(algorithm);
            assert_eq!(cipher.algorithm(), algorithm);

            let encrypted = cipher.encrypt(b"suite payload", None).unwrap();
            assert_eq!(cipher.decrypt(&encrypted, None).unwrap(), b"suite payload");
        }
    }

    #[test]
    fn test_determinism_flags_match_behaviour() {
        let suite = suite();
        for algorithm in Algorithm::ALL {
            let cipher = suite.cipher(algorithm);
            let a = cipher.encrypt(b"same input", None).unwrap();
            let b = cipher.encrypt(b"same input", None).unwrap();
            assert_eq!(a == b, algorithm.is_deterministic(), "{}", algorithm);
        }
    }

    #[test]
    fn test_name_round_trip() {
        for algorithm in Algorithm::ALL {
            assert_eq!(algorithm.to_string().parse::<Algorithm>().unwrap(), algorithm);
        }
        assert!(matches!(
            "rot13".parse::<Algorithm>(),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_authenticated_flag() {
        assert!(!Algorithm::CbcLegacy { include_hash: true }.is_authenticated());
        assert!(Algorithm::Gcm.is_authenticated());
        assert!(Algorithm::Siv.is_authenticated());
    }

    #[test]
    fn test_explicit_key_through_trait() {
        let suite = CipherSuite::new(&CryptoConfig::new());
        let key = crate::random::generate_aes256_key_string();
        for algorithm in Algorithm::ALL {
            let cipher = suite.cipher(algorithm);
            assert!(matches!(
                cipher.encrypt(b"x", None),
                Err(Error::InvalidKey(_))
            ));
            let encrypted = cipher.encrypt(b"x", Some(&key)).unwrap();
            assert_eq!(cipher.decrypt(&encrypted, Some(&key)).unwrap(), b"x");
        }
    }

    #[test]
    fn test_cipher_is_object_safe_and_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CipherSuite>();
        let suite = suite();
        let boxed: Vec<&dyn Cipher> = Algorithm::ALL.iter().map(|a| suite.cipher(*a)).collect();
        assert_eq!(boxed.len(), 5);
    }

    #[test]
    fn test_serde_representation() {
        let json = serde_json::to_string(&Algorithm::Siv).unwrap();
        assert_eq!(json, "\"siv\"");
        let cbc: Algorithm =
            serde_json::from_str(r#"{"cbc_legacy":{"include_hash":false}}"#).unwrap();
        assert_eq!(cbc, Algorithm::CbcLegacy { include_hash: false });
    }
}
