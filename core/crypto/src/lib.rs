//! Cryptographic primitives for SealKit.
//!
//! This module provides:
//! - Deterministic AES-SIV encryption, current and legacy formats
//! - Streaming AES-256-GCM with authenticated framing
//! - Legacy AES-256-CBC with an optional Keccak-512 prefix
//! - Migration from legacy formats to AES-SIV
//! - Argon2id password hashing, Keccak-512 and HMAC-SHA256
//! - Random tokens, passwords, masking and GZip helpers
//! - Compact JWE (RSA-OAEP-256 with A256GCM) and RSA JWK issuing
//!
//! # Security Guarantees
//! - Key material is zeroized on drop
//! - No plaintext or key material is ever logged
//! - Tags and hashes are compared in constant time
//!
//! # Keys
//! Components take a [`CryptoConfig`] at construction. Every operation that
//! accepts `key: Option<&str>` uses that Base64 key when given and the
//! configured key otherwise.

pub mod argon2id;
pub mod cbc;
pub mod cipher;
pub mod config;
pub mod gcm;
pub mod gzip;
pub mod hash;
mod io;
pub mod jwe;
pub mod keys;
pub mod mask;
pub mod migration;
pub mod password;
pub mod random;
pub mod siv;
pub mod siv_legacy;

pub use argon2id::{Argon2Id, Argon2Params};
pub use cbc::Aes256Cbc;
pub use cipher::{Algorithm, Cipher, CipherSuite};
pub use config::CryptoConfig;
pub use gcm::Aes256Gcm;
pub use jwe::JwkPair;
pub use keys::{resolve_key, AesKey};
pub use migration::{migrate, AesMigration};
pub use password::CharacterClasses;
pub use siv::Aes256Siv;
pub use siv_legacy::Aes256SivLegacy;

pub use sealkit_common::{Error, Result};
