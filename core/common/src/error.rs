//! Common error types for SealKit.

use thiserror::Error;

/// Top-level error type for SealKit operations.
///
/// Every cryptographic failure is final for the call that produced it;
/// nothing in the library retries.
#[derive(Debug, Error)]
pub enum Error {
    /// Key missing, not Base64, or not 32 bytes once decoded.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Ciphertext is structurally unusable (too short, bad header, oversize frame).
    #[error("Invalid ciphertext: {0}")]
    InvalidCipherText(String),

    /// Tag or synthetic IV did not verify. No plaintext is released.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// GCM stream ended before its terminal frame.
    #[error("Missing terminal authentication frame")]
    MissingTerminator,

    /// GCM stream has bytes after its terminal frame.
    #[error("Trailing data after terminal frame")]
    TrailingData,

    /// PKCS7 unpadding failed, usually a wrong key or corrupted CBC data.
    #[error("Padding error")]
    Padding,

    /// Decrypted bytes are not valid UTF-8.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Primitive failure that has no more specific kind.
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for failures that indicate tampering or a wrong key rather
    /// than a malformed call.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(
            self,
            Error::AuthenticationFailed
                | Error::MissingTerminator
                | Error::TrailingData
                | Error::Padding
        )
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
