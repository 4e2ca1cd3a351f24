//! Streaming AES-256-GCM encryption for large payloads.
//!
//! Input is split into chunks; each chunk becomes one authenticated frame.
//! A final zero-length frame authenticates the end of the stream, so a
//! truncated container is rejected instead of decrypting to a prefix.
//!
//! # Format
//! ```text
//! header:  "PGCM" | version:1 | base_nonce:12 | chunk_size:4 LE
//! frame:   len:4 LE | tag:16 | ciphertext:len
//! end:     0:4 LE   | tag:16
//! ```
//!
//! Every frame uses the full header as associated data. The nonce for frame
//! `i` is the base nonce with `LE64(i)` XORed into its last 8 bytes.

use std::io::{Read, Write};

use aes_gcm::{
    aead::{AeadInPlace, KeyInit},
    Aes256Gcm as GcmCore, Nonce, Tag,
};
use tracing::{debug, warn};

use sealkit_common::{Error, Result};

use crate::cipher::{Algorithm, Cipher};
use crate::config::CryptoConfig;
use crate::io::read_full;
use crate::keys::{resolve_key, AesKey};
use crate::random;

/// Container magic.
pub const MAGIC: &[u8; 4] = b"PGCM";

/// Container format version.
pub const VERSION: u8 = 1;

/// GCM nonce size (12 bytes).
pub const NONCE_SIZE: usize = 12;

/// GCM tag size (16 bytes).
pub const TAG_SIZE: usize = 16;

/// Header size: magic (4) + version (1) + base nonce (12) + chunk size (4).
pub const HEADER_SIZE: usize = MAGIC.len() + 1 + NONCE_SIZE + 4;

/// Default chunk size for streaming encryption (64 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Largest chunk size a container may declare (16 MiB).
pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;

/// Frame prefix: length (4) + tag (16).
const FRAME_PREFIX_SIZE: usize = 4 + TAG_SIZE;

/// Streaming AES-256-GCM.
#[derive(Debug, Clone)]
pub struct Aes256Gcm {
    default_key: Option<AesKey>,
    chunk_size: usize,
}

impl Aes256Gcm {
    /// Create a GCM component using the default key from `config`.
    pub fn new(config: &CryptoConfig) -> Self {
        Self {
            default_key: config.aes_key().cloned(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Set custom chunk size.
    ///
    /// # Errors
    /// - `InvalidInput` unless `0 < size <= MAX_CHUNK_SIZE`
    pub fn with_chunk_size(mut self, size: usize) -> Result<Self> {
        if size == 0 || size > MAX_CHUNK_SIZE {
            return Err(Error::InvalidInput(format!(
                "Chunk size must be between 1 and {} bytes",
                MAX_CHUNK_SIZE
            )));
        }
        self.chunk_size = size;
        Ok(self)
    }

    /// Chunk size used when encrypting.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Encrypt data from reader and write the container to writer.
    ///
    /// # Postconditions
    /// - Exactly one terminal frame is written, always last
    /// - Returns the number of plaintext bytes consumed
    ///
    /// # Errors
    /// - `InvalidKey` if no usable key is available
    /// - I/O errors from reader/writer
    pub fn encrypt<R: Read, W: Write>(
        &self,
        mut reader: R,
        mut writer: W,
        key: Option<&str>,
    ) -> Result<u64> {
        let key = resolve_key(key, self.default_key.as_ref())?;
        let cipher = build_cipher(&key)?;

        let mut base_nonce = [0u8; NONCE_SIZE];
        random::fill_bytes(&mut base_nonce);
        let header = build_header(&base_nonce, self.chunk_size as u32);
        writer.write_all(&header)?;

        let mut buffer = vec![0u8; self.chunk_size];
        let mut counter = 0u64;
        let mut total = 0u64;

        loop {
            let read = read_full(&mut reader, &mut buffer)?;
            if read == 0 {
                break;
            }

            let nonce = derive_nonce(&base_nonce, counter);
            let tag = cipher
                .encrypt_in_place_detached(Nonce::from_slice(&nonce), &header, &mut buffer[..read])
                .map_err(|_| Error::Crypto("GCM encryption failed".to_string()))?;

            writer.write_all(&(read as u32).to_le_bytes())?;
            writer.write_all(&tag)?;
            writer.write_all(&buffer[..read])?;

            counter = next_counter(counter)?;
            total += read as u64;

            if read < buffer.len() {
                break;
            }
        }

        let nonce = derive_nonce(&base_nonce, counter);
        let tag = cipher
            .encrypt_in_place_detached(Nonce::from_slice(&nonce), &header, &mut [])
            .map_err(|_| Error::Crypto("GCM encryption failed".to_string()))?;
        writer.write_all(&0u32.to_le_bytes())?;
        writer.write_all(&tag)?;
        writer.flush()?;

        debug!(bytes = total, frames = counter, "GCM stream encrypted");
        Ok(total)
    }

    /// Decrypt a container from reader and write plaintext to writer.
    ///
    /// Plaintext of a frame is written only after that frame verified.
    /// Returns the number of plaintext bytes written.
    ///
    /// # Errors
    /// - `InvalidKey` if no usable key is available
    /// - `InvalidCipherText` for a short or malformed header, or a frame
    ///   longer than the declared chunk size
    /// - `AuthenticationFailed` if any frame tag does not verify
    /// - `MissingTerminator` if input ends before the terminal frame
    /// - `TrailingData` if anything follows the terminal frame
    pub fn decrypt<R: Read, W: Write>(
        &self,
        mut reader: R,
        mut writer: W,
        key: Option<&str>,
    ) -> Result<u64> {
        let key = resolve_key(key, self.default_key.as_ref())?;
        let cipher = build_cipher(&key)?;

        let mut header = [0u8; HEADER_SIZE];
        if read_full(&mut reader, &mut header)? != HEADER_SIZE {
            return Err(Error::InvalidCipherText("Truncated header".to_string()));
        }
        let (base_nonce, chunk_size) = parse_header(&header)?;

        let mut buffer = vec![0u8; chunk_size];
        let mut counter = 0u64;
        let mut total = 0u64;

        loop {
            let mut prefix = [0u8; FRAME_PREFIX_SIZE];
            match read_full(&mut reader, &mut prefix)? {
                0 => break,
                FRAME_PREFIX_SIZE => {}
                _ => return Err(Error::MissingTerminator),
            }

            let len = u32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
            if len > chunk_size {
                return Err(Error::InvalidCipherText(format!(
                    "Frame of {} bytes exceeds chunk size {}",
                    len, chunk_size
                )));
            }

            let tag = Tag::from_slice(&prefix[4..]);
            let nonce = derive_nonce(&base_nonce, counter);

            if len == 0 {
                cipher
                    .decrypt_in_place_detached(Nonce::from_slice(&nonce), &header, &mut [], tag)
                    .map_err(|_| {
                        warn!(frame = counter, "GCM terminal frame failed authentication");
                        Error::AuthenticationFailed
                    })?;

                let mut extra = [0u8; 1];
                if read_full(&mut reader, &mut extra)? != 0 {
                    return Err(Error::TrailingData);
                }

                writer.flush()?;
                debug!(bytes = total, frames = counter, "GCM stream decrypted");
                return Ok(total);
            }

            if read_full(&mut reader, &mut buffer[..len])? != len {
                return Err(Error::MissingTerminator);
            }

            cipher
                .decrypt_in_place_detached(
                    Nonce::from_slice(&nonce),
                    &header,
                    &mut buffer[..len],
                    tag,
                )
                .map_err(|_| {
                    warn!(frame = counter, "GCM frame failed authentication");
                    Error::AuthenticationFailed
                })?;
            writer.write_all(&buffer[..len])?;

            counter = next_counter(counter)?;
            total += len as u64;
        }

        Err(Error::MissingTerminator)
    }

    /// Encrypt a complete byte slice into a container.
    pub fn encrypt_bytes(&self, data: &[u8], key: Option<&str>) -> Result<Vec<u8>> {
        let mut output = Vec::with_capacity(HEADER_SIZE + data.len() + FRAME_PREFIX_SIZE * 2);
        self.encrypt(data, &mut output, key)?;
        Ok(output)
    }

    /// Decrypt a complete container held in memory.
    pub fn decrypt_bytes(&self, data: &[u8], key: Option<&str>) -> Result<Vec<u8>> {
        let mut output = Vec::with_capacity(data.len());
        self.decrypt(data, &mut output, key)?;
        Ok(output)
    }
}

impl Cipher for Aes256Gcm {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Gcm
    }

    fn encrypt(&self, plaintext: &[u8], key: Option<&str>) -> Result<Vec<u8>> {
        self.encrypt_bytes(plaintext, key)
    }

    fn decrypt(&self, ciphertext: &[u8], key: Option<&str>) -> Result<Vec<u8>> {
        self.decrypt_bytes(ciphertext, key)
    }
}

fn build_cipher(key: &AesKey) -> Result<GcmCore> {
    GcmCore::new_from_slice(key.as_bytes())
        .map_err(|_| Error::InvalidKey("Key must be 32 bytes (256 bits)".to_string()))
}

fn build_header(base_nonce: &[u8; NONCE_SIZE], chunk_size: u32) -> [u8; HEADER_SIZE] {
    let mut header = [0u8; HEADER_SIZE];
    header[..4].copy_from_slice(MAGIC);
    header[4] = VERSION;
    header[5..5 + NONCE_SIZE].copy_from_slice(base_nonce);
    header[5 + NONCE_SIZE..].copy_from_slice(&chunk_size.to_le_bytes());
    header
}

fn parse_header(header: &[u8; HEADER_SIZE]) -> Result<([u8; NONCE_SIZE], usize)> {
    if &header[..4] != MAGIC {
        return Err(Error::InvalidCipherText("Invalid header".to_string()));
    }
    if header[4] != VERSION {
        return Err(Error::InvalidCipherText(format!(
            "Unsupported version: {}",
            header[4]
        )));
    }

    let mut base_nonce = [0u8; NONCE_SIZE];
    base_nonce.copy_from_slice(&header[5..5 + NONCE_SIZE]);

    let mut size = [0u8; 4];
    size.copy_from_slice(&header[5 + NONCE_SIZE..]);
    let chunk_size = u32::from_le_bytes(size) as usize;
    if chunk_size == 0 || chunk_size > MAX_CHUNK_SIZE {
        return Err(Error::InvalidCipherText(format!(
            "Invalid chunk size: {}",
            chunk_size
        )));
    }

    Ok((base_nonce, chunk_size))
}

/// Frame nonce: base nonce with `LE64(counter)` XORed into the last 8 bytes.
fn derive_nonce(base_nonce: &[u8; NONCE_SIZE], counter: u64) -> [u8; NONCE_SIZE] {
    let mut nonce = *base_nonce;
    for (byte, c) in nonce[NONCE_SIZE - 8..]
        .iter_mut()
        .zip(counter.to_le_bytes())
    {
        *byte ^= c;
    }
    nonce
}

fn next_counter(counter: u64) -> Result<u64> {
    counter
        .checked_add(1)
        .ok_or_else(|| Error::Crypto("GCM frame counter exhausted".to_string()))
}
