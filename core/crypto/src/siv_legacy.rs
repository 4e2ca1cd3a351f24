//! AES-SIV as written by older releases.
//!
//! Differs from [`crate::siv::Aes256Siv`] in three places:
//! - for inputs of 16 bytes or more only the final block enters the MAC
//! - the CTR counter starts at `V` without clearing any bits
//! - empty plaintext encrypts to an empty ciphertext
//!
//! New data should be written with [`crate::siv::Aes256Siv`]; see
//! [`crate::migration`] for conversion.

use std::io::{Read, Write};

use subtle::ConstantTimeEq;
use tracing::{debug, warn};
use zeroize::Zeroize;

use sealkit_common::{Error, Result};

use crate::cipher::{Algorithm, Cipher};
use crate::config::CryptoConfig;
use crate::keys::{resolve_key, AesKey};
use crate::siv::{apply_ctr, cmac, s2v_short, s2v_zero, xor_into, BLOCK_SIZE, TAG_SIZE};

/// Legacy deterministic AES-SIV.
#[derive(Debug, Clone)]
pub struct Aes256SivLegacy {
    default_key: Option<AesKey>,
}

impl Aes256SivLegacy {
    /// Create a legacy SIV component using the default key from `config`.
    pub fn new(config: &CryptoConfig) -> Self {
        Self {
            default_key: config.aes_key().cloned(),
        }
    }

    /// Encrypt `plaintext`. Empty in, empty out.
    pub fn encrypt(&self, plaintext: &[u8], key: Option<&str>) -> Result<Vec<u8>> {
        let key = resolve_key(key, self.default_key.as_ref())?;
        if plaintext.is_empty() {
            return Ok(Vec::new());
        }

        let (mac_key, enc_key) = key.siv_halves();
        let v = legacy_s2v(mac_key, plaintext)?;

        let mut output = Vec::with_capacity(TAG_SIZE + plaintext.len());
        output.extend_from_slice(&v);
        output.extend_from_slice(plaintext);
        apply_ctr(enc_key, &v, &mut output[TAG_SIZE..])?;

        debug!(bytes = plaintext.len(), "legacy SIV encrypted");
        Ok(output)
    }

    /// Encrypt the UTF-8 bytes of `plaintext`.
    pub fn encrypt_str(&self, plaintext: &str, key: Option<&str>) -> Result<Vec<u8>> {
        self.encrypt(plaintext.as_bytes(), key)
    }

    /// Decrypt bytes produced by [`Aes256SivLegacy::encrypt`].
    ///
    /// # Errors
    /// - `InvalidKey` if no usable key is available
    /// - `InvalidCipherText` for 1 to 15 bytes of input
    /// - `AuthenticationFailed` if the recomputed `V` does not match
    pub fn decrypt(&self, ciphertext: &[u8], key: Option<&str>) -> Result<Vec<u8>> {
        let key = resolve_key(key, self.default_key.as_ref())?;
        if ciphertext.is_empty() {
            return Ok(Vec::new());
        }
        if ciphertext.len() < TAG_SIZE {
            return Err(Error::InvalidCipherText(format!(
                "Ciphertext must be at least {} bytes",
                TAG_SIZE
            )));
        }

        let (mac_key, enc_key) = key.siv_halves();
        let (v, body) = ciphertext.split_at(TAG_SIZE);
        let mut expected = [0u8; BLOCK_SIZE];
        expected.copy_from_slice(v);

        let mut plaintext = body.to_vec();
        apply_ctr(enc_key, &expected, &mut plaintext)?;

        let actual = legacy_s2v(mac_key, &plaintext)?;
        if !bool::from(actual.as_slice().ct_eq(expected.as_slice())) {
            plaintext.zeroize();
            warn!("legacy SIV tag mismatch");
            return Err(Error::AuthenticationFailed);
        }

        debug!(bytes = plaintext.len(), "legacy SIV decrypted");
        Ok(plaintext)
    }

    /// Decrypt and require the plaintext to be UTF-8 (`Encoding` otherwise).
    pub fn decrypt_to_string(&self, ciphertext: &[u8], key: Option<&str>) -> Result<String> {
        let plaintext = self.decrypt(ciphertext, key)?;
        String::from_utf8(plaintext).map_err(|e| Error::Encoding(e.to_string()))
    }

    /// Encrypt everything from `reader` and write the result to `writer`.
    ///
    /// The legacy format is not chunked, so the whole input is buffered.
    /// Returns the number of plaintext bytes consumed.
    pub fn encrypt_stream<R: Read, W: Write>(
        &self,
        mut reader: R,
        mut writer: W,
        key: Option<&str>,
    ) -> Result<u64> {
        let mut plaintext = Vec::new();
        reader.read_to_end(&mut plaintext)?;
        let result = self.encrypt(&plaintext, key);
        let consumed = plaintext.len() as u64;
        plaintext.zeroize();

        writer.write_all(&result?)?;
        writer.flush()?;
        Ok(consumed)
    }

    /// Decrypt everything from `reader` and write the plaintext to `writer`.
    ///
    /// Returns the number of plaintext bytes written.
    pub fn decrypt_stream<R: Read, W: Write>(
        &self,
        mut reader: R,
        mut writer: W,
        key: Option<&str>,
    ) -> Result<u64> {
        let mut ciphertext = Vec::new();
        reader.read_to_end(&mut ciphertext)?;
        let mut plaintext = self.decrypt(&ciphertext, key)?;

        writer.write_all(&plaintext)?;
        writer.flush()?;
        let written = plaintext.len() as u64;
        plaintext.zeroize();
        Ok(written)
    }
}

impl Cipher for Aes256SivLegacy {
    fn algorithm(&self) -> Algorithm {
        Algorithm::SivLegacy
    }

    fn encrypt(&self, plaintext: &[u8], key: Option<&str>) -> Result<Vec<u8>> {
        Aes256SivLegacy::encrypt(self, plaintext, key)
    }

    fn decrypt(&self, ciphertext: &[u8], key: Option<&str>) -> Result<Vec<u8>> {
        Aes256SivLegacy::decrypt(self, ciphertext, key)
    }
}

/// S2V where only the last block of long inputs is MACed.
fn legacy_s2v(mac_key: &[u8], data: &[u8]) -> Result<[u8; BLOCK_SIZE]> {
    let d = s2v_zero(mac_key)?;
    if data.len() < BLOCK_SIZE {
        return s2v_short(mac_key, &d, data);
    }

    let mut last = [0u8; BLOCK_SIZE];
    last.copy_from_slice(&data[data.len() - BLOCK_SIZE..]);
    xor_into(&mut last, &d);
    cmac(mac_key, &[&last])
}
