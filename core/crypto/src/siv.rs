//! Deterministic AES-SIV (RFC 5297 S2V + CTR) with a 256-bit key.
//!
//! The same key and plaintext always produce the same ciphertext, which
//! makes the output usable as a lookup key for encrypted columns.
//!
//! # Format
//! ```text
//! [V:16] [AES-CTR(enc_key, Q, plaintext)]
//! ```
//!
//! The first key half keys CMAC, the second keys CTR. `Q` is `V` with the
//! top bit of bytes 8 and 12 cleared.

use aes::Aes128;
use cmac::{Cmac, Mac};
use ctr::cipher::{KeyIvInit, StreamCipher};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};
use zeroize::Zeroize;

use sealkit_common::{Error, Result};

use crate::cipher::{Algorithm, Cipher};
use crate::config::CryptoConfig;
use crate::keys::{resolve_key, AesKey};

/// Size of the synthetic IV prefix.
pub const TAG_SIZE: usize = 16;

pub(crate) const BLOCK_SIZE: usize = 16;

type Block = [u8; BLOCK_SIZE];
type Ctr = ctr::Ctr128BE<Aes128>;

/// Deterministic AES-SIV.
#[derive(Debug, Clone)]
pub struct Aes256Siv {
    default_key: Option<AesKey>,
}

impl Aes256Siv {
    /// Create a SIV component using the default key from `config`.
    pub fn new(config: &CryptoConfig) -> Self {
        Self {
            default_key: config.aes_key().cloned(),
        }
    }

    /// Encrypt `plaintext`.
    ///
    /// Empty plaintext still yields the 16-byte `V`.
    ///
    /// # Errors
    /// - `InvalidKey` if no usable key is available
    pub fn encrypt(&self, plaintext: &[u8], key: Option<&str>) -> Result<Vec<u8>> {
        let key = resolve_key(key, self.default_key.as_ref())?;
        let (mac_key, enc_key) = key.siv_halves();

        let v = s2v(mac_key, plaintext)?;
        let mut output = Vec::with_capacity(TAG_SIZE + plaintext.len());
        output.extend_from_slice(&v);
        output.extend_from_slice(plaintext);
        apply_ctr(enc_key, &siv_counter(&v), &mut output[TAG_SIZE..])?;

        debug!(bytes = plaintext.len(), "SIV encrypted");
        Ok(output)
    }

    /// Encrypt a UTF-8 string.
    pub fn encrypt_str(&self, plaintext: &str, key: Option<&str>) -> Result<Vec<u8>> {
        self.encrypt(plaintext.as_bytes(), key)
    }

    /// Decrypt bytes produced by [`Aes256Siv::encrypt`].
    ///
    /// Input shorter than the 16-byte `V` decrypts to nothing.
    ///
    /// # Errors
    /// - `InvalidKey` if no usable key is available
    /// - `AuthenticationFailed` if the recomputed `V` does not match
    pub fn decrypt(&self, ciphertext: &[u8], key: Option<&str>) -> Result<Vec<u8>> {
        let key = resolve_key(key, self.default_key.as_ref())?;
        if ciphertext.len() < TAG_SIZE {
            return Ok(Vec::new());
        }

        let (mac_key, enc_key) = key.siv_halves();
        let (v, body) = ciphertext.split_at(TAG_SIZE);
        let mut expected = [0u8; BLOCK_SIZE];
        expected.copy_from_slice(v);

        let mut plaintext = body.to_vec();
        apply_ctr(enc_key, &siv_counter(&expected), &mut plaintext)?;
        verify(mac_key, &expected, plaintext)
    }

    /// Decrypt to a UTF-8 string.
    ///
    /// # Errors
    /// As [`Aes256Siv::decrypt`], plus `Encoding` for non-UTF-8 output.
    pub fn decrypt_to_string(&self, ciphertext: &[u8], key: Option<&str>) -> Result<String> {
        let plaintext = self.decrypt(ciphertext, key)?;
        String::from_utf8(plaintext).map_err(|e| Error::Encoding(e.to_string()))
    }
}

impl Cipher for Aes256Siv {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Siv
    }

    fn encrypt(&self, plaintext: &[u8], key: Option<&str>) -> Result<Vec<u8>> {
        Aes256Siv::encrypt(self, plaintext, key)
    }

    fn decrypt(&self, ciphertext: &[u8], key: Option<&str>) -> Result<Vec<u8>> {
        Aes256Siv::decrypt(self, ciphertext, key)
    }
}

/// Recompute `V` over `plaintext` and release it only on a match.
fn verify(mac_key: &[u8], expected: &Block, mut plaintext: Vec<u8>) -> Result<Vec<u8>> {
    let actual = s2v(mac_key, &plaintext)?;
    if bool::from(actual.as_slice().ct_eq(expected.as_slice())) {
        debug!(bytes = plaintext.len(), "SIV decrypted");
        Ok(plaintext)
    } else {
        plaintext.zeroize();
        warn!("SIV tag mismatch");
        Err(Error::AuthenticationFailed)
    }
}

/// AES-CMAC over the concatenation of `parts`.
pub(crate) fn cmac(key: &[u8], parts: &[&[u8]]) -> Result<Block> {
    let mut mac = <Cmac<Aes128> as Mac>::new_from_slice(key)
        .map_err(|e| Error::InvalidKey(format!("CMAC key: {}", e)))?;
    for part in parts {
        mac.update(part);
    }

    let mut out = [0u8; BLOCK_SIZE];
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

/// Doubling in GF(2^128) with the `x^128 + x^7 + x^2 + x + 1` reduction.
pub(crate) fn dbl(block: &Block) -> Block {
    let value = u128::from_be_bytes(*block);
    let mut doubled = value << 1;
    if value >> 127 == 1 {
        doubled ^= 0x87;
    }
    doubled.to_be_bytes()
}

/// `data || 0x80 || 0x00...` to one block. `data` must be shorter than a block.
pub(crate) fn pad(data: &[u8]) -> Block {
    debug_assert!(data.len() < BLOCK_SIZE);
    let mut block = [0u8; BLOCK_SIZE];
    block[..data.len()].copy_from_slice(data);
    block[data.len()] = 0x80;
    block
}

pub(crate) fn xor_into(target: &mut Block, other: &Block) {
    for (t, o) in target.iter_mut().zip(other) {
        *t ^= o;
    }
}

/// `CMAC(pad(data) XOR dbl(D))` for inputs shorter than one block.
pub(crate) fn s2v_short(mac_key: &[u8], d: &Block, data: &[u8]) -> Result<Block> {
    let mut padded = pad(data);
    xor_into(&mut padded, &dbl(d));
    cmac(mac_key, &[&padded])
}

/// `D = CMAC(0^128)`.
pub(crate) fn s2v_zero(mac_key: &[u8]) -> Result<Block> {
    cmac(mac_key, &[&[0u8; BLOCK_SIZE]])
}

/// S2V over a single plaintext component.
pub(crate) fn s2v(mac_key: &[u8], data: &[u8]) -> Result<Block> {
    let d = s2v_zero(mac_key)?;
    if data.len() < BLOCK_SIZE {
        return s2v_short(mac_key, &d, data);
    }

    let (head, tail) = data.split_at(data.len() - BLOCK_SIZE);
    let mut last = [0u8; BLOCK_SIZE];
    last.copy_from_slice(tail);
    xor_into(&mut last, &d);
    cmac(mac_key, &[head, &last])
}

/// `V` with the top bit of bytes 8 and 12 cleared.
pub(crate) fn siv_counter(v: &Block) -> Block {
    let mut q = *v;
    q[8] &= 0x7F;
    q[12] &= 0x7F;
    q
}

/// AES-128-CTR with a 128-bit big-endian counter starting at `iv`.
pub(crate) fn apply_ctr(enc_key: &[u8], iv: &Block, data: &mut [u8]) -> Result<()> {
    let mut cipher = Ctr::new_from_slices(enc_key, iv)
        .map_err(|e| Error::InvalidKey(format!("CTR key: {}", e)))?;
    cipher.apply_keystream(data);
    Ok(())
}
