//! Legacy AES-256-CBC encryption with an optional content hash prefix.
//!
//! Kept so data written by older releases stays readable; new data should
//! use [`crate::siv::Aes256Siv`] or [`crate::gcm::Aes256Gcm`].
//!
//! # Format
//! ```text
//! [Keccak512(plaintext):64]? [IV:16] [PKCS7-padded CBC ciphertext]
//! ```
//!
//! The hash prefix is advisory. It is not an authentication tag and
//! decryption never re-checks it; it only has to be skipped.

use std::io::{Read, Write};

use aes::Aes256;
use cbc::cipher::{
    block_padding::Pkcs7, generic_array::GenericArray, BlockDecryptMut, BlockEncryptMut,
    KeyIvInit,
};
use tracing::debug;

use sealkit_common::{Error, Result};

use crate::cipher::{Algorithm, Cipher};
use crate::config::CryptoConfig;
use crate::hash::{keccak512, KECCAK512_SIZE};
use crate::io::read_full;
use crate::keys::{resolve_key, AesKey};
use crate::random;

/// IV size for AES-CBC (16 bytes).
pub const IV_SIZE: usize = 16;

/// Size of the optional hash prefix (Keccak-512).
pub const HASH_SIZE: usize = KECCAK512_SIZE;

const BLOCK_SIZE: usize = 16;

/// Working buffer for the stream APIs; a multiple of the block size.
const STREAM_BUFFER_SIZE: usize = 64 * 1024;

type Encryptor = cbc::Encryptor<Aes256>;
type Decryptor = cbc::Decryptor<Aes256>;

/// AES-256-CBC with random IV and optional Keccak-512 prefix.
#[derive(Debug, Clone)]
pub struct Aes256Cbc {
    default_key: Option<AesKey>,
    include_hash: bool,
}

impl Aes256Cbc {
    /// Create a CBC component using the default key from `config`.
    ///
    /// Hash mode is on for the [`Cipher`] interface unless changed with
    /// [`Aes256Cbc::with_hash`].
    pub fn new(config: &CryptoConfig) -> Self {
        Self {
            default_key: config.aes_key().cloned(),
            include_hash: true,
        }
    }

    /// Set whether the [`Cipher`] interface writes and skips the hash prefix.
    pub fn with_hash(mut self, include_hash: bool) -> Self {
        self.include_hash = include_hash;
        self
    }

    /// Whether the [`Cipher`] interface uses the hash prefix.
    pub fn include_hash(&self) -> bool {
        self.include_hash
    }

    /// Encrypt `plaintext`.
    ///
    /// # Postconditions
    /// - Empty plaintext yields an empty result
    /// - Otherwise returns `[hash]? || IV || ciphertext` with a fresh IV
    ///
    /// # Errors
    /// - `InvalidKey` if no usable key is available
    pub fn encrypt(
        &self,
        plaintext: &[u8],
        key: Option<&str>,
        include_hash: bool,
    ) -> Result<Vec<u8>> {
        let key = resolve_key(key, self.default_key.as_ref())?;
        if plaintext.is_empty() {
            return Ok(Vec::new());
        }

        let mut iv = [0u8; IV_SIZE];
        random::fill_bytes(&mut iv);
        encrypt_with_iv(&key, &iv, plaintext, include_hash)
    }

    /// Encrypt a UTF-8 string.
    pub fn encrypt_str(
        &self,
        plaintext: &str,
        key: Option<&str>,
        include_hash: bool,
    ) -> Result<Vec<u8>> {
        self.encrypt(plaintext.as_bytes(), key, include_hash)
    }

    /// Decrypt bytes produced by [`Aes256Cbc::encrypt`].
    ///
    /// # Errors
    /// - `InvalidKey` if no usable key is available
    /// - `InvalidCipherText` if the input is shorter than its hash prefix or IV
    /// - `Padding` if PKCS7 unpadding fails (wrong key or corruption)
    pub fn decrypt(
        &self,
        ciphertext: &[u8],
        key: Option<&str>,
        include_hash: bool,
    ) -> Result<Vec<u8>> {
        let key = resolve_key(key, self.default_key.as_ref())?;
        if ciphertext.is_empty() {
            return Ok(Vec::new());
        }

        let body = if include_hash {
            ciphertext.get(HASH_SIZE..).ok_or_else(|| {
                Error::InvalidCipherText(format!(
                    "Ciphertext shorter than the {}-byte hash prefix",
                    HASH_SIZE
                ))
            })?
        } else {
            ciphertext
        };

        // Older writers emitted a bare hash for empty plaintext.
        if body.is_empty() {
            return Ok(Vec::new());
        }

        if body.len() < IV_SIZE {
            return Err(Error::InvalidCipherText(
                "Ciphertext too short to contain an IV".to_string(),
            ));
        }

        let (iv, encrypted) = body.split_at(IV_SIZE);
        let decryptor = Decryptor::new_from_slices(key.as_bytes(), iv)
            .map_err(|e| Error::Crypto(format!("CBC initialisation failed: {}", e)))?;

        decryptor
            .decrypt_padded_vec_mut::<Pkcs7>(encrypted)
            .map_err(|_| Error::Padding)
    }

    /// Decrypt into a UTF-8 string.
    ///
    /// # Errors
    /// - Everything [`Aes256Cbc::decrypt`] returns
    /// - `Encoding` if the plaintext is not UTF-8
    pub fn decrypt_to_string(
        &self,
        ciphertext: &[u8],
        key: Option<&str>,
        include_hash: bool,
    ) -> Result<String> {
        let plaintext = self.decrypt(ciphertext, key, include_hash)?;
        String::from_utf8(plaintext).map_err(|e| Error::Encoding(e.to_string()))
    }

    /// Encrypt from `reader` to `writer` without buffering the whole payload.
    ///
    /// Writes `IV || ciphertext`; the stream format has no hash prefix.
    /// Returns the number of plaintext bytes consumed.
    pub fn encrypt_stream<R: Read, W: Write>(
        &self,
        mut reader: R,
        mut writer: W,
        key: Option<&str>,
    ) -> Result<u64> {
        let key = resolve_key(key, self.default_key.as_ref())?;

        let mut iv = [0u8; IV_SIZE];
        random::fill_bytes(&mut iv);
        let mut encryptor = Encryptor::new_from_slices(key.as_bytes(), &iv)
            .map_err(|e| Error::Crypto(format!("CBC initialisation failed: {}", e)))?;
        writer.write_all(&iv)?;

        let mut buffer = vec![0u8; STREAM_BUFFER_SIZE];
        let mut pending = 0usize;
        let mut total = 0u64;

        loop {
            let read = reader.read(&mut buffer[pending..])?;
            if read == 0 {
                break;
            }
            pending += read;
            total += read as u64;

            let full = pending - pending % BLOCK_SIZE;
            for block in buffer[..full].chunks_exact_mut(BLOCK_SIZE) {
                encryptor.encrypt_block_mut(GenericArray::from_mut_slice(block));
            }
            writer.write_all(&buffer[..full])?;
            buffer.copy_within(full..pending, 0);
            pending -= full;
        }

        let last = encryptor.encrypt_padded_vec_mut::<Pkcs7>(&buffer[..pending]);
        writer.write_all(&last)?;
        writer.flush()?;

        debug!(bytes = total, "CBC stream encrypted");
        Ok(total)
    }

    /// Decrypt a stream produced by [`Aes256Cbc::encrypt_stream`].
    ///
    /// The final block is held back until end of input so it can be
    /// unpadded. Returns the number of plaintext bytes written.
    ///
    /// # Errors
    /// - `InvalidCipherText` if the stream ends inside the IV
    /// - `Padding` if the body is not a positive multiple of 16 bytes or
    ///   unpadding fails
    pub fn decrypt_stream<R: Read, W: Write>(
        &self,
        mut reader: R,
        mut writer: W,
        key: Option<&str>,
    ) -> Result<u64> {
        let key = resolve_key(key, self.default_key.as_ref())?;

        let mut iv = [0u8; IV_SIZE];
        if read_full(&mut reader, &mut iv)? != IV_SIZE {
            return Err(Error::InvalidCipherText(
                "Input stream does not contain a complete IV".to_string(),
            ));
        }

        let mut decryptor = Decryptor::new_from_slices(key.as_bytes(), &iv)
            .map_err(|e| Error::Crypto(format!("CBC initialisation failed: {}", e)))?;

        let mut buffer = vec![0u8; STREAM_BUFFER_SIZE];
        let mut pending = 0usize;
        let mut total = 0u64;

        loop {
            let read = reader.read(&mut buffer[pending..])?;
            if read == 0 {
                break;
            }
            pending += read;

            // Keep between 1 and 16 bytes back for the final unpad.
            if pending > BLOCK_SIZE {
                let ready = ((pending - 1) / BLOCK_SIZE) * BLOCK_SIZE;
                for block in buffer[..ready].chunks_exact_mut(BLOCK_SIZE) {
                    decryptor.decrypt_block_mut(GenericArray::from_mut_slice(block));
                }
                writer.write_all(&buffer[..ready])?;
                total += ready as u64;
                buffer.copy_within(ready..pending, 0);
                pending -= ready;
            }
        }

        if pending != BLOCK_SIZE {
            return Err(Error::Padding);
        }

        let last = decryptor
            .decrypt_padded_vec_mut::<Pkcs7>(&buffer[..BLOCK_SIZE])
            .map_err(|_| Error::Padding)?;
        writer.write_all(&last)?;
        writer.flush()?;
        total += last.len() as u64;

        debug!(bytes = total, "CBC stream decrypted");
        Ok(total)
    }
}

impl Cipher for Aes256Cbc {
    fn algorithm(&self) -> Algorithm {
        Algorithm::CbcLegacy {
            include_hash: self.include_hash,
        }
    }

    fn encrypt(&self, plaintext: &[u8], key: Option<&str>) -> Result<Vec<u8>> {
        Aes256Cbc::encrypt(self, plaintext, key, self.include_hash)
    }

    fn decrypt(&self, ciphertext: &[u8], key: Option<&str>) -> Result<Vec<u8>> {
        Aes256Cbc::decrypt(self, ciphertext, key, self.include_hash)
    }
}

fn encrypt_with_iv(
    key: &AesKey,
    iv: &[u8; IV_SIZE],
    plaintext: &[u8],
    include_hash: bool,
) -> Result<Vec<u8>> {
    let encryptor = Encryptor::new_from_slices(key.as_bytes(), iv)
        .map_err(|e| Error::Crypto(format!("CBC initialisation failed: {}", e)))?;
    let encrypted = encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let prefix = if include_hash { HASH_SIZE } else { 0 };
    let mut result = Vec::with_capacity(prefix + IV_SIZE + encrypted.len());
    if include_hash {
        result.extend_from_slice(&keccak512(plaintext));
    }
    result.extend_from_slice(iv);
    result.extend_from_slice(&encrypted);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Cursor;

    const ZERO_KEY: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";

    fn cbc() -> Aes256Cbc {
        Aes256Cbc::new(&CryptoConfig::new().with_aes_key(ZERO_KEY).unwrap())
    }

    fn hex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    #[test]
    fn test_known_answer_hashed() {
        let mut iv = [0u8; IV_SIZE];
        for (i, b) in iv.iter_mut().enumerate() {
            *b = i as u8;
        }
        let key = AesKey::from_bytes([0u8; 32]);
        let out = encrypt_with_iv(&key, &iv, b"MySensitiveData", true).unwrap();
        let expected = hex(
            "2bbb8324e3a63ac6c9addc845b34de0d754e9f6957e5695439351ce30fc7d843\
             9be3e0808bbe4dd27ab4163a195e3a73ffc15e959639ba0b2feaef60472f8f48\
             000102030405060708090a0b0c0d0e0f269456e11e3bcbb067d54d67e3d1b18f",
        );
        assert_eq!(out, expected);
        assert_eq!(
            cbc().decrypt_to_string(&expected, None, true).unwrap(),
            "MySensitiveData"
        );
    }

    #[test]
    fn test_round_trip_hashed_and_plain() {
        let cbc = cbc();
        for include_hash in [true, false] {
            let ct = cbc.encrypt_str("Hello, World!", None, include_hash).unwrap();
            let pt = cbc.decrypt_to_string(&ct, None, include_hash).unwrap();
            assert_eq!(pt, "Hello, World!");
        }
    }

    #[test]
    fn test_layout_and_hash_prefix() {
        let cbc = cbc();
        let plaintext = b"sixteen byte msg";
        let ct = cbc.encrypt(plaintext, None, true).unwrap();
        // hash + iv + two blocks (full block of padding)
        assert_eq!(ct.len(), HASH_SIZE + IV_SIZE + 32);
        assert_eq!(&ct[..HASH_SIZE], &keccak512(plaintext)[..]);

        let ct = cbc.encrypt(plaintext, None, false).unwrap();
        assert_eq!(ct.len(), IV_SIZE + 32);
    }

    #[test]
    fn test_empty_short_circuits() {
        let cbc = cbc();
        assert!(cbc.encrypt(b"", None, true).unwrap().is_empty());
        assert!(cbc.encrypt(b"", None, false).unwrap().is_empty());
        assert_eq!(cbc.decrypt_to_string(&[], None, true).unwrap(), "");
    }

    #[test]
    fn test_bare_hash_decrypts_to_empty() {
        let hash = keccak512(b"");
        assert!(cbc().decrypt(&hash, None, true).unwrap().is_empty());
    }

    #[test]
    fn test_unicode_and_nul() {
        let cbc = cbc();
        let text = "Ünïcødé \u{0} 你好 🔐";
        let ct = cbc.encrypt_str(text, None, true).unwrap();
        assert_eq!(cbc.decrypt_to_string(&ct, None, true).unwrap(), text);
    }

    #[test]
    fn test_fresh_iv_each_time() {
        let cbc = cbc();
        let ct1 = cbc.encrypt(b"Same plaintext", None, false).unwrap();
        let ct2 = cbc.encrypt(b"Same plaintext", None, false).unwrap();
        assert_ne!(&ct1[..IV_SIZE], &ct2[..IV_SIZE]);
        assert_ne!(ct1, ct2);
    }

    #[test]
    fn test_too_short_is_invalid() {
        let cbc = cbc();
        assert!(matches!(
            cbc.decrypt(&[1u8; 10], None, false),
            Err(Error::InvalidCipherText(_))
        ));
        assert!(matches!(
            cbc.decrypt(&[1u8; HASH_SIZE + 10], None, true),
            Err(Error::InvalidCipherText(_))
        ));
        assert!(matches!(
            cbc.decrypt(&[1u8; 30], None, true),
            Err(Error::InvalidCipherText(_))
        ));
    }

    #[test]
    fn test_corrupted_length_is_padding_error() {
        let cbc = cbc();
        let mut ct = cbc.encrypt(b"data", None, false).unwrap();
        ct.pop();
        assert!(matches!(cbc.decrypt(&ct, None, false), Err(Error::Padding)));

        // IV only, no blocks
        assert!(matches!(
            cbc.decrypt(&[0u8; IV_SIZE], None, false),
            Err(Error::Padding)
        ));
    }

    #[test]
    fn test_wrong_key_does_not_recover_plaintext() {
        let cbc = cbc();
        let ct = cbc.encrypt(b"Secret data", None, false).unwrap();
        let other = crate::random::generate_aes256_key_string();
        match cbc.decrypt(&ct, Some(&other), false) {
            Ok(pt) => assert_ne!(pt, b"Secret data"),
            Err(e) => assert!(matches!(e, Error::Padding)),
        }
    }

    #[test]
    fn test_missing_and_invalid_key() {
        let unkeyed = Aes256Cbc::new(&CryptoConfig::new());
        assert!(matches!(
            unkeyed.encrypt(b"x", None, true),
            Err(Error::InvalidKey(_))
        ));
        assert!(matches!(
            unkeyed.decrypt(b"x", None, true),
            Err(Error::InvalidKey(_))
        ));
        assert!(matches!(
            unkeyed.encrypt(b"x", Some("AAAA"), true),
            Err(Error::InvalidKey(_))
        ));
        assert!(matches!(
            unkeyed.encrypt_stream(&b"x"[..], Vec::new(), None),
            Err(Error::InvalidKey(_))
        ));
    }

    #[test]
    fn test_decrypt_stream_missing_and_invalid_key() {
        let ct = cbc().encrypt(b"keyed", None, false).unwrap();

        let mut out = Vec::new();
        let unkeyed = Aes256Cbc::new(&CryptoConfig::new());
        assert!(matches!(
            unkeyed.decrypt_stream(Cursor::new(&ct), &mut out, None),
            Err(Error::InvalidKey(_))
        ));
        assert!(matches!(
            unkeyed.decrypt_stream(Cursor::new(&ct), &mut out, Some("AAAA")),
            Err(Error::InvalidKey(_))
        ));
        assert!(matches!(
            cbc().decrypt_stream(Cursor::new(&ct), &mut out, Some("not base64!")),
            Err(Error::InvalidKey(_))
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn test_explicit_key_overrides_default() {
        let cbc = cbc();
        let other = crate::random::generate_aes256_key_string();
        let ct = cbc.encrypt(b"override", Some(&other), true).unwrap();
        let unkeyed = Aes256Cbc::new(&CryptoConfig::new());
        assert_eq!(unkeyed.decrypt(&ct, Some(&other), true).unwrap(), b"override");
    }

    #[test]
    fn test_stream_round_trip_large() {
        let cbc = cbc();
        let plaintext: Vec<u8> = (0..200_003u32).map(|i| (i % 251) as u8).collect();

        let mut encrypted = Vec::new();
        let consumed = cbc
            .encrypt_stream(Cursor::new(&plaintext), &mut encrypted, None)
            .unwrap();
        assert_eq!(consumed, plaintext.len() as u64);
        assert_eq!(encrypted.len(), IV_SIZE + (plaintext.len() / 16 + 1) * 16);

        let mut decrypted = Vec::new();
        let written = cbc
            .decrypt_stream(Cursor::new(&encrypted), &mut decrypted, None)
            .unwrap();
        assert_eq!(written, plaintext.len() as u64);
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_stream_matches_byte_format() {
        let cbc = cbc();
        let mut encrypted = Vec::new();
        cbc.encrypt_stream(&b"interchangeable"[..], &mut encrypted, None).unwrap();
        assert_eq!(cbc.decrypt(&encrypted, None, false).unwrap(), b"interchangeable");

        let ct = cbc.encrypt(b"the other way", None, false).unwrap();
        let mut decrypted = Vec::new();
        cbc.decrypt_stream(Cursor::new(ct), &mut decrypted, None).unwrap();
        assert_eq!(decrypted, b"the other way");
    }

    #[test]
    fn test_stream_empty_input() {
        let cbc = cbc();
        let mut encrypted = Vec::new();
        cbc.encrypt_stream(&b""[..], &mut encrypted, None).unwrap();
        assert_eq!(encrypted.len(), IV_SIZE + BLOCK_SIZE);

        let mut decrypted = Vec::new();
        cbc.decrypt_stream(Cursor::new(encrypted), &mut decrypted, None).unwrap();
        assert!(decrypted.is_empty());
    }

    #[test]
    fn test_stream_short_iv() {
        let mut out = Vec::new();
        assert!(matches!(
            cbc().decrypt_stream(&[0u8; 5][..], &mut out, None),
            Err(Error::InvalidCipherText(_))
        ));
    }

    #[test]
    fn test_stream_truncated_body() {
        let cbc = cbc();
        let mut encrypted = Vec::new();
        cbc.encrypt_stream(&[7u8; 100][..], &mut encrypted, None).unwrap();
        encrypted.truncate(encrypted.len() - 3);

        let mut out = Vec::new();
        assert!(matches!(
            cbc.decrypt_stream(Cursor::new(encrypted), &mut out, None),
            Err(Error::Padding)
        ));
    }

    #[test]
    fn test_cipher_interface_uses_hash_setting() {
        let hashed = cbc();
        assert_eq!(
            hashed.algorithm(),
            Algorithm::CbcLegacy { include_hash: true }
        );
        let ct = Cipher::encrypt(&hashed, b"abc", None).unwrap();
        assert_eq!(ct.len(), HASH_SIZE + IV_SIZE + BLOCK_SIZE);

        let plain = cbc().with_hash(false);
        let ct = Cipher::encrypt(&plain, b"abc", None).unwrap();
        assert_eq!(ct.len(), IV_SIZE + BLOCK_SIZE);
        assert_eq!(Cipher::decrypt(&plain, &ct, None).unwrap(), b"abc");
    }

    proptest! {
        #[test]
        fn prop_round_trip(
            data in proptest::collection::vec(any::<u8>(), 0..600),
            hashed in any::<bool>(),
        ) {
            let cbc = cbc();
            let ct = cbc.encrypt(&data, None, hashed).unwrap();
            prop_assert_eq!(cbc.decrypt(&ct, None, hashed).unwrap(), data);
        }
    }
}
