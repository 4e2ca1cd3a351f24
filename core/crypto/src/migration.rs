//! Re-encryption of stored values into the current SIV format.
//!
//! All conversions decrypt with the old format and encrypt with
//! [`Aes256Siv`], using the key of the [`CryptoConfig`] the migrator was
//! built with. Batch conversions stop at the first failure.

use tracing::debug;
use zeroize::Zeroize;

use sealkit_common::Result;

use crate::cbc::Aes256Cbc;
use crate::cipher::Cipher;
use crate::config::CryptoConfig;
use crate::siv::Aes256Siv;
use crate::siv_legacy::Aes256SivLegacy;

/// Decrypt with `from` and re-encrypt with `to`.
///
/// Both sides use their configured default keys.
pub fn migrate(from: &dyn Cipher, to: &dyn Cipher, old: &[u8]) -> Result<Vec<u8>> {
    let mut plaintext = from.decrypt(old, None)?;
    let result = to.encrypt(&plaintext, None);
    plaintext.zeroize();

    debug!(from = %from.algorithm(), to = %to.algorithm(), "value migrated");
    result
}

/// Converts legacy ciphertexts to [`Aes256Siv`].
#[derive(Debug, Clone)]
pub struct AesMigration {
    cbc: Aes256Cbc,
    siv: Aes256Siv,
    siv_legacy: Aes256SivLegacy,
}

impl AesMigration {
    /// Build the migrator; every cipher uses the key held by `config`.
    pub fn new(config: &CryptoConfig) -> Self {
        Self {
            cbc: Aes256Cbc::new(config),
            siv: Aes256Siv::new(config),
            siv_legacy: Aes256SivLegacy::new(config),
        }
    }

    /// Legacy SIV to SIV.
    ///
    /// # Errors
    /// - `AuthenticationFailed` if the legacy value does not verify
    /// - `InvalidCipherText` for a 1 to 15 byte legacy value
    pub fn migrate_siv_legacy_to_siv(&self, old: &[u8]) -> Result<Vec<u8>> {
        migrate(&self.siv_legacy, &self.siv, old)
    }

    /// Legacy SIV to SIV; `None` stays `None`.
    pub fn migrate_siv_legacy_to_siv_nullable(
        &self,
        old: Option<&[u8]>,
    ) -> Result<Option<Vec<u8>>> {
        old.map(|value| self.migrate_siv_legacy_to_siv(value)).transpose()
    }

    /// Legacy SIV to SIV for every value, stopping at the first error.
    pub fn migrate_siv_legacy_to_siv_batch<T: AsRef<[u8]>>(
        &self,
        old: &[T],
    ) -> Result<Vec<Vec<u8>>> {
        old.iter()
            .map(|value| self.migrate_siv_legacy_to_siv(value.as_ref()))
            .collect()
    }

    /// Nullable batch form of [`Self::migrate_siv_legacy_to_siv`].
    pub fn migrate_siv_legacy_to_siv_batch_nullable<T: AsRef<[u8]>>(
        &self,
        old: &[Option<T>],
    ) -> Result<Vec<Option<Vec<u8>>>> {
        old.iter()
            .map(|value| {
                self.migrate_siv_legacy_to_siv_nullable(value.as_ref().map(AsRef::as_ref))
            })
            .collect()
    }

    /// CBC to SIV. `hashed` says whether `old` carries the hash prefix.
    ///
    /// # Errors
    /// - `InvalidCipherText` or `Padding` if the CBC value is malformed
    pub fn migrate_cbc_to_siv(&self, old: &[u8], hashed: bool) -> Result<Vec<u8>> {
        let mut plaintext = self.cbc.decrypt(old, None, hashed)?;
        let result = self.siv.encrypt(&plaintext, None);
        plaintext.zeroize();
        result
    }

    /// CBC to SIV; `None` stays `None`.
    pub fn migrate_cbc_to_siv_nullable(
        &self,
        old: Option<&[u8]>,
        hashed: bool,
    ) -> Result<Option<Vec<u8>>> {
        old.map(|value| self.migrate_cbc_to_siv(value, hashed)).transpose()
    }

    /// CBC to SIV for every value, stopping at the first error.
    pub fn migrate_cbc_to_siv_batch<T: AsRef<[u8]>>(
        &self,
        old: &[T],
        hashed: bool,
    ) -> Result<Vec<Vec<u8>>> {
        old.iter()
            .map(|value| self.migrate_cbc_to_siv(value.as_ref(), hashed))
            .collect()
    }

    /// Nullable batch form of [`Self::migrate_cbc_to_siv`].
    pub fn migrate_cbc_to_siv_batch_nullable<T: AsRef<[u8]>>(
        &self,
        old: &[Option<T>],
        hashed: bool,
    ) -> Result<Vec<Option<Vec<u8>>>> {
        old.iter()
            .map(|value| {
                self.migrate_cbc_to_siv_nullable(value.as_ref().map(AsRef::as_ref), hashed)
            })
            .collect()
    }
}
