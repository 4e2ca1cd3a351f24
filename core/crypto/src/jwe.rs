//! JSON Web Encryption with RSA key pairs.
//!
//! Keys travel as JWK JSON (RFC 7517). Tokens use the compact serialization
//! of RFC 7516 with `RSA-OAEP-256` key wrapping and `A256GCM` content
//! encryption.
//!
//! # Format
//! ```text
//! B64(header) . B64(wrapped CEK) . B64(iv) . B64(ciphertext) . B64(tag)
//! ```
//!
//! `B64` is base64url without padding. The encoded header is the GCM
//! associated data. A key's `kid` is its RFC 7638 thumbprint.

use std::fmt;

use aes_gcm::{
    aead::{AeadInPlace, KeyInit},
    Aes256Gcm as GcmCore, Nonce, Tag,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, Oaep, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use sealkit_common::{Error, Result};

use crate::random;

/// Smallest RSA modulus accepted anywhere in this module.
pub const MIN_RSA_BITS: usize = 2048;

/// Largest RSA modulus accepted on import.
pub const MAX_RSA_BITS: usize = 8192;

/// Modulus size used by callers that have no preference.
pub const DEFAULT_RSA_BITS: usize = 2048;

/// Key management algorithm written to every header.
pub const ALG_RSA_OAEP_256: &str = "RSA-OAEP-256";

/// Content encryption algorithm written to every header.
pub const ENC_A256GCM: &str = "A256GCM";

const KTY_RSA: &str = "RSA";

/// Content encryption key size (256 bits).
const CEK_SIZE: usize = 32;

const IV_SIZE: usize = 12;
const TAG_SIZE: usize = 16;

/// A freshly issued key pair as JWK JSON.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct JwkPair {
    /// `{"kty":"RSA","n":..,"e":..}`
    pub public_jwk: String,
    /// Public members plus `d`, the CRT parameters and `kid`.
    pub private_jwk: String,
    /// RFC 7638 thumbprint of the public key.
    pub kid: String,
}

impl fmt::Debug for JwkPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwkPair")
            .field("public_jwk", &self.public_jwk)
            .field("private_jwk", &"[REDACTED]")
            .field("kid", &self.kid)
            .finish()
    }
}

#[derive(Serialize, Deserialize)]
struct PublicJwk {
    kty: String,
    n: String,
    e: String,
}

#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct PrivateJwk {
    kty: String,
    n: String,
    e: String,
    d: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    p: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    q: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dq: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    qi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kid: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct Header {
    alg: String,
    enc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kid: Option<String>,
}

/// Generate an RSA key pair of `bits` bits and export it as JWK JSON.
///
/// # Errors
/// - `InvalidInput` if `bits` is below [`MIN_RSA_BITS`] or above [`MAX_RSA_BITS`]
/// - `Crypto` if key generation fails
pub fn issue_keys(bits: usize) -> Result<JwkPair> {
    if !(MIN_RSA_BITS..=MAX_RSA_BITS).contains(&bits) {
        return Err(Error::InvalidInput(format!(
            "RSA key must be >= {} and <= {} bits",
            MIN_RSA_BITS, MAX_RSA_BITS
        )));
    }

    let key = RsaPrivateKey::new(&mut rand::thread_rng(), bits)
        .map_err(|e| Error::Crypto(format!("RSA key generation failed: {}", e)))?;
    let pair = export_pair(&key)?;

    debug!(bits, kid = %pair.kid, "issued RSA key pair");
    Ok(pair)
}

/// RFC 7638 thumbprint of an RSA JWK, base64url encoded.
///
/// Only `kty`, `n` and `e` are read, so a private JWK yields the same `kid`
/// as its public half.
///
/// # Errors
/// - `InvalidKey` if the JSON is not an RSA JWK with base64url `n` and `e`
pub fn compute_kid(public_jwk: &str) -> Result<String> {
    let jwk = parse_public_jwk(public_jwk)?;
    key_uint("n", &jwk.n)?;
    key_uint("e", &jwk.e)?;
    Ok(thumbprint(&jwk))
}

/// Encrypt `payload` to the holder of `public_jwk` as a compact JWE.
///
/// `kid` must be the thumbprint of `public_jwk`; it is written to the
/// protected header so the recipient can pick the right private key.
///
/// # Errors
/// - `InvalidKey` if `public_jwk` is malformed or its modulus is too small
/// - `InvalidInput` if `kid` does not match `public_jwk`
/// - `Crypto` if key wrapping or content encryption fails
pub fn encrypt(public_jwk: &str, payload: &[u8], kid: &str) -> Result<String> {
    if compute_kid(public_jwk)? != kid {
        return Err(Error::InvalidInput(
            "kid does not match the public JWK thumbprint (RFC 7638)".to_string(),
        ));
    }
    let key = import_public(&parse_public_jwk(public_jwk)?)?;

    let header = Header {
        alg: ALG_RSA_OAEP_256.to_string(),
        enc: ENC_A256GCM.to_string(),
        kid: Some(kid.to_string()),
    };
    let header = serde_json::to_vec(&header).map_err(|e| Error::Serialization(e.to_string()))?;
    let header = URL_SAFE_NO_PAD.encode(header);

    let mut cek = Zeroizing::new([0u8; CEK_SIZE]);
    random::fill_bytes(&mut cek[..]);
    let wrapped = key
        .encrypt(&mut rand::thread_rng(), Oaep::new::<Sha256>(), &cek[..])
        .map_err(|e| Error::Crypto(format!("RSA-OAEP key wrap failed: {}", e)))?;

    let iv = random::generate_bytes(IV_SIZE);
    let mut buffer = payload.to_vec();
    let tag = GcmCore::new_from_slice(&cek[..])
        .map_err(|_| Error::Crypto("Invalid content encryption key".to_string()))?
        .encrypt_in_place_detached(Nonce::from_slice(&iv), header.as_bytes(), &mut buffer)
        .map_err(|_| Error::Crypto("JWE content encryption failed".to_string()))?;

    debug!(bytes = payload.len(), kid, "JWE encrypted");
    Ok(format!(
        "{}.{}.{}.{}.{}",
        header,
        URL_SAFE_NO_PAD.encode(wrapped),
        URL_SAFE_NO_PAD.encode(iv),
        URL_SAFE_NO_PAD.encode(buffer),
        URL_SAFE_NO_PAD.encode(tag)
    ))
}

/// Decrypt a compact JWE with `private_jwk`.
///
/// # Errors
/// - `InvalidKey` if `private_jwk` is malformed or its modulus is too small
/// - `InvalidCipherText` if the token is not a five-segment
///   `RSA-OAEP-256`/`A256GCM` JWE
/// - `AuthenticationFailed` if the key does not unwrap the CEK or the tag
///   does not verify
pub fn decrypt(private_jwk: &str, jwe: &str) -> Result<Vec<u8>> {
    let key = import_private(private_jwk)?;

    let segments: Vec<&str> = jwe.split('.').collect();
    let &[header_b64, wrapped_b64, iv_b64, ciphertext_b64, tag_b64] = segments.as_slice() else {
        return Err(Error::InvalidCipherText(
            "Compact JWE must have five segments".to_string(),
        ));
    };

    let header: Header = serde_json::from_slice(&segment("header", header_b64)?)
        .map_err(|e| Error::InvalidCipherText(format!("Invalid JWE header: {}", e)))?;
    if header.alg != ALG_RSA_OAEP_256 || header.enc != ENC_A256GCM {
        return Err(Error::InvalidCipherText(format!(
            "Unsupported JWE algorithms {}/{}",
            header.alg, header.enc
        )));
    }

    let wrapped = segment("encrypted key", wrapped_b64)?;
    let iv = segment("iv", iv_b64)?;
    let tag = segment("tag", tag_b64)?;
    if iv.len() != IV_SIZE || tag.len() != TAG_SIZE {
        return Err(Error::InvalidCipherText(
            "JWE iv must be 12 bytes and tag 16 bytes".to_string(),
        ));
    }
    let mut buffer = segment("ciphertext", ciphertext_b64)?;

    let cek = key
        .decrypt(Oaep::new::<Sha256>(), &wrapped)
        .map(Zeroizing::new)
        .map_err(|_| {
            warn!("JWE key unwrap failed");
            Error::AuthenticationFailed
        })?;
    if cek.len() != CEK_SIZE {
        return Err(Error::InvalidCipherText(
            "Content encryption key must be 32 bytes".to_string(),
        ));
    }

    GcmCore::new_from_slice(&cek)
        .map_err(|_| Error::Crypto("Invalid content encryption key".to_string()))?
        .decrypt_in_place_detached(
            Nonce::from_slice(&iv),
            header_b64.as_bytes(),
            &mut buffer,
            Tag::from_slice(&tag),
        )
        .map_err(|_| {
            warn!("JWE content failed authentication");
            Error::AuthenticationFailed
        })?;

    debug!(bytes = buffer.len(), "JWE decrypted");
    Ok(buffer)
}

/// Decrypt a compact JWE, returning `None` on any failure.
pub fn try_decrypt(private_jwk: &str, jwe: &str) -> Option<Vec<u8>> {
    match decrypt(private_jwk, jwe) {
        Ok(plaintext) => Some(plaintext),
        Err(e) => {
            debug!(error = %e, "JWE rejected");
            None
        }
    }
}

fn export_pair(key: &RsaPrivateKey) -> Result<JwkPair> {
    let public = PublicJwk {
        kty: KTY_RSA.to_string(),
        n: encode_uint(key.n()),
        e: encode_uint(key.e()),
    };
    let kid = thumbprint(&public);

    let (p, q) = match key.primes() {
        [p, q] => (Some(encode_uint(p)), Some(encode_uint(q))),
        _ => (None, None),
    };
    let private = PrivateJwk {
        kty: KTY_RSA.to_string(),
        n: public.n.clone(),
        e: public.e.clone(),
        d: encode_uint(key.d()),
        p,
        q,
        dp: key.dp().map(encode_uint),
        dq: key.dq().map(encode_uint),
        qi: key.crt_coefficient().as_ref().map(encode_uint),
        kid: Some(kid.clone()),
    };

    Ok(JwkPair {
        public_jwk: serde_json::to_string(&public)
            .map_err(|e| Error::Serialization(e.to_string()))?,
        private_jwk: serde_json::to_string(&private)
            .map_err(|e| Error::Serialization(e.to_string()))?,
        kid,
    })
}

fn parse_public_jwk(json: &str) -> Result<PublicJwk> {
    let jwk: PublicJwk = serde_json::from_str(json)
        .map_err(|e| Error::InvalidKey(format!("Invalid JWK: {}", e)))?;
    if jwk.kty != KTY_RSA {
        return Err(Error::InvalidKey(format!("Unsupported key type {}", jwk.kty)));
    }
    Ok(jwk)
}

fn import_public(jwk: &PublicJwk) -> Result<RsaPublicKey> {
    let n = key_uint("n", &jwk.n)?;
    check_modulus(&n)?;
    let e = key_uint("e", &jwk.e)?;
    RsaPublicKey::new_with_max_size(n, e, MAX_RSA_BITS)
        .map_err(|e| Error::InvalidKey(format!("Invalid RSA public key: {}", e)))
}

fn import_private(json: &str) -> Result<RsaPrivateKey> {
    let jwk: PrivateJwk = serde_json::from_str(json)
        .map_err(|e| Error::InvalidKey(format!("Invalid private JWK: {}", e)))?;
    if jwk.kty != KTY_RSA {
        return Err(Error::InvalidKey(format!("Unsupported key type {}", jwk.kty)));
    }

    let n = key_uint("n", &jwk.n)?;
    check_modulus(&n)?;
    let e = key_uint("e", &jwk.e)?;
    let d = key_uint("d", &jwk.d)?;
    // the CRT values are recomputed from p and q
    let primes = match (&jwk.p, &jwk.q) {
        (Some(p), Some(q)) => vec![key_uint("p", p)?, key_uint("q", q)?],
        _ => Vec::new(),
    };

    let key = RsaPrivateKey::from_components(n, e, d, primes)
        .map_err(|e| Error::InvalidKey(format!("Invalid RSA private key: {}", e)))?;
    key.validate()
        .map_err(|e| Error::InvalidKey(format!("Invalid RSA private key: {}", e)))?;
    Ok(key)
}

fn check_modulus(n: &BigUint) -> Result<()> {
    let bits = n.bits();
    if !(MIN_RSA_BITS..=MAX_RSA_BITS).contains(&bits) {
        return Err(Error::InvalidKey(format!(
            "RSA modulus must be >= {} and <= {} bits, got {}",
            MIN_RSA_BITS, MAX_RSA_BITS, bits
        )));
    }
    Ok(())
}

fn thumbprint(jwk: &PublicJwk) -> String {
    // required members only, lexicographic order, no whitespace
    let canonical = format!(r#"{{"e":"{}","kty":"RSA","n":"{}"}}"#, jwk.e, jwk.n);
    URL_SAFE_NO_PAD.encode(Sha256::digest(canonical.as_bytes()))
}

fn encode_uint(value: &BigUint) -> String {
    URL_SAFE_NO_PAD.encode(value.to_bytes_be())
}

fn key_uint(member: &str, value: &str) -> Result<BigUint> {
    let bytes = URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|e| Error::InvalidKey(format!("JWK member {} is not base64url: {}", member, e)))?;
    if bytes.is_empty() {
        return Err(Error::InvalidKey(format!("JWK member {} is empty", member)));
    }
    Ok(BigUint::from_bytes_be(&bytes))
}

fn segment(name: &str, value: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|e| Error::InvalidCipherText(format!("JWE {} is not base64url: {}", name, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::OnceLock;

    fn first() -> &'static JwkPair {
        static PAIR: OnceLock<JwkPair> = OnceLock::new();
        PAIR.get_or_init(|| issue_keys(DEFAULT_RSA_BITS).unwrap())
    }

    fn second() -> &'static JwkPair {
        static PAIR: OnceLock<JwkPair> = OnceLock::new();
        PAIR.get_or_init(|| issue_keys(DEFAULT_RSA_BITS).unwrap())
    }

    fn short_pair() -> JwkPair {
        let key = RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap();
        export_pair(&key).unwrap()
    }

    fn json(text: &str) -> serde_json::Value {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn test_issue_keys_exports_jwks_and_kid() {
        let pair = first();
        let public = json(&pair.public_jwk);
        let private = json(&pair.private_jwk);

        assert_eq!(public["kty"], "RSA");
        assert_eq!(private["kty"], "RSA");
        assert!(public["n"].is_string());
        assert!(public["e"].is_string());
        assert!(public.get("d").is_none());
        for member in ["d", "p", "q", "dp", "dq", "qi"] {
            assert!(private[member].is_string(), "missing {}", member);
        }
        assert_eq!(private["n"], public["n"]);
        assert_eq!(private["kid"], pair.kid.as_str());

        assert_eq!(compute_kid(&pair.public_jwk).unwrap(), pair.kid);
        assert_eq!(compute_kid(&pair.private_jwk).unwrap(), pair.kid);
        assert_eq!(pair.kid.len(), 43);
    }

    #[test]
    fn test_issue_keys_rejects_short_key() {
        match issue_keys(1024) {
            Err(Error::InvalidInput(message)) => assert!(message.contains(">= 2048")),
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_round_trip() {
        let pair = first();
        let jwe = encrypt(&pair.public_jwk, b"hello-jwe", &pair.kid).unwrap();
        assert_eq!(jwe.split('.').count(), 5);
        assert_eq!(try_decrypt(&pair.private_jwk, &jwe).unwrap(), b"hello-jwe");
    }

    #[test]
    fn test_header_carries_alg_enc_and_kid() {
        let pair = first();
        let jwe = encrypt(&pair.public_jwk, b"", &pair.kid).unwrap();

        let header = URL_SAFE_NO_PAD.decode(jwe.split('.').next().unwrap()).unwrap();
        let header: serde_json::Value = serde_json::from_slice(&header).unwrap();
        assert_eq!(header["alg"], ALG_RSA_OAEP_256);
        assert_eq!(header["enc"], ENC_A256GCM);
        assert_eq!(header["kid"], pair.kid.as_str());
    }

    #[test]
    fn test_segment_sizes() {
        let pair = first();
        let jwe = encrypt(&pair.public_jwk, b"12345", &pair.kid).unwrap();
        let parts: Vec<Vec<u8>> = jwe
            .split('.')
            .map(|part| URL_SAFE_NO_PAD.decode(part).unwrap())
            .collect();

        assert_eq!(parts[1].len(), DEFAULT_RSA_BITS / 8);
        assert_eq!(parts[2].len(), IV_SIZE);
        assert_eq!(parts[3].len(), 5);
        assert_eq!(parts[4].len(), TAG_SIZE);
    }

    #[test]
    fn test_encryption_is_randomized() {
        let pair = first();
        let a = encrypt(&pair.public_jwk, b"same", &pair.kid).unwrap();
        let b = encrypt(&pair.public_jwk, b"same", &pair.kid).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_kid_mismatch_rejected() {
        let result = encrypt(&first().public_jwk, b"x", &second().kid);
        match result {
            Err(Error::InvalidInput(message)) => assert!(message.contains("kid does not match")),
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_key_returns_none() {
        let pair = first();
        let jwe = encrypt(&pair.public_jwk, b"abc", &pair.kid).unwrap();

        assert_eq!(try_decrypt(&pair.private_jwk, &jwe).unwrap(), b"abc");
        assert!(try_decrypt(&second().private_jwk, &jwe).is_none());
        assert!(matches!(
            decrypt(&second().private_jwk, &jwe),
            Err(Error::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_invalid_jwe_returns_none() {
        let private = &first().private_jwk;
        for jwe in ["not-a-jwe", "", "a.b.c.d", "aaaa.bbbb.cccc.dddd.eeee", "a.b.c.d.e.f"] {
            assert!(try_decrypt(private, jwe).is_none(), "{:?} accepted", jwe);
            assert!(matches!(
                decrypt(private, jwe),
                Err(Error::InvalidCipherText(_))
            ));
        }
    }

    #[test]
    fn test_tampered_tag_rejected() {
        let pair = first();
        let jwe = encrypt(&pair.public_jwk, b"integrity", &pair.kid).unwrap();

        let mut parts: Vec<String> = jwe.split('.').map(str::to_string).collect();
        let mut tag = URL_SAFE_NO_PAD.decode(&parts[4]).unwrap();
        tag[0] ^= 0x01;
        parts[4] = URL_SAFE_NO_PAD.encode(tag);
        let tampered = parts.join(".");

        assert!(matches!(
            decrypt(&pair.private_jwk, &tampered),
            Err(Error::AuthenticationFailed)
        ));
        assert!(try_decrypt(&pair.private_jwk, &tampered).is_none());
    }

    #[test]
    fn test_swapped_header_rejected() {
        let pair = first();
        let jwe = encrypt(&pair.public_jwk, b"aad", &pair.kid).unwrap();

        let header = Header {
            alg: ALG_RSA_OAEP_256.to_string(),
            enc: ENC_A256GCM.to_string(),
            kid: Some("other".to_string()),
        };
        let header = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header).unwrap());
        let (_, rest) = jwe.split_once('.').unwrap();
        let swapped = format!("{}.{}", header, rest);

        assert!(matches!(
            decrypt(&pair.private_jwk, &swapped),
            Err(Error::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_short_public_key_rejected() {
        let pair = short_pair();
        let kid = compute_kid(&pair.public_jwk).unwrap();
        match encrypt(&pair.public_jwk, b"x", &kid) {
            Err(Error::InvalidKey(message)) => assert!(message.contains(">= 2048")),
            other => panic!("expected InvalidKey, got {:?}", other),
        }
    }

    #[test]
    fn test_short_private_key_returns_none() {
        let pair = short_pair();
        assert!(try_decrypt(&pair.private_jwk, "aaaa.bbbb.cccc.dddd.eeee").is_none());
        assert!(matches!(
            decrypt(&pair.private_jwk, "aaaa.bbbb.cccc.dddd.eeee"),
            Err(Error::InvalidKey(_))
        ));
    }

    #[test]
    fn test_empty_payload() {
        let pair = first();
        let jwe = encrypt(&pair.public_jwk, &[], &pair.kid).unwrap();
        assert!(try_decrypt(&pair.private_jwk, &jwe).unwrap().is_empty());
    }

    #[test]
    fn test_public_jwk_cannot_decrypt() {
        let pair = first();
        let jwe = encrypt(&pair.public_jwk, b"x", &pair.kid).unwrap();
        assert!(matches!(
            decrypt(&pair.public_jwk, &jwe),
            Err(Error::InvalidKey(_))
        ));
    }

    #[test]
    fn test_compute_kid_rejects_bad_jwk() {
        let cases = [
            "not json",
            r#"{"kty":"EC","n":"AQAB","e":"AQAB"}"#,
            r#"{"kty":"RSA","e":"AQAB"}"#,
            r#"{"kty":"RSA","n":"not base64!","e":"AQAB"}"#,
        ];
        for jwk in cases {
            assert!(
                matches!(compute_kid(jwk), Err(Error::InvalidKey(_))),
                "{:?} accepted",
                jwk
            );
        }
    }

    #[test]
    fn test_compute_kid_rfc7638_example() {
        // RFC 7638 section 3.1
        let jwk = concat!(
            r#"{"kty":"RSA","e":"AQAB","alg":"RS256","kid":"2011-04-29","n":""#,
            "0vx7agoebGcQSuuPiLJXZptN9nndrQmbXEps2aiAFbWhM78LhWx4cbbfAAtVT86zwu1RK7aPFFx",
            "uhDR1L6tSoc_BJECPebWKRXjBZCiFV4n3oknjhMstn64tZ_2W-5JsGY4Hc5n9yBXArwl93lqt7_",
            "RN5w6Cf0h4QyQ5v-65YGjQR0_FDW2QvzqY368QQMicAtaSqzs8KJZgnYb9c7d0zgdAZHzu6qMQv",
            "RL5hajrn1n91CbOpbISD08qNLyrdkt-bFTWhAI4vMQFh6WeZu0fM4lFd2NcRwr3XPksINHaQ-G_",
            "xBniIqbw0Ls1jF44-csFCur-kEgU8awapJzKnqDKgw",
            r#""}"#
        );
        assert_eq!(
            compute_kid(jwk).unwrap(),
            "NzbLsXh8uDCcd-6MNwXF4W_7noWXFZAfHkxZsRGC9Xs"
        );
    }

    #[test]
    fn test_debug_redacts_private_jwk() {
        let pair = first();
        let debug = format!("{:?}", pair);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains(&pair.private_jwk));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_round_trip(payload in proptest::collection::vec(any::<u8>(), 0..2048)) {
            let pair = first();
            let jwe = encrypt(&pair.public_jwk, &payload, &pair.kid).unwrap();
            prop_assert_eq!(decrypt(&pair.private_jwk, &jwe).unwrap(), payload);
        }
    }
}
