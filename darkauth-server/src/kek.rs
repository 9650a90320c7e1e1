//! Key-Encryption-Key service: derives a root key from the install passphrase
//! and uses it to wrap/unwrap every secret that must not live on disk or in
//! Postgres in plaintext (OPAQUE envelopes' identity fields, client secrets,
//! signing-key private halves, TOTP secrets).

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit, Payload},
};
use argon2::Argon2;
use darkauth_types::settings::KdfParams;
use rand::RngCore;
use rand_core::OsRng;
use zeroize::Zeroizing;

use crate::error::{ApiError, ApiResult};

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Holds the derived 32-byte key for the lifetime of the process. Never
/// serialized, never logged; `Zeroizing` scrubs it on drop.
#[derive(Clone)]
pub struct Kek {
    key: Zeroizing<[u8; 32]>,
}

impl std::fmt::Debug for Kek {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kek").field("key", &"[REDACTED]").finish()
    }
}

impl Kek {
    pub fn derive(passphrase: &str, params: &KdfParams) -> ApiResult<Self> {
        let salt = base64_decode(&params.salt)?;
        let argon2 = Argon2::new(
            argon2::Algorithm::Argon2id,
            argon2::Version::V0x13,
            argon2::Params::new(
                params.memory_cost_kib,
                params.time_cost,
                params.parallelism,
                Some(params.hash_length as usize),
            )
            .map_err(|e| ApiError::CryptoError(format!("invalid kdf params: {e}")))?,
        );
        let mut out = Zeroizing::new([0u8; 32]);
        argon2
            .hash_password_into(passphrase.as_bytes(), &salt, out.as_mut())
            .map_err(|e| ApiError::CryptoError(format!("kdf failure: {e}")))?;
        Ok(Self { key: out })
    }

    /// Spec floor: >=32 random bytes.
    pub fn new_salt() -> String {
        let mut salt = [0u8; 32];
        OsRng.fill_bytes(&mut salt);
        base64::Engine::encode(
            &base64::engine::general_purpose::URL_SAFE_NO_PAD,
            salt,
        )
    }

    /// Wraps `plaintext` as `nonce(12) || tag(16) || ciphertext`, binding
    /// `aad` into the tag without including it in the output -- the caller
    /// must supply the same `aad` to `decrypt`/`unwrap`.
    pub fn encrypt(&self, plaintext: &[u8], aad: Option<&[u8]>) -> ApiResult<Vec<u8>> {
        let cipher = self.cipher()?;
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = cipher
            .encrypt(
                nonce,
                Payload {
                    msg: plaintext,
                    aad: aad.unwrap_or(&[]),
                },
            )
            .map_err(|_| ApiError::CryptoError("aead encryption failed".into()))?;
        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    pub fn decrypt(&self, blob: &[u8], aad: Option<&[u8]>) -> ApiResult<Vec<u8>> {
        if blob.len() < NONCE_LEN + TAG_LEN {
            return Err(ApiError::CryptoError("wrapped blob too short".into()));
        }
        let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
        let cipher = self.cipher()?;
        cipher
            .decrypt(
                Nonce::from_slice(nonce_bytes),
                Payload {
                    msg: ciphertext,
                    aad: aad.unwrap_or(&[]),
                },
            )
            .map_err(|_| ApiError::CryptoError("aead decryption failed".into()))
    }

    /// Alias for [`Kek::encrypt`] with no associated data, used by every
    /// call site that wraps a bare secret with no binding context.
    pub fn wrap(&self, plaintext: &[u8]) -> ApiResult<Vec<u8>> {
        self.encrypt(plaintext, None)
    }

    /// Alias for [`Kek::decrypt`] with no associated data.
    pub fn unwrap(&self, blob: &[u8]) -> ApiResult<Vec<u8>> {
        self.decrypt(blob, None)
    }

    fn cipher(&self) -> ApiResult<Aes256Gcm> {
        Ok(Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(self.key.as_ref())))
    }
}

fn base64_decode(s: &str) -> ApiResult<Vec<u8>> {
    base64::Engine::decode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, s)
        .map_err(|e| ApiError::CryptoError(format!("invalid salt encoding: {e}")))
}

/// Constant-time byte comparison for secret verification (client secrets,
/// code verifiers already go through PKCE's own comparison). Avoids leaking
/// the matching prefix length through early-exit `==`.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_unwrap_round_trips() {
        let params = KdfParams::defaults(Kek::new_salt());
        let kek = Kek::derive("correct horse battery staple", &params).unwrap();
        let plaintext = b"super secret envelope bytes";
        let wrapped = kek.wrap(plaintext).unwrap();
        assert_ne!(wrapped.as_slice(), plaintext);
        let unwrapped = kek.unwrap(&wrapped).unwrap();
        assert_eq!(unwrapped, plaintext);
    }

    #[test]
    fn wrong_passphrase_fails_to_unwrap() {
        let params = KdfParams::defaults(Kek::new_salt());
        let kek_a = Kek::derive("passphrase-a", &params).unwrap();
        let kek_b = Kek::derive("passphrase-b", &params).unwrap();
        let wrapped = kek_a.wrap(b"data").unwrap();
        assert!(kek_b.unwrap(&wrapped).is_err());
    }

    #[test]
    fn tampered_ciphertext_fails_to_unwrap() {
        let params = KdfParams::defaults(Kek::new_salt());
        let kek = Kek::derive("passphrase", &params).unwrap();
        let mut wrapped = kek.wrap(b"data").unwrap();
        let last = wrapped.len() - 1;
        wrapped[last] ^= 0xff;
        assert!(kek.unwrap(&wrapped).is_err());
    }

    #[test]
    fn aad_must_match_to_decrypt() {
        let params = KdfParams::defaults(Kek::new_salt());
        let kek = Kek::derive("passphrase", &params).unwrap();
        let blob = kek.encrypt(b"data", Some(b"sub:abc123")).unwrap();
        assert_eq!(kek.decrypt(&blob, Some(b"sub:abc123")).unwrap(), b"data");
        assert!(kek.decrypt(&blob, Some(b"sub:other")).is_err());
        assert!(kek.decrypt(&blob, None).is_err());
    }
}
