//! EdDSA (Ed25519) signing key store and JWKS publication (C2). The
//! private half of every key is serialized as PKCS#8 DER and C1-wrapped
//! before it is persisted; only the public half is ever stored in clear.
//! Rotation demotes the current primary to verify-only and mints a fresh
//! one -- old keys stay in JWKS until an operator deletes them.

use darkauth_types::auth::PublicJwk;
use ed25519_dalek::{
    SigningKey, VerifyingKey,
    pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey},
};
use jsonwebtoken::{DecodingKey, EncodingKey};
use rand::rngs::OsRng;

use crate::{
    db::DbPool,
    error::{ApiError, ApiResult},
    kek::Kek,
    queries,
};

/// A single EdDSA keypair identified by `kid`. Old keys are kept around
/// verify-only after rotation so tokens signed before a rotation still
/// validate until they expire naturally.
#[derive(Clone)]
pub struct SigningKeyEntry {
    pub kid: String,
    pub encoding_key: EncodingKey,
    pub decoding_key: DecodingKey,
    pub public_jwk: PublicJwk,
}

impl std::fmt::Debug for SigningKeyEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeyEntry")
            .field("kid", &self.kid)
            .field("encoding_key", &"[REDACTED]")
            .field("public_jwk", &self.public_jwk)
            .finish()
    }
}

/// Handles JWT signing keys and JWKS publication. The primary key signs new
/// tokens; every entry (primary and retired) is published in the JWKS so
/// verification keeps working through a rotation. Lives inside
/// [`crate::state::Crypto`] -- it cannot exist before the KEK does, since
/// every private half on disk is wrapped by it.
#[derive(Clone)]
pub struct SigningKeyManager {
    pub primary: SigningKeyEntry,
    pub retired: Vec<SigningKeyEntry>,
}

impl std::fmt::Debug for SigningKeyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeyManager")
            .field("primary_kid", &self.primary.kid)
            .field("retired_count", &self.retired.len())
            .finish()
    }
}

impl SigningKeyManager {
    /// Loads every row from `signing_keys`, decrypting private halves via
    /// `kek`. Generates and persists a fresh primary keypair if the table
    /// is empty (first boot after install).
    pub async fn load_or_generate(pool: &DbPool, kek: &Kek) -> ApiResult<Self> {
        let rows = queries::signing_keys::list(pool).await?;
        if rows.is_empty() {
            let (entry, priv_der) = generate_entry();
            persist(pool, kek, &entry, &priv_der, true).await?;
            return Ok(Self {
                primary: entry,
                retired: Vec::new(),
            });
        }

        let mut primary = None;
        let mut retired = Vec::new();
        for row in rows {
            let entry = decrypt_entry(kek, &row)?;
            if row.is_primary {
                primary = Some(entry);
            } else {
                retired.push(entry);
            }
        }
        let primary = primary
            .ok_or_else(|| ApiError::Internal("signing_keys has no row marked primary".into()))?;
        Ok(Self { primary, retired })
    }

    /// Demotes the current primary to retired (verify-only) and persists a
    /// fresh primary keypair.
    pub async fn rotate(&mut self, pool: &DbPool, kek: &Kek) -> ApiResult<()> {
        queries::signing_keys::demote_all(pool).await?;
        let (new_primary, priv_der) = generate_entry();
        persist(pool, kek, &new_primary, &priv_der, true).await?;

        self.retired.push(self.primary.clone());
        self.primary = new_primary;
        Ok(())
    }

    pub fn jwks(&self) -> Vec<PublicJwk> {
        std::iter::once(self.primary.public_jwk.clone())
            .chain(self.retired.iter().map(|e| e.public_jwk.clone()))
            .collect()
    }

    pub fn decoding_key_for(&self, kid: &str) -> Option<&DecodingKey> {
        if self.primary.kid == kid {
            return Some(&self.primary.decoding_key);
        }
        self.retired
            .iter()
            .find(|e| e.kid == kid)
            .map(|e| &e.decoding_key)
    }
}

fn new_kid() -> String {
    darkauth_types::auth::random_token_b64(9)
}

/// Generates a fresh keypair, returning both the live entry and the raw
/// PKCS#8 DER bytes the caller needs to wrap for persistence -- kept
/// separate from `SigningKeyEntry` since `jsonwebtoken::EncodingKey` does
/// not expose its bytes back out once constructed.
fn generate_entry() -> (SigningKeyEntry, Vec<u8>) {
    let kid = new_kid();
    let signing_key = SigningKey::generate(&mut OsRng);
    let verify_key = signing_key.verifying_key();
    let priv_pkcs8 = signing_key
        .to_pkcs8_der()
        .expect("ed25519 pkcs8 encoding never fails");
    let pub_raw = verify_key.to_bytes();

    let entry = SigningKeyEntry {
        kid: kid.clone(),
        encoding_key: EncodingKey::from_ed_der(priv_pkcs8.as_bytes()),
        decoding_key: DecodingKey::from_ed_der(&pub_raw),
        public_jwk: PublicJwk::from_ed25519_bytes(&pub_raw, kid),
    };
    (entry, priv_pkcs8.as_bytes().to_vec())
}

async fn persist(
    pool: &DbPool,
    kek: &Kek,
    entry: &SigningKeyEntry,
    priv_der: &[u8],
    is_primary: bool,
) -> ApiResult<()> {
    let wrapped = kek.wrap(priv_der)?;
    let public_jwk = serde_json::to_value(&entry.public_jwk)
        .map_err(|e| ApiError::Internal(format!("public jwk does not serialize: {e}")))?;
    queries::signing_keys::insert(pool, &entry.kid, &wrapped, &public_jwk, is_primary).await
}

fn decrypt_entry(kek: &Kek, row: &queries::signing_keys::SigningKeyRow) -> ApiResult<SigningKeyEntry> {
    let priv_der = kek.unwrap(&row.private_jwk_enc)?;
    let signing_key = SigningKey::from_pkcs8_der(&priv_der)
        .map_err(|e| ApiError::CryptoError(format!("invalid private key (expected PKCS#8 DER): {e}")))?;
    let public_jwk: PublicJwk = serde_json::from_value(row.public_jwk.clone())
        .map_err(|e| ApiError::CryptoError(format!("corrupt public jwk: {e}")))?;
    let pub_raw = signing_key.verifying_key().to_bytes();

    Ok(SigningKeyEntry {
        kid: row.kid.clone(),
        encoding_key: EncodingKey::from_ed_der(&priv_der),
        decoding_key: DecodingKey::from_ed_der(&pub_raw),
        public_jwk,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifying_key_from_private_key_der_round_trips() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let pkcs8 = signing_key.to_pkcs8_der().unwrap();
        let reloaded = SigningKey::from_pkcs8_der(pkcs8.as_bytes()).unwrap();
        assert_eq!(
            signing_key.verifying_key().to_bytes(),
            reloaded.verifying_key().to_bytes()
        );
    }

    #[test]
    fn public_key_spki_round_trips() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let spki = signing_key.verifying_key().to_public_key_der().unwrap();
        let reloaded = VerifyingKey::from_public_key_der(spki.as_bytes()).unwrap();
        assert_eq!(signing_key.verifying_key().to_bytes(), reloaded.to_bytes());
    }
}
