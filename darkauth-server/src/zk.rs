//! Zero-Knowledge DRK delivery support. The server validates and fingerprints
//! a client-supplied P-256 ECDH public key but never performs ECDH with it
//! and never sees the wrapped Data Root Key's plaintext. Binding the
//! fingerprint (`drk_hash`) to an authorization code is the full extent of
//! the server's involvement.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use darkauth_types::auth::ZkPublicJwk;
use sha2::{Digest, Sha256};

use crate::error::{ApiError, ApiResult};

/// Validates that `jwk` is shaped like a public (not private) P-256 point
/// and returns its SHA-256 fingerprint, base64url-encoded. RFC 7638 JWK
/// thumbprints are deliberately not used here: the fingerprint only needs
/// to be a stable, collision-resistant binding, not an interoperable
/// canonical form.
pub fn validate_and_fingerprint(jwk: &ZkPublicJwk) -> ApiResult<String> {
    if jwk.kty != "EC" {
        return Err(ApiError::InvalidRequest("zk_pub.kty must be EC".into()));
    }
    if jwk.crv != "P-256" {
        return Err(ApiError::InvalidRequest("zk_pub.crv must be P-256".into()));
    }
    if jwk.d.is_some() {
        return Err(ApiError::InvalidRequest(
            "zk_pub must not contain a private key component".into(),
        ));
    }
    let x = decode_coord(&jwk.x, "x")?;
    let y = decode_coord(&jwk.y, "y")?;

    p256::PublicKey::from_encoded_point(&p256::EncodedPoint::from_affine_coordinates(
        x.as_slice().into(),
        y.as_slice().into(),
        false,
    ))
    .into_option()
    .ok_or_else(|| ApiError::InvalidRequest("zk_pub does not lie on the P-256 curve".into()))?;

    let canonical = format!("{}.{}.{}", jwk.kty, jwk.x, jwk.y);
    let digest = Sha256::digest(canonical.as_bytes());
    Ok(URL_SAFE_NO_PAD.encode(digest))
}

fn decode_coord(raw: &str, field: &str) -> ApiResult<[u8; 32]> {
    let bytes = URL_SAFE_NO_PAD
        .decode(raw)
        .map_err(|e| ApiError::InvalidRequest(format!("zk_pub.{field} invalid base64url: {e}")))?;
    bytes
        .try_into()
        .map_err(|_| ApiError::InvalidRequest(format!("zk_pub.{field} must be 32 bytes")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::elliptic_curve::sec1::ToEncodedPoint;

    fn sample_jwk() -> ZkPublicJwk {
        let secret = p256::SecretKey::random(&mut rand::rngs::OsRng);
        let point = secret.public_key().to_encoded_point(false);
        ZkPublicJwk {
            kty: "EC".into(),
            crv: "P-256".into(),
            x: URL_SAFE_NO_PAD.encode(point.x().unwrap()),
            y: URL_SAFE_NO_PAD.encode(point.y().unwrap()),
            d: None,
        }
    }

    #[test]
    fn valid_jwk_fingerprints_deterministically() {
        let jwk = sample_jwk();
        let a = validate_and_fingerprint(&jwk).unwrap();
        let b = validate_and_fingerprint(&jwk).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn private_key_component_is_rejected() {
        let mut jwk = sample_jwk();
        jwk.d = Some("shouldnt-be-here".into());
        assert!(validate_and_fingerprint(&jwk).is_err());
    }

    #[test]
    fn wrong_curve_is_rejected() {
        let mut jwk = sample_jwk();
        jwk.crv = "P-384".into();
        assert!(validate_and_fingerprint(&jwk).is_err());
    }

    #[test]
    fn different_keys_fingerprint_differently() {
        let a = validate_and_fingerprint(&sample_jwk()).unwrap();
        let b = validate_and_fingerprint(&sample_jwk()).unwrap();
        assert_ne!(a, b);
    }
}
