//! TOTP enrollment and verification glue between `crate::otp`'s pure RFC 6238
//! logic and the KEK-wrapped `otp_credentials` table.

use darkauth_types::otp::OtpSetupResponse;

use crate::{error::ApiResult, queries, state::AppState};

pub async fn enroll(state: &AppState, sub: &str, account: &str) -> ApiResult<OtpSetupResponse> {
    let (secret_bytes, secret_base32, otpauth_url) =
        crate::otp::generate(account, &state.config.issuer)?;
    let crypto = state.require_crypto().await?;
    let wrapped = crypto.kek.wrap(&secret_bytes)?;
    queries::otp::upsert(&state.db_pool, sub, &wrapped).await?;

    // A fresh enrollment invalidates any recovery codes printed for a
    // prior one -- they guarded a secret this enrollment just replaced.
    let recovery = crate::otp::generate_recovery_codes();
    let hashes: Vec<String> = recovery.iter().map(|(_, hash)| hash.clone()).collect();
    queries::otp::replace_recovery_codes(&state.db_pool, sub, &hashes).await?;
    let recovery_codes = recovery.into_iter().map(|(code, _)| code).collect();

    crate::audit::record(
        &state.db_pool,
        darkauth_types::audit::events::OTP_ENROLLED,
        Some(sub),
        None,
        Some(sub),
        None,
    )
    .await?;

    Ok(OtpSetupResponse {
        secret_base32,
        otpauth_url,
        recovery_codes,
    })
}

/// Verifies `code` against the caller's enrolled secret. Marks the
/// credential verified on first success, which is what unlocks it as a
/// usable second factor (an unverified enrollment can't yet gate a login).
pub async fn verify(state: &AppState, sub: &str, account: &str, code: &str) -> ApiResult<bool> {
    let credential = queries::otp::get(&state.db_pool, sub)
        .await?
        .ok_or(crate::error::ApiError::NotFound)?;
    let crypto = state.require_crypto().await?;
    let secret_bytes = crypto.kek.unwrap(&credential.secret_enc)?;

    let ok = crate::otp::verify(&secret_bytes, account, &state.config.issuer, code)?;
    if ok {
        if !credential.verified {
            queries::otp::mark_verified(&state.db_pool, sub).await?;
        }
        crate::audit::record(
            &state.db_pool,
            darkauth_types::audit::events::OTP_VERIFIED,
            Some(sub),
            None,
            Some(sub),
            None,
        )
        .await?;
    }
    Ok(ok)
}

/// Redeems one single-use recovery code in place of a TOTP guess. Consuming
/// the code is the atomic, race-proof step (same `UPDATE ... RETURNING`
/// pattern as authorization-code and refresh-token single-use).
pub async fn verify_recovery_code(state: &AppState, sub: &str, recovery_code: &str) -> ApiResult<bool> {
    let hash = crate::otp::hash_recovery_code(recovery_code);
    let ok = queries::otp::consume_recovery_code(&state.db_pool, sub, &hash).await?;
    if ok {
        crate::audit::record(
            &state.db_pool,
            darkauth_types::audit::events::OTP_VERIFIED,
            Some(sub),
            None,
            Some(sub),
            None,
        )
        .await?;
    }
    Ok(ok)
}
