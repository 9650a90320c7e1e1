//! Ends the caller's browser session: deletes the session row, revokes
//! every outstanding refresh token for the subject, and validates the
//! optional `post_logout_redirect_uri` against the client that started the
//! session before handing it back to redirect to.

use darkauth_types::auth::{LogoutRequest, Session};

use crate::{error::ApiResult, queries, state::AppState};

pub async fn logout(
    state: &AppState,
    session: &Session,
    req: &LogoutRequest,
) -> ApiResult<Option<String>> {
    queries::sessions::delete(&state.db_pool, &session.id).await?;
    queries::refresh_tokens::revoke_all_for_sub(&state.db_pool, &session.sub).await?;

    let redirect = match (&req.post_logout_redirect_uri, &session.client_id) {
        (Some(uri), Some(client_id)) => {
            let client = queries::clients::get(&state.db_pool, client_id).await?;
            client
                .post_logout_redirect_uris
                .iter()
                .any(|allowed| allowed == uri)
                .then(|| uri.clone())
        }
        _ => None,
    };

    crate::audit::record(
        &state.db_pool,
        darkauth_types::audit::events::LOGOUT,
        Some(&session.sub),
        Some(&session.cohort),
        session.client_id.as_deref(),
        None,
    )
    .await?;

    Ok(redirect)
}
