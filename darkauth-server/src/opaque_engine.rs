//! Server side of the OPAQUE password-authenticated key exchange. The
//! engine never sees a plaintext password: registration yields an opaque
//! envelope, login start/finish exchange blinded OPRF messages and confirm
//! knowledge of the password without transmitting it.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use opaque_ke::{
    CipherSuite, ClientRegistrationFinishResult, CredentialFinalization, CredentialRequest,
    RegistrationRequest, RegistrationUpload, ServerLogin, ServerLoginParameters,
    ServerLoginStartParameters, ServerLoginStartResult, ServerRegistration, ServerSetup,
    ksf::Identity,
};
use rand::rngs::OsRng;

use crate::error::{ApiError, ApiResult};

pub struct DarkAuthCipherSuite;

impl CipherSuite for DarkAuthCipherSuite {
    type OprfCs = opaque_ke::Ristretto255;
    type KeGroup = opaque_ke::Ristretto255;
    type KeyExchange = opaque_ke::key_exchange::tripledh::TripleDh;
    type Ksf = Identity;
}

type Setup = ServerSetup<DarkAuthCipherSuite>;

/// Wraps the long-lived OPRF seed and AKE keypair. Persisted KEK-wrapped in
/// settings; generated once at install time.
#[derive(Clone)]
pub struct OpaqueEngine {
    setup: Setup,
}

impl std::fmt::Debug for OpaqueEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpaqueEngine").field("setup", &"[REDACTED]").finish()
    }
}

impl OpaqueEngine {
    pub fn generate() -> Self {
        Self {
            setup: ServerSetup::<DarkAuthCipherSuite>::new(&mut OsRng),
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        self.setup.serialize().to_vec()
    }

    pub fn deserialize(bytes: &[u8]) -> ApiResult<Self> {
        let setup = Setup::deserialize(bytes)
            .map_err(|e| ApiError::CryptoError(format!("invalid opaque server setup: {e}")))?;
        Ok(Self { setup })
    }

    /// Begins registration for `identifier` (the email or sub used as the
    /// OPRF credential identifier). Returns the base64url response message
    /// to relay back to the client.
    pub fn registration_start(&self, identifier: &str, request_b64: &str) -> ApiResult<String> {
        let bytes = decode(request_b64)?;
        let request = RegistrationRequest::<DarkAuthCipherSuite>::deserialize(&bytes)
            .map_err(|e| ApiError::InvalidRequest(format!("invalid registration request: {e}")))?;
        let result = ServerRegistration::<DarkAuthCipherSuite>::start(
            &self.setup,
            request,
            identifier.as_bytes(),
        )
        .map_err(|e| ApiError::CryptoError(format!("opaque registration start failed: {e}")))?;
        Ok(encode(&result.message.serialize()))
    }

    /// Finalizes registration, returning the envelope bytes to persist as
    /// the user's password record.
    pub fn registration_finish(&self, record_b64: &str) -> ApiResult<Vec<u8>> {
        let bytes = decode(record_b64)?;
        let upload = RegistrationUpload::<DarkAuthCipherSuite>::deserialize(&bytes)
            .map_err(|e| ApiError::InvalidRequest(format!("invalid registration upload: {e}")))?;
        let record = ServerRegistration::<DarkAuthCipherSuite>::finish(upload);
        Ok(record.serialize().to_vec())
    }

    /// Begins login. `envelope` is `None` when no account exists for the
    /// identifier; OPAQUE still returns a plausible response so the caller
    /// cannot distinguish a missing account from a real one by timing or
    /// shape alone.
    pub fn login_start(
        &self,
        identifier: &str,
        envelope: Option<&[u8]>,
        request_b64: &str,
    ) -> ApiResult<(String, Vec<u8>)> {
        let bytes = decode(request_b64)?;
        let request = CredentialRequest::<DarkAuthCipherSuite>::deserialize(&bytes)
            .map_err(|e| ApiError::InvalidRequest(format!("invalid credential request: {e}")))?;

        let password_file = envelope
            .map(|e| {
                ServerRegistration::<DarkAuthCipherSuite>::deserialize(e).map_err(|err| {
                    ApiError::CryptoError(format!("corrupt stored opaque record: {err}"))
                })
            })
            .transpose()?;

        let result: ServerLoginStartResult<DarkAuthCipherSuite> = ServerLogin::start(
            &mut OsRng,
            &self.setup,
            password_file,
            request,
            identifier.as_bytes(),
            ServerLoginStartParameters::default(),
        )
        .map_err(|e| ApiError::CryptoError(format!("opaque login start failed: {e}")))?;

        Ok((
            encode(&result.message.serialize()),
            result.state.serialize().to_vec(),
        ))
    }

    /// Completes login: success means the client proved knowledge of the
    /// password without it ever leaving the browser.
    pub fn login_finish(&self, server_state: &[u8], finish_b64: &str) -> ApiResult<()> {
        let state = ServerLogin::<DarkAuthCipherSuite>::deserialize(server_state)
            .map_err(|e| ApiError::CryptoError(format!("corrupt opaque login state: {e}")))?;
        let bytes = decode(finish_b64)?;
        let finalization = CredentialFinalization::<DarkAuthCipherSuite>::deserialize(&bytes)
            .map_err(|e| ApiError::InvalidRequest(format!("invalid credential finalization: {e}")))?;
        state
            .finish(finalization, ServerLoginParameters::default())
            .map_err(|_| ApiError::AuthenticationFailed)?;
        Ok(())
    }
}

/// Mirrors [`OpaqueEngine::registration_finish`] on the client side for
/// tests that need to produce a real envelope without a browser.
#[cfg(test)]
pub fn client_finish_registration_for_test(
    result: ClientRegistrationFinishResult<DarkAuthCipherSuite>,
) -> Vec<u8> {
    result.message.serialize().to_vec()
}

fn decode(s: &str) -> ApiResult<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(s)
        .map_err(|e| ApiError::InvalidRequest(format!("invalid base64url: {e}")))
}

fn encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use opaque_ke::{ClientLogin, ClientLoginFinishParameters, ClientRegistration, ClientRegistrationFinishParameters};

    fn full_round_trip(password: &str) {
        let engine = OpaqueEngine::generate();
        let identifier = "user@example.com";

        let client_reg_start =
            ClientRegistration::<DarkAuthCipherSuite>::start(&mut OsRng, password.as_bytes())
                .unwrap();
        let reg_request_b64 = encode(&client_reg_start.message.serialize());
        let reg_response_b64 = engine
            .registration_start(identifier, &reg_request_b64)
            .unwrap();
        let reg_response = opaque_ke::RegistrationResponse::<DarkAuthCipherSuite>::deserialize(
            &decode(&reg_response_b64).unwrap(),
        )
        .unwrap();
        let client_finish = client_reg_start
            .state
            .finish(
                &mut OsRng,
                password.as_bytes(),
                reg_response,
                ClientRegistrationFinishParameters::default(),
            )
            .unwrap();
        let upload_b64 = encode(&client_finish.message.serialize());
        let envelope = engine.registration_finish(&upload_b64).unwrap();

        let client_login_start =
            ClientLogin::<DarkAuthCipherSuite>::start(&mut OsRng, password.as_bytes()).unwrap();
        let login_request_b64 = encode(&client_login_start.message.serialize());
        let (login_response_b64, server_state) = engine
            .login_start(identifier, Some(&envelope), &login_request_b64)
            .unwrap();
        let login_response = opaque_ke::CredentialResponse::<DarkAuthCipherSuite>::deserialize(
            &decode(&login_response_b64).unwrap(),
        )
        .unwrap();
        let client_login_finish = client_login_start
            .state
            .finish(
                password.as_bytes(),
                login_response,
                ClientLoginFinishParameters::default(),
            )
            .unwrap();
        let finish_b64 = encode(&client_login_finish.message.serialize());

        engine.login_finish(&server_state, &finish_b64).unwrap();
    }

    #[test]
    fn registration_then_login_succeeds_exactly_once_with_correct_password() {
        full_round_trip("correct horse battery staple");
    }

    #[test]
    fn login_start_with_no_existing_envelope_does_not_panic() {
        let engine = OpaqueEngine::generate();
        let client_login_start =
            ClientLogin::<DarkAuthCipherSuite>::start(&mut OsRng, b"whatever").unwrap();
        let login_request_b64 = encode(&client_login_start.message.serialize());
        let result = engine.login_start("nobody@example.com", None, &login_request_b64);
        assert!(result.is_ok());
    }
}
