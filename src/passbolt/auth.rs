//! GPGAuth challenge-response authentication.
//!
//! The handshake proves possession of the client's private key:
//! 1. POST the key fingerprint to `/auth/login.json`; the server answers
//!    with a PGP-encrypted challenge in `X-GPGAuth-User-Auth-Token`.
//! 2. Decrypt the challenge locally with the private key.
//! 3. POST fingerprint + decrypted nonce back to `/auth/login.json`.
//! 4. GET `/users/me.json` to resolve the caller's user id and the CSRF
//!    token from the `set-cookie` header.
//! 5. GET `/` as a post-login liveness check.
//!
//! Any stage failure aborts the handshake and leaves the client
//! unauthenticated; there is no retry.

use crate::passbolt::api_client::PassboltApiClient;
use crate::passbolt::crypto::GpgEngine;
use crate::passbolt::types::*;
use log::{debug, info, warn};
use percent_encoding::percent_decode_str;
use reqwest::header::SET_COOKIE;

/// Header carrying the encrypted challenge in the stage-1 response.
const AUTH_TOKEN_HEADER: &str = "x-gpgauth-user-auth-token";

/// Cookie attribute holding the CSRF token.
const CSRF_COOKIE_NAME: &str = "csrfToken";

// ── Handshake state machine ─────────────────────────────────────────

/// GPGAuth handshake states. `Authenticated` and `Failed` are terminal;
/// `Failed` is reachable from every state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    Unauthenticated,
    Stage1Sent,
    Stage1Verified,
    Stage2Sent,
    Authenticated,
    Failed,
}

impl HandshakeState {
    /// Stage-1 request went out.
    pub fn send_stage1(self) -> Self {
        match self {
            Self::Unauthenticated => Self::Stage1Sent,
            _ => Self::Failed,
        }
    }

    /// Stage-1 outcome: envelope success, challenge present and decrypted.
    pub fn stage1_result(self, verified: bool) -> Self {
        match self {
            Self::Stage1Sent if verified => Self::Stage1Verified,
            _ => Self::Failed,
        }
    }

    /// Stage-2 request went out.
    pub fn send_stage2(self) -> Self {
        match self {
            Self::Stage1Verified => Self::Stage2Sent,
            _ => Self::Failed,
        }
    }

    /// Stage-2 outcome: envelope success means proof of possession accepted.
    pub fn stage2_result(self, accepted: bool) -> Self {
        match self {
            Self::Stage2Sent if accepted => Self::Authenticated,
            _ => Self::Failed,
        }
    }

    pub fn is_authenticated(self) -> bool {
        self == Self::Authenticated
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Authenticated | Self::Failed)
    }
}

// ── Header decoding helpers ─────────────────────────────────────────

/// Decode the stage-1 challenge header into an armored PGP message.
///
/// The server percent-encodes the message and encodes spaces as the
/// literal sequence `\+` (server-dialect quirk, not standard URL form
/// encoding).
pub fn decode_challenge_header(raw: &str) -> Result<String, PassboltError> {
    let decoded = percent_decode_str(raw)
        .decode_utf8()
        .map_err(|e| PassboltError::parse(format!("Challenge header is not UTF-8: {}", e)))?;
    Ok(decoded.replace("\\+", " "))
}

/// Extract the CSRF token from a `set-cookie` header value.
///
/// Parses the cookie as an attribute list keyed by name rather than by
/// character offsets, so attribute order and trailing attributes do not
/// matter.
pub fn extract_csrf_token(set_cookie: &str) -> Option<String> {
    set_cookie.split(';').find_map(|attr| {
        let (name, value) = attr.split_once('=')?;
        if name.trim() == CSRF_COOKIE_NAME && !value.is_empty() {
            Some(value.trim().to_string())
        } else {
            None
        }
    })
}

// ── Login driver ────────────────────────────────────────────────────

/// GPGAuth authenticator.
pub struct GpgAuth;

impl GpgAuth {
    /// Run the full handshake and materialize the session.
    ///
    /// On success the client's session holds the user id, CSRF token and
    /// key fingerprint; on any failure the session stays unauthenticated
    /// and the caller must reconstruct the client to retry.
    pub fn login(
        client: &mut PassboltApiClient,
        gpg: &GpgEngine,
        fingerprint: &str,
        passphrase: &str,
        strict_liveness: bool,
    ) -> Result<SessionState, PassboltError> {
        let mut state = HandshakeState::Unauthenticated;

        // Stage 1: announce the fingerprint, receive the encrypted challenge.
        state = state.send_stage1();
        let payload = GpgAuthLoginPayload::stage1(fingerprint);
        let response = client.post_raw("/auth/login.json", &payload)?;

        let raw_challenge = response
            .headers()
            .get(AUTH_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let envelope = parse_envelope(response)?;

        let challenge = match (envelope.header.is_success(), raw_challenge) {
            (true, Some(raw)) => decode_challenge_header(&raw)?,
            (accepted, raw) => {
                state = state.stage1_result(false);
                debug_assert!(state == HandshakeState::Failed);
                return Err(PassboltError::handshake(format!(
                    "Stage 1 rejected (envelope code {}, challenge header present: {}): {}",
                    envelope.header.code,
                    raw.is_some(),
                    if accepted { "" } else { envelope.header.message.as_str() },
                )));
            }
        };

        // Decrypt the challenge to prove possession of the private key.
        let nonce = match gpg.decrypt(&challenge, passphrase) {
            Ok(nonce) => {
                state = state.stage1_result(true);
                nonce
            }
            Err(e) => {
                let _ = state.stage1_result(false);
                return Err(e);
            }
        };
        debug!("Stage 1 verified, challenge decrypted");

        // Stage 2: return the nonce.
        state = state.send_stage2();
        let payload = GpgAuthLoginPayload::stage2(fingerprint, &nonce);
        let response = client.post_raw("/auth/login.json", &payload)?;
        let envelope = parse_envelope(response)?;

        state = state.stage2_result(envelope.header.is_success());
        if !state.is_authenticated() {
            return Err(PassboltError::handshake(format!(
                "Stage 2 rejected (envelope code {}): {}",
                envelope.header.code, envelope.header.message
            )));
        }

        // Session materialization: own user id + CSRF token.
        let me = client.get_raw("/users/me.json")?;
        let csrf_token = me
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(extract_csrf_token)
            .ok_or_else(|| PassboltError::handshake("No CSRF token in set-cookie header"))?;
        let envelope: ApiResponse<User> = parse_typed_envelope(me)?;
        if !envelope.header.is_success() {
            return Err(PassboltError::handshake(format!(
                "users/me rejected (envelope code {})",
                envelope.header.code
            )));
        }

        let session = SessionState {
            authenticated: true,
            user_id: Some(envelope.body.id),
            csrf_token: Some(csrf_token),
            fingerprint: Some(fingerprint.to_string()),
        };
        client.set_session(session.clone());

        // Liveness check. Non-fatal unless configured otherwise.
        let outcome = client.get_raw("/").map(|live| live.status().as_u16());
        if let Err(e) = enforce_liveness(outcome, strict_liveness) {
            client.set_session(SessionState::default());
            return Err(e);
        }

        info!(
            "GPGAuth login successful for user {}",
            session.user_id.as_deref().unwrap_or("?")
        );
        Ok(session)
    }
}

/// Apply the configured severity to the post-login liveness outcome.
///
/// Both a non-success status and a transport-level error are logged and
/// tolerated by default; either fails the login under strict liveness.
fn enforce_liveness(
    outcome: Result<u16, PassboltError>,
    strict: bool,
) -> Result<(), PassboltError> {
    match outcome {
        Ok(status) if (200..300).contains(&status) => Ok(()),
        Ok(status) => {
            if strict {
                return Err(PassboltError::http(status, "Post-login liveness check failed"));
            }
            warn!("Post-login liveness check returned {}; continuing", status);
            Ok(())
        }
        Err(e) => {
            if strict {
                return Err(e);
            }
            warn!("Post-login liveness check failed: {}; continuing", e);
            Ok(())
        }
    }
}

/// Parse a raw response body as an untyped envelope.
fn parse_envelope(
    response: reqwest::blocking::Response,
) -> Result<ApiResponse<serde_json::Value>, PassboltError> {
    parse_typed_envelope(response)
}

/// Parse a raw response body as a typed envelope.
fn parse_typed_envelope<T: serde::de::DeserializeOwned>(
    response: reqwest::blocking::Response,
) -> Result<ApiResponse<T>, PassboltError> {
    let status = response.status();
    let text = response
        .text()
        .map_err(|e| PassboltError::parse(format!("Failed to read response body: {}", e)))?;
    serde_json::from_str(&text).map_err(|e| {
        PassboltError::parse(format!(
            "Failed to parse response JSON (http {}): {}",
            status.as_u16(),
            e
        ))
    })
}

// ── Tests ───────────────────────────────────────────────────────────
