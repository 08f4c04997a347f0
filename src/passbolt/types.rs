//! Core types for the Passbolt client.
//!
//! Defines the data models matching the Passbolt API response shapes,
//! request payloads, session state and the error type.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Error types ─────────────────────────────────────────────────────

/// Passbolt-specific error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassboltErrorKind {
    /// Required configuration (base URL, private key) is absent.
    ConfigMissing,
    /// One of the GPGAuth handshake stages was rejected by the server.
    HandshakeFailed,
    /// The gpg binary could not decrypt a challenge or secret.
    DecryptionFailed,
    /// The recipient key was invalid or encryption failed.
    EncryptionFailed,
    /// A data-plane call returned a non-success HTTP status.
    HttpError,
    /// A network or transport-level request error.
    NetworkError,
    /// JSON parsing or serialization failure.
    ParseError,
    /// Subprocess or filesystem I/O failure.
    IoError,
    /// The requested entity does not exist or lacks required data.
    NotFound,
}

/// A Passbolt client error.
///
/// Carries the HTTP status and response body text where available so
/// callers can inspect write-path failures without a raw response object.
#[derive(Debug, Clone, Error)]
#[error("{kind:?}: {message}")]
pub struct PassboltError {
    pub kind: PassboltErrorKind,
    pub message: String,
    /// HTTP status code, for errors originating from a response.
    pub status: Option<u16>,
}

impl PassboltError {
    fn new(kind: PassboltErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn config_missing(msg: impl Into<String>) -> Self {
        Self::new(PassboltErrorKind::ConfigMissing, msg)
    }
    pub fn handshake(msg: impl Into<String>) -> Self {
        Self::new(PassboltErrorKind::HandshakeFailed, msg)
    }
    pub fn decryption(msg: impl Into<String>) -> Self {
        Self::new(PassboltErrorKind::DecryptionFailed, msg)
    }
    pub fn encryption(msg: impl Into<String>) -> Self {
        Self::new(PassboltErrorKind::EncryptionFailed, msg)
    }
    pub fn http(status: u16, msg: impl Into<String>) -> Self {
        Self {
            kind: PassboltErrorKind::HttpError,
            message: msg.into(),
            status: Some(status),
        }
    }
    pub fn network(msg: impl Into<String>) -> Self {
        Self::new(PassboltErrorKind::NetworkError, msg)
    }
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::new(PassboltErrorKind::ParseError, msg)
    }
    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(PassboltErrorKind::IoError, msg)
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(PassboltErrorKind::NotFound, msg)
    }
}

// ── Session state ───────────────────────────────────────────────────

/// Current session state with the Passbolt server.
///
/// Cookies live in the HTTP client's jar; this tracks everything else the
/// handshake materializes. Either fully authenticated or not usable at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    /// Whether the handshake completed successfully.
    pub authenticated: bool,
    /// The authenticated user's UUID.
    pub user_id: Option<String>,
    /// CSRF token sent as `X-CSRF-Token` on every authenticated request.
    pub csrf_token: Option<String>,
    /// Fingerprint of the client's own key.
    pub fingerprint: Option<String>,
}

// ── API response envelope ───────────────────────────────────────────

/// Passbolt standard API response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub header: ApiResponseHeader,
    pub body: T,
}

/// API response header. Only `code` is load-bearing; the remaining fields
/// are tolerated with defaults since older servers omit some of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponseHeader {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub servertime: i64,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub url: String,
    pub code: u16,
}

impl ApiResponseHeader {
    /// Whether the envelope reports success.
    pub fn is_success(&self) -> bool {
        self.code == 200
    }
}

// ── Users ───────────────────────────────────────────────────────────

/// A Passbolt user. The `username` field holds the login email.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub role_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub modified: String,
    // ── Containable relations ───
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpgkey: Option<GpgKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups_users: Option<Vec<GroupUser>>,
}

/// User profile information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// A stored GPG public key, as returned under a user's `gpgkey` relation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GpgKey {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub armored_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(default)]
    pub key_id: String,
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub bits: u32,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub modified: String,
}

// ── Groups ──────────────────────────────────────────────────────────

/// A group that users belong to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub modified: String,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub modified_by: String,
    // ── Containable relations ───
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups_users: Option<Vec<GroupUser>>,
}

/// Membership record linking a user to a group.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupUser {
    pub id: String,
    #[serde(default)]
    pub group_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub created: String,
}

/// Create group request. The creating user is listed as group admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub groups_users: Vec<GroupUserEntry>,
}

/// Entry for adding a user to a group at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupUserEntry {
    pub user_id: String,
    pub is_admin: bool,
}

/// Update group request, used for both the dry-run and the commit put.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateGroupRequest {
    pub id: String,
    pub groups_users: Vec<GroupUserChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secrets: Option<Vec<ShareSecret>>,
}

/// A membership change entry. A new membership carries `user_id`; an
/// update to an existing membership carries the record `id` instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupUserChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub is_admin: bool,
}

/// A secret re-encrypted for a group member, attached to the commit put.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareSecret {
    pub resource_id: String,
    pub user_id: String,
    pub data: String,
}

/// Dry-run response body for a group update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupDryRunBody {
    #[serde(rename = "dry-run")]
    pub dry_run: GroupDryRunChanges,
}

/// The set of secrets that must be re-encrypted for the membership change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupDryRunChanges {
    #[serde(rename = "Secrets", default)]
    pub secrets: Vec<DryRunSecretBundle>,
}

/// One secret bundle in the dry-run response. The server nests each
/// secret record in a single-element `Secret` array.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DryRunSecretBundle {
    #[serde(rename = "Secret", default)]
    pub secret: Vec<Secret>,
}

// ── Resources & secrets ─────────────────────────────────────────────

/// A Passbolt resource (password entry).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub modified: String,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub modified_by: String,
    #[serde(default)]
    pub resource_type_id: String,
}

/// An encrypted secret associated with a resource. The `data` field is a
/// PGP message encrypted to one recipient; this client never stores the
/// plaintext except transiently during re-encryption.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Secret {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub resource_id: String,
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub modified: String,
}

// ── GPGAuth payloads ────────────────────────────────────────────────

/// GPGAuth login payload for both handshake stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpgAuthLoginPayload {
    pub data: GpgAuthData,
}

/// GPGAuth data envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpgAuthData {
    pub gpg_auth: GpgAuthFields,
}

/// GPGAuth field variants. Stage 1 sends only the key fingerprint; stage 2
/// adds the decrypted challenge as proof of possession.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpgAuthFields {
    pub keyid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_token_result: Option<String>,
}

impl GpgAuthLoginPayload {
    /// Stage-1 payload: announce the key fingerprint.
    pub fn stage1(fingerprint: &str) -> Self {
        Self {
            data: GpgAuthData {
                gpg_auth: GpgAuthFields {
                    keyid: fingerprint.to_string(),
                    user_token_result: None,
                },
            },
        }
    }

    /// Stage-2 payload: fingerprint plus the decrypted nonce.
    pub fn stage2(fingerprint: &str, nonce: &str) -> Self {
        Self {
            data: GpgAuthData {
                gpg_auth: GpgAuthFields {
                    keyid: fingerprint.to_string(),
                    user_token_result: Some(nonce.to_string()),
                },
            },
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_deserialize_minimal_header() {
        let json = r#"{"header":{"code":200},"body":null}"#;
        let resp: ApiResponse<serde_json::Value> = serde_json::from_str(json).unwrap();
        assert!(resp.header.is_success());
        assert!(resp.header.status.is_empty());
    }

    #[test]
    fn test_envelope_error_code() {
        let json = r#"{"header":{"code":403,"message":"Forbidden"},"body":[]}"#;
        let resp: ApiResponse<Vec<User>> = serde_json::from_str(json).unwrap();
        assert!(!resp.header.is_success());
        assert_eq!(resp.header.message, "Forbidden");
    }

    #[test]
    fn test_user_deserialize_with_gpgkey() {
        let json = r#"{
            "id": "user-uuid",
            "username": "ada@example.com",
            "active": true,
            "gpgkey": {
                "id": "key-uuid",
                "user_id": "user-uuid",
                "armored_key": "-----BEGIN PGP PUBLIC KEY BLOCK-----",
                "fingerprint": "5FB36DE5C8E69DD4DB185DF2BC9F2749E432CB59"
            }
        }"#;
        let u: User = serde_json::from_str(json).unwrap();
        assert_eq!(u.username.as_deref(), Some("ada@example.com"));
        let key = u.gpgkey.unwrap();
        assert_eq!(
            key.fingerprint.as_deref(),
            Some("5FB36DE5C8E69DD4DB185DF2BC9F2749E432CB59")
        );
    }

    #[test]
    fn test_stage1_payload_omits_token_result() {
        let payload = GpgAuthLoginPayload::stage1("ABC123");
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["data"]["gpg_auth"]["keyid"], "ABC123");
        assert!(json["data"]["gpg_auth"].get("user_token_result").is_none());
    }

    #[test]
    fn test_stage2_payload_includes_nonce() {
        let payload = GpgAuthLoginPayload::stage2("ABC123", "gpgauthv1.3.0|36|nonce");
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json["data"]["gpg_auth"]["user_token_result"],
            "gpgauthv1.3.0|36|nonce"
        );
    }

    #[test]
    fn test_stage2_payload_preserves_nonce_verbatim() {
        let payload = GpgAuthLoginPayload::stage2("ABC123", "gpgauthv1.3.0|36|nonce\n");
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json["data"]["gpg_auth"]["user_token_result"],
            "gpgauthv1.3.0|36|nonce\n"
        );
    }

    #[test]
    fn test_update_group_request_without_secrets() {
        let req = UpdateGroupRequest {
            id: "group-uuid".into(),
            groups_users: vec![GroupUserChange {
                id: None,
                user_id: Some("user-uuid".into()),
                is_admin: false,
            }],
            secrets: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("secrets").is_none());
        assert!(json["groups_users"][0].get("id").is_none());
        assert_eq!(json["groups_users"][0]["user_id"], "user-uuid");
    }

    #[test]
    fn test_update_group_request_with_secrets() {
        let req = UpdateGroupRequest {
            id: "group-uuid".into(),
            groups_users: vec![GroupUserChange {
                id: Some("membership-uuid".into()),
                user_id: None,
                is_admin: true,
            }],
            secrets: Some(vec![ShareSecret {
                resource_id: "res-uuid".into(),
                user_id: "user-uuid".into(),
                data: "-----BEGIN PGP MESSAGE-----".into(),
            }]),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["secrets"][0]["resource_id"], "res-uuid");
        assert!(json["groups_users"][0].get("user_id").is_none());
        assert_eq!(json["groups_users"][0]["id"], "membership-uuid");
    }

    #[test]
    fn test_dry_run_body_deserialize() {
        let json = r#"{
            "dry-run": {
                "Secrets": [
                    {"Secret": [{"resource_id": "res-1", "data": "-----BEGIN PGP MESSAGE-----"}]},
                    {"Secret": [{"resource_id": "res-2", "data": "-----BEGIN PGP MESSAGE-----"}]}
                ]
            }
        }"#;
        let body: GroupDryRunBody = serde_json::from_str(json).unwrap();
        assert_eq!(body.dry_run.secrets.len(), 2);
        assert_eq!(body.dry_run.secrets[0].secret[0].resource_id, "res-1");
    }

    #[test]
    fn test_dry_run_body_without_secrets() {
        let json = r#"{"dry-run": {}}"#;
        let body: GroupDryRunBody = serde_json::from_str(json).unwrap();
        assert!(body.dry_run.secrets.is_empty());
    }

    #[test]
    fn test_error_display_carries_kind() {
        let err = PassboltError::decryption("bad passphrase");
        assert_eq!(err.to_string(), "DecryptionFailed: bad passphrase");
        assert!(err.status.is_none());
    }

    #[test]
    fn test_http_error_carries_status() {
        let err = PassboltError::http(403, "dry-run rejected");
        assert_eq!(err.kind, PassboltErrorKind::HttpError);
        assert_eq!(err.status, Some(403));
    }
}
