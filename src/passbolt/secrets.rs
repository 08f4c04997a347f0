//! Secret retrieval and re-encryption.
//!
//! Secrets are stored server-side as PGP messages encrypted per
//! recipient. Sharing a secret with a new recipient means decrypting it
//! with our own key and encrypting it again for theirs; the plaintext
//! only ever exists transiently inside [`reencrypt`].

use crate::passbolt::api_client::PassboltApiClient;
use crate::passbolt::crypto::GpgEngine;
use crate::passbolt::types::*;
use log::debug;

// ── Secret operations ───────────────────────────────────────────────

/// Secret endpoints.
pub struct PassboltSecrets;

impl PassboltSecrets {
    /// Fetch the caller's encrypted secret for a resource.
    pub fn for_resource(
        client: &PassboltApiClient,
        resource_id: &str,
    ) -> Result<Secret, PassboltError> {
        client.get_body(&resource_secret_path(resource_id))
    }
}

/// Endpoint for the caller's copy of a resource secret.
pub fn resource_secret_path(resource_id: &str) -> String {
    format!("/secrets/resource/{}.json", resource_id)
}

/// Decrypt `encrypted` with our own private key and encrypt the result
/// for `recipient`. The intermediate plaintext is dropped on return.
pub fn reencrypt(
    gpg: &GpgEngine,
    passphrase: &str,
    encrypted: &str,
    recipient: &GpgKey,
) -> Result<String, PassboltError> {
    let plaintext = gpg.decrypt(encrypted, passphrase)?;
    let reencrypted = gpg.encrypt(&plaintext, recipient)?;
    debug!(
        "Re-encrypted secret for recipient key {}",
        recipient.fingerprint.as_deref().unwrap_or("?")
    );
    Ok(reencrypted)
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passbolt::test_server;

    #[test]
    fn test_for_resource_returns_ciphertext_unchanged() {
        let (base_url, _requests) = test_server::spawn(
            "HTTP/1.1 200 OK",
            r#"{"header":{"code":200},"body":{"id":"s1","user_id":"u1","resource_id":"r1","data":"-----BEGIN PGP MESSAGE-----\n\nwV4DkQ==\n-----END PGP MESSAGE-----"}}"#,
        );
        let client = PassboltApiClient::new(&base_url, true, 5).unwrap();
        let secret = PassboltSecrets::for_resource(&client, "r1").unwrap();
        assert_eq!(
            secret.data,
            "-----BEGIN PGP MESSAGE-----\n\nwV4DkQ==\n-----END PGP MESSAGE-----"
        );
    }

    #[test]
    fn test_resource_secret_path() {
        assert_eq!(
            resource_secret_path("8e3874ae-4b40-590b-968a-418f704b9d9a"),
            "/secrets/resource/8e3874ae-4b40-590b-968a-418f704b9d9a.json"
        );
    }

    #[test]
    fn test_reencrypt_requires_working_gpg() {
        let gpg = GpgEngine::new("/nonexistent/gpg-binary").unwrap();
        let recipient = GpgKey {
            armored_key: Some("-----BEGIN PGP PUBLIC KEY BLOCK-----".to_string()),
            ..Default::default()
        };
        let err = reencrypt(&gpg, "", "-----BEGIN PGP MESSAGE-----", &recipient).unwrap_err();
        assert_eq!(err.kind, PassboltErrorKind::IoError);
    }
}
