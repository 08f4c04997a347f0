//! User and group management.
//!
//! Group membership changes follow the server's two-phase protocol: a
//! dry-run put announces the change and returns the secrets the new
//! member needs, the client re-encrypts each one for that member, and
//! only then does the commit put apply the change. A rejected dry-run
//! aborts the flow; the commit is never issued.

use crate::passbolt::api_client::PassboltApiClient;
use crate::passbolt::crypto::GpgEngine;
use crate::passbolt::secrets;
use crate::passbolt::types::*;
use log::{debug, info};

// ── User operations ─────────────────────────────────────────────────

/// User endpoints.
pub struct PassboltUsers;

impl PassboltUsers {
    /// List all users visible to the authenticated user.
    pub fn list(client: &PassboltApiClient) -> Result<Vec<User>, PassboltError> {
        client.get_body("/users.json")
    }

    /// Fetch a single user by id, including group memberships and key.
    pub fn get(client: &PassboltApiClient, user_id: &str) -> Result<User, PassboltError> {
        client.get_body(&format!("/users/{}.json", user_id))
    }

    /// Fetch a user's stored public key.
    pub fn public_key(client: &PassboltApiClient, user_id: &str) -> Result<GpgKey, PassboltError> {
        let user = Self::get(client, user_id)?;
        user.gpgkey.ok_or_else(|| {
            PassboltError::not_found(format!("User {} has no stored public key", user_id))
        })
    }
}

// ── Group operations ────────────────────────────────────────────────

/// Group endpoints.
pub struct PassboltGroups;

impl PassboltGroups {
    /// List all groups.
    pub fn list(client: &PassboltApiClient) -> Result<Vec<Group>, PassboltError> {
        client.get_body("/groups.json")
    }

    /// Create a group with the given user as its first group admin.
    pub fn create(
        client: &PassboltApiClient,
        name: &str,
        admin_user_id: &str,
    ) -> Result<Group, PassboltError> {
        let request = CreateGroupRequest {
            name: name.to_string(),
            groups_users: vec![GroupUserEntry {
                user_id: admin_user_id.to_string(),
                is_admin: true,
            }],
        };
        let group: Group = client.post_body("/groups.json", &request)?;
        info!("Created group '{}' ({})", group.name, group.id);
        Ok(group)
    }

    /// Add a user to a group, re-encrypting the group's secrets for them.
    ///
    /// Runs the dry-run put first; its response lists every secret the new
    /// member needs access to. Each is decrypted with our own key and
    /// encrypted for the member's public key, then the commit put applies
    /// the membership change together with the re-encrypted copies.
    pub fn add_user(
        client: &PassboltApiClient,
        gpg: &GpgEngine,
        passphrase: &str,
        group_id: &str,
        user_id: &str,
        is_admin: bool,
    ) -> Result<Group, PassboltError> {
        let request = UpdateGroupRequest {
            id: group_id.to_string(),
            groups_users: vec![GroupUserChange {
                id: None,
                user_id: Some(user_id.to_string()),
                is_admin,
            }],
            secrets: None,
        };

        let dry_run: GroupDryRunBody =
            client.put_body(&format!("/groups/{}/dry-run.json", group_id), &request)?;
        debug!(
            "Dry-run accepted: {} secret(s) to re-encrypt for user {}",
            dry_run.dry_run.secrets.len(),
            user_id
        );

        let recipient = PassboltUsers::public_key(client, user_id)?;
        let mut shares = Vec::with_capacity(dry_run.dry_run.secrets.len());
        for bundle in &dry_run.dry_run.secrets {
            let secret = bundle.secret.first().ok_or_else(|| {
                PassboltError::parse("Dry-run returned an empty secret bundle")
            })?;
            let data = secrets::reencrypt(gpg, passphrase, &secret.data, &recipient)?;
            shares.push(ShareSecret {
                resource_id: secret.resource_id.clone(),
                user_id: user_id.to_string(),
                data,
            });
        }

        let commit = UpdateGroupRequest {
            secrets: Some(shares),
            ..request
        };
        let group: Group = client.put_body(&format!("/groups/{}.json", group_id), &commit)?;
        info!("Added user {} to group {}", user_id, group_id);
        Ok(group)
    }

    /// Promote an existing group member to group admin.
    ///
    /// Admin promotion changes no secret access, so the dry-run carries no
    /// secrets and the commit reuses the same payload. The change targets
    /// the membership record id, not the user id.
    pub fn promote_to_admin(
        client: &PassboltApiClient,
        group_id: &str,
        user_id: &str,
    ) -> Result<Group, PassboltError> {
        let user = PassboltUsers::get(client, user_id)?;
        let membership = membership_id(&user, group_id).ok_or_else(|| {
            PassboltError::not_found(format!(
                "User {} is not a member of group {}",
                user_id, group_id
            ))
        })?;

        let request = UpdateGroupRequest {
            id: group_id.to_string(),
            groups_users: vec![GroupUserChange {
                id: Some(membership.to_string()),
                user_id: None,
                is_admin: true,
            }],
            secrets: None,
        };

        let _: serde_json::Value =
            client.put_body(&format!("/groups/{}/dry-run.json", group_id), &request)?;
        let group: Group = client.put_body(&format!("/groups/{}.json", group_id), &request)?;
        info!("Promoted user {} to admin of group {}", user_id, group_id);
        Ok(group)
    }
}

// ── Lookup helpers ──────────────────────────────────────────────────
//
// Lookups scan full listings; the first match wins. Absence is a normal
// outcome, so they return Option rather than an error.

/// Find a user by login email.
pub fn find_user_by_username<'a>(users: &'a [User], username: &str) -> Option<&'a User> {
    users
        .iter()
        .find(|u| u.username.as_deref() == Some(username))
}

/// Find a user by id.
pub fn find_user_by_id<'a>(users: &'a [User], user_id: &str) -> Option<&'a User> {
    users.iter().find(|u| u.id == user_id)
}

/// Find a group by name.
pub fn find_group_by_name<'a>(groups: &'a [Group], name: &str) -> Option<&'a Group> {
    groups.iter().find(|g| g.name == name)
}

/// Find a group by id.
pub fn find_group_by_id<'a>(groups: &'a [Group], group_id: &str) -> Option<&'a Group> {
    groups.iter().find(|g| g.id == group_id)
}

/// Membership record id linking a user to a group, if any.
pub fn membership_id<'a>(user: &'a User, group_id: &str) -> Option<&'a str> {
    user.groups_users
        .as_deref()?
        .iter()
        .find(|m| m.group_id == group_id)
        .map(|m| m.id.as_str())
}

// ── Tests ───────────────────────────────────────────────────────────
