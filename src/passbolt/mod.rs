//! Passbolt client crate: sub-modules.
//!
//! Provides a synchronous Passbolt password manager client with:
//! - Cookie-aware REST API client for a Passbolt server
//! - GPGAuth challenge-response authentication flow
//! - OpenPGP operations via the external `gpg` binary and an ephemeral keyring
//! - User and Group administration with dry-run/commit group updates
//! - Shared-secret re-encryption when group membership changes
//! - Resource and secret retrieval

pub mod api_client;
pub mod auth;
pub mod config;
pub mod crypto;
pub mod resources;
pub mod secrets;
pub mod service;
pub mod types;
pub mod users_groups;

#[cfg(test)]
pub(crate) mod test_server;

// Re-export top-level items for convenience.
pub use config::PassboltConfig;
pub use service::PassboltClient;
pub use types::*;
