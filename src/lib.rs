//! # passbolt-client
//!
//! Client for the Passbolt password manager REST API:
//! - GPGAuth challenge-response authentication (cookie + CSRF session)
//! - User and Group administration
//! - Group membership changes with shared-secret re-encryption
//! - Resource and secret retrieval
//!
//! All OpenPGP operations are delegated to the external `gpg` binary,
//! operating against an ephemeral per-client keyring.

pub mod passbolt;

pub use passbolt::config::PassboltConfig;
pub use passbolt::crypto::GpgEngine;
pub use passbolt::service::PassboltClient;
pub use passbolt::types::{PassboltError, PassboltErrorKind};
