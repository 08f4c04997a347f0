//! Resource (password entry) endpoints.

use crate::passbolt::api_client::PassboltApiClient;
use crate::passbolt::types::*;

/// Resource endpoints.
pub struct PassboltResources;

impl PassboltResources {
    /// List all resources visible to the authenticated user.
    pub fn list(client: &PassboltApiClient) -> Result<Vec<Resource>, PassboltError> {
        client.get_body("/resources.json")
    }

    /// Fetch a single resource by uuid.
    pub fn get(client: &PassboltApiClient, uuid: &str) -> Result<Resource, PassboltError> {
        client.get_body(&format!("/resources/{}.json", uuid))
    }
}
