// Credential pair domain model
use serde::{Deserialize, Serialize};

/// Access/refresh token tuple authenticating requests to the remote API.
///
/// Both tokens are updated together through [`CredentialPair::replace`];
/// a partial update is not representable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl CredentialPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Swap in a freshly issued pair.
    pub fn replace(&mut self, access_token: &str, refresh_token: &str) {
        self.access_token = access_token.to_string();
        self.refresh_token = refresh_token.to_string();
    }
}
