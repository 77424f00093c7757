// Store trait for durable credential persistence

use crate::domain::credentials::CredentialPair;

/// Durable home of the credential pair between process runs.
///
/// The store owns the persisted copy; the live copy is owned by the
/// gateway. The poll service bridges the two when tokens rotate.
pub trait CredentialStore: Send {
    fn save(&mut self, credentials: &CredentialPair) -> anyhow::Result<()>;
}
