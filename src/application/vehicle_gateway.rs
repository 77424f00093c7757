// Gateway trait for the authenticated vehicle API
use async_trait::async_trait;

use crate::domain::credentials::CredentialPair;
use crate::domain::snapshot::TelemetrySnapshot;
use crate::error::VehicleApiError;

/// Boundary to the remote vehicle API for one tracked vehicle.
///
/// A fetch may rotate the credential pair as a side effect (token refresh);
/// callers compare [`VehicleGateway::credentials`] across calls to detect
/// this. Access is single-threaded within one polling cycle.
#[async_trait]
pub trait VehicleGateway: Send {
    /// Fetch a live snapshot, transparently refreshing expired credentials
    /// at most once.
    async fn fetch_snapshot(&mut self) -> Result<TelemetrySnapshot, VehicleApiError>;

    /// The credential pair currently held by the gateway.
    fn credentials(&self) -> CredentialPair;
}
