// Poll service - One polling cycle: fetch, persist rotated tokens, estimate
use chrono::{DateTime, Utc};

use crate::application::credential_store::CredentialStore;
use crate::application::vehicle_gateway::VehicleGateway;
use crate::domain::charge_estimator::ChargeEstimator;
use crate::domain::credentials::CredentialPair;
use crate::domain::snapshot::TelemetrySnapshot;
use crate::error::VehicleApiError;

/// Result of one successful polling cycle.
#[derive(Debug, Clone)]
pub struct CycleResult {
    pub snapshot: TelemetrySnapshot,
    pub charge_complete_at: Option<DateTime<Utc>>,
    /// True when this cycle refreshed the credential pair.
    pub credentials_rotated: bool,
}

/// Drives the fetch → persist → estimate pipeline for one tracked vehicle.
///
/// The service itself performs no scheduling; the caller invokes
/// [`PollService::poll_once`] on its own interval and decides, per error
/// classification, whether to retry or halt.
pub struct PollService {
    gateway: Box<dyn VehicleGateway>,
    store: Box<dyn CredentialStore>,
    estimator: ChargeEstimator,
    last_credentials: CredentialPair,
}

impl PollService {
    pub fn new(
        gateway: Box<dyn VehicleGateway>,
        store: Box<dyn CredentialStore>,
        estimator: ChargeEstimator,
    ) -> Self {
        let last_credentials = gateway.credentials();
        Self {
            gateway,
            store,
            estimator,
            last_credentials,
        }
    }

    pub async fn poll_once(&mut self) -> Result<CycleResult, VehicleApiError> {
        let snapshot = self.gateway.fetch_snapshot().await?;
        let credentials_rotated = self.persist_if_rotated();
        let charge_complete_at = self.estimator.update(&snapshot);

        Ok(CycleResult {
            snapshot,
            charge_complete_at,
            credentials_rotated,
        })
    }

    /// Persist the pair when a fetch refreshed it. A store failure is logged
    /// and retried on the next rotation; it does not fail the cycle.
    fn persist_if_rotated(&mut self) -> bool {
        let current = self.gateway.credentials();
        if current == self.last_credentials {
            return false;
        }

        match self.store.save(&current) {
            Ok(()) => tracing::info!("persisted refreshed credentials"),
            Err(err) => tracing::error!("failed to persist refreshed credentials: {err:#}"),
        }
        self.last_credentials = current;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::charge_estimator::DEFAULT_RATE_WINDOW_POINTS;
    use crate::domain::snapshot::{SENSOR_BATTERY_PERCENT, SENSOR_CHARGING_STATUS};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    struct FakeGateway {
        outcomes: VecDeque<Result<TelemetrySnapshot, VehicleApiError>>,
        credentials: CredentialPair,
        rotate_on_next_fetch: Option<CredentialPair>,
    }

    #[async_trait]
    impl VehicleGateway for FakeGateway {
        async fn fetch_snapshot(&mut self) -> Result<TelemetrySnapshot, VehicleApiError> {
            if let Some(pair) = self.rotate_on_next_fetch.take() {
                self.credentials = pair;
            }
            self.outcomes.pop_front().expect("scripted outcome")
        }

        fn credentials(&self) -> CredentialPair {
            self.credentials.clone()
        }
    }

    #[derive(Clone, Default)]
    struct RecordingStore {
        saved: Arc<Mutex<Vec<CredentialPair>>>,
    }

    impl CredentialStore for RecordingStore {
        fn save(&mut self, credentials: &CredentialPair) -> anyhow::Result<()> {
            self.saved.lock().unwrap().push(credentials.clone());
            Ok(())
        }
    }

    struct FailingStore;

    impl CredentialStore for FailingStore {
        fn save(&mut self, _credentials: &CredentialPair) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }
    }

    fn charging_snapshot(percent: f64, time: i64) -> TelemetrySnapshot {
        let mut snap = TelemetrySnapshot::default();
        snap.sensors
            .insert(SENSOR_CHARGING_STATUS.to_string(), true.into());
        snap.sensors
            .insert(SENSOR_BATTERY_PERCENT.to_string(), percent.into());
        snap.server_time = Some(time);
        snap
    }

    fn service(gateway: FakeGateway, store: impl CredentialStore + 'static) -> PollService {
        PollService::new(
            Box::new(gateway),
            Box::new(store),
            ChargeEstimator::new(DEFAULT_RATE_WINDOW_POINTS),
        )
    }

    #[tokio::test]
    async fn test_rotated_credentials_are_persisted_once() {
        let rotated = CredentialPair::new("access-2", "refresh-2");
        let gateway = FakeGateway {
            outcomes: VecDeque::from([
                Ok(charging_snapshot(60.0, 0)),
                Ok(charging_snapshot(61.0, 600)),
            ]),
            credentials: CredentialPair::new("access-1", "refresh-1"),
            rotate_on_next_fetch: Some(rotated.clone()),
        };
        let store = RecordingStore::default();
        let mut service = service(gateway, store.clone());

        let first = service.poll_once().await.unwrap();
        assert!(first.credentials_rotated);
        assert_eq!(*store.saved.lock().unwrap(), vec![rotated]);

        let second = service.poll_once().await.unwrap();
        assert!(!second.credentials_rotated);
        assert_eq!(store.saved.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_store_failure_does_not_fail_the_cycle() {
        let gateway = FakeGateway {
            outcomes: VecDeque::from([Ok(charging_snapshot(60.0, 0))]),
            credentials: CredentialPair::new("access-1", "refresh-1"),
            rotate_on_next_fetch: Some(CredentialPair::new("access-2", "refresh-2")),
        };
        let mut service = service(gateway, FailingStore);

        let result = service.poll_once().await.unwrap();
        assert!(result.credentials_rotated);
    }

    #[tokio::test]
    async fn test_estimator_is_fed_across_cycles() {
        let gateway = FakeGateway {
            outcomes: VecDeque::from([
                Ok(charging_snapshot(60.0, 0)),
                Ok(charging_snapshot(64.0, 1200)),
            ]),
            credentials: CredentialPair::new("access-1", "refresh-1"),
            rotate_on_next_fetch: None,
        };
        let mut service = service(gateway, RecordingStore::default());

        assert!(service.poll_once().await.unwrap().charge_complete_at.is_none());
        assert!(service.poll_once().await.unwrap().charge_complete_at.is_some());
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates_classified() {
        let gateway = FakeGateway {
            outcomes: VecDeque::from([Err(VehicleApiError::AuthFailed("expired".into()))]),
            credentials: CredentialPair::new("access-1", "refresh-1"),
            rotate_on_next_fetch: None,
        };
        let store = RecordingStore::default();
        let mut service = service(gateway, store.clone());

        let err = service.poll_once().await.unwrap_err();
        assert!(matches!(err, VehicleApiError::AuthFailed(_)));
        assert!(store.saved.lock().unwrap().is_empty());
    }
}
