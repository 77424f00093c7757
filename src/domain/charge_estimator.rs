// Charge completion estimation from battery percent history
use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};

use super::snapshot::TelemetrySnapshot;

/// State of charge at which a session is considered complete.
const TARGET_BATTERY_PERCENT: f64 = 100.0;

/// Default sliding-window capacity; 4 data points spans roughly a 3%
/// charge window at the granularity the API reports at.
pub const DEFAULT_RATE_WINDOW_POINTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
struct ChargeSample {
    percent: f64,
    server_time: i64,
}

/// Estimates charging completion time assuming a linear charge rate.
///
/// Samples are appended only when the reported battery percent actually
/// changes, so the window spans real charge progress rather than polling
/// frequency. A single point-to-point rate is too noisy; the small window
/// smooths the estimate while staying responsive to rate changes such as
/// curtailment near full.
#[derive(Debug, Clone)]
pub struct ChargeEstimator {
    window: VecDeque<ChargeSample>,
    capacity: usize,
    last_seen_percent: Option<f64>,
    cached_completion: Option<DateTime<Utc>>,
    charging: bool,
}

impl ChargeEstimator {
    pub fn new(window_points: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(window_points),
            capacity: window_points.max(2),
            last_seen_percent: None,
            cached_completion: None,
            charging: false,
        }
    }

    /// Feed one snapshot; returns the current completion estimate, if any.
    ///
    /// Never fails: every anomalous numeric condition degrades to `None`.
    pub fn update(&mut self, snapshot: &TelemetrySnapshot) -> Option<DateTime<Utc>> {
        let is_charging = snapshot.is_charging();

        if !is_charging {
            if self.charging {
                tracing::debug!("charging stopped, resetting rate tracking");
                self.reset();
            }
            return None;
        }

        if !self.charging {
            // New charging session; any prior estimate is stale.
            let percent = snapshot.battery_percent();
            self.charging = true;
            self.last_seen_percent = percent;
            self.cached_completion = None;
            if let (Some(percent), Some(time)) = (percent, snapshot.server_time) {
                self.push_sample(percent, time);
            }
            tracing::debug!(?percent, time = ?snapshot.server_time, "charging started");
            return self.cached_completion;
        }

        if let Some(percent) = snapshot.battery_percent() {
            if self.last_seen_percent != Some(percent) {
                tracing::debug!(
                    "battery percent changed: {:?} -> {} (time={:?})",
                    self.last_seen_percent,
                    percent,
                    snapshot.server_time
                );
                self.last_seen_percent = Some(percent);
                if let Some(time) = snapshot.server_time {
                    self.push_sample(percent, time);
                    self.cached_completion = self.compute_completion();
                }
            }
        }

        self.cached_completion
    }

    fn reset(&mut self) {
        self.window.clear();
        self.last_seen_percent = None;
        self.cached_completion = None;
        self.charging = false;
    }

    fn push_sample(&mut self, percent: f64, server_time: i64) {
        self.window.push_back(ChargeSample {
            percent,
            server_time,
        });
        while self.window.len() > self.capacity {
            self.window.pop_front();
        }
    }

    fn compute_completion(&self) -> Option<DateTime<Utc>> {
        let oldest = self.window.front()?;
        let newest = self.window.back()?;
        if self.window.len() < 2 {
            return None;
        }

        if newest.percent >= TARGET_BATTERY_PERCENT {
            return None;
        }

        let delta_percent = newest.percent - oldest.percent;
        let delta_time = newest.server_time - oldest.server_time;

        // Flat or time-inverted window: discharge while nominally charging,
        // or server clock anomalies. Nothing sane to divide by.
        if delta_percent <= 0.0 || delta_time <= 0 {
            return None;
        }

        let rate = delta_percent / delta_time as f64; // percent per second
        let remaining_percent = TARGET_BATTERY_PERCENT - newest.percent;
        let remaining_seconds = remaining_percent / rate;
        let completion = Utc::now() + Duration::seconds(remaining_seconds.round() as i64);

        tracing::debug!(
            "charge estimate: {} pts ({}%..{}%), rate={:.4}%/s, remaining={:.0}s, full at {}",
            self.window.len(),
            oldest.percent,
            newest.percent,
            rate,
            remaining_seconds,
            completion.to_rfc3339()
        );

        Some(completion)
    }
}

impl Default for ChargeEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_WINDOW_POINTS)
    }
}
