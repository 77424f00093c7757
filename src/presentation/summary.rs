// Human-readable rendering of one polling cycle
use crate::application::poll_service::CycleResult;
use crate::domain::snapshot::SENSOR_SPEED;

/// One log line per cycle. Every field is optional; whatever the API did
/// not report is simply left out.
pub fn cycle_summary(result: &CycleResult) -> String {
    let snapshot = &result.snapshot;
    let mut parts: Vec<String> = Vec::new();

    if let Some(percent) = snapshot.battery_percent() {
        if snapshot.is_charging() {
            match result.charge_complete_at {
                Some(at) => parts.push(format!(
                    "battery {percent}% (charging, full at {})",
                    at.format("%Y-%m-%d %H:%M UTC")
                )),
                None => parts.push(format!("battery {percent}% (charging)")),
            }
        } else {
            parts.push(format!("battery {percent}%"));
        }
    }

    if let Some(speed) = snapshot.sensor_f64(SENSOR_SPEED) {
        parts.push(format!("speed {speed} km/h"));
    }

    if let Some(position) = &snapshot.position {
        if let (Some(lat), Some(lon)) = (position.lat, position.lon) {
            parts.push(format!("position {lat:.5},{lon:.5}"));
        }
    }

    if parts.is_empty() {
        return format!("{} sensor keys, nothing recognized", snapshot.sensors.len());
    }
    parts.join(", ")
}
