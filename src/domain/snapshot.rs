// Telemetry snapshot domain model
use serde::Deserialize;
use serde_json::{Map, Value};

/// Sensor key reporting the battery state of charge in percent.
pub const SENSOR_BATTERY_PERCENT: &str = "batteryPercentage";
/// Sensor key reporting whether the vehicle is currently charging.
pub const SENSOR_CHARGING_STATUS: &str = "chargingStatus";
/// Sensor key reporting vehicle speed.
pub const SENSOR_SPEED: &str = "speed";

/// GPS fix reported alongside the sensor block. Every field is optional;
/// the API omits what the vehicle did not report.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Position {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub course: Option<f64>,
    pub height: Option<f64>,
    pub sats: Option<i64>,
    pub hdop: Option<f64>,
    pub speed: Option<f64>,
}

/// One normalized, point-in-time read of vehicle sensor and position data.
///
/// The sensor key set is dynamic and API-defined; consumers must treat
/// every key as optionally absent.
#[derive(Debug, Clone, Default)]
pub struct TelemetrySnapshot {
    pub sensors: Map<String, Value>,
    pub position: Option<Position>,
    /// Server-reported seconds since epoch, the authoritative clock for
    /// rate computation (not local wall-clock).
    pub server_time: Option<i64>,
}

impl TelemetrySnapshot {
    /// Extract the relevant fields from one raw search-result row.
    pub fn from_raw(raw: &Value) -> Self {
        let block = raw.get("sensors");

        let mut sensors = block
            .and_then(|s| s.get("sensorsData"))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let position: Option<Position> = block
            .and_then(|s| s.get("positionData"))
            .and_then(|v| serde_json::from_value(v.clone()).ok());

        // GPS speed is higher fidelity than the generic sensor key.
        if let Some(speed) = position.as_ref().and_then(|p| p.speed) {
            sensors.insert(SENSOR_SPEED.to_string(), speed.into());
        }

        let server_time = block.and_then(|s| s.get("time")).and_then(Value::as_i64);

        tracing::debug!(
            "parsed snapshot: {} sensor keys, time={:?}",
            sensors.len(),
            server_time
        );

        Self {
            sensors,
            position,
            server_time,
        }
    }

    pub fn sensor_f64(&self, key: &str) -> Option<f64> {
        self.sensors.get(key).and_then(Value::as_f64)
    }

    /// Boolean reading tolerant of the API reporting flags as 0/1.
    pub fn sensor_bool(&self, key: &str) -> Option<bool> {
        match self.sensors.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => Some(n.as_f64().is_some_and(|v| v != 0.0)),
            _ => None,
        }
    }

    pub fn battery_percent(&self) -> Option<f64> {
        self.sensor_f64(SENSOR_BATTERY_PERCENT)
    }

    /// An absent charging flag reads as not charging.
    pub fn is_charging(&self) -> bool {
        self.sensor_bool(SENSOR_CHARGING_STATUS).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_payload() {
        let raw = json!({
            "_id": "car-1",
            "sensors": {
                "sensorsData": {
                    "batteryPercentage": 64.0,
                    "chargingStatus": true,
                    "mileage": 12345
                },
                "positionData": {
                    "lat": 55.75,
                    "lon": 37.62,
                    "course": 180.0,
                    "height": 140.0,
                    "sats": 9,
                    "hdop": 0.8
                },
                "time": 1700000000
            }
        });

        let snapshot = TelemetrySnapshot::from_raw(&raw);
        assert_eq!(snapshot.battery_percent(), Some(64.0));
        assert!(snapshot.is_charging());
        assert_eq!(snapshot.sensor_f64("mileage"), Some(12345.0));
        assert_eq!(snapshot.server_time, Some(1700000000));

        let position = snapshot.position.expect("position present");
        assert_eq!(position.lat, Some(55.75));
        assert_eq!(position.lon, Some(37.62));
        assert_eq!(position.sats, Some(9));
    }

    #[test]
    fn test_gps_speed_overrides_sensor_speed() {
        let raw = json!({
            "sensors": {
                "sensorsData": { "speed": 10.0 },
                "positionData": { "speed": 42.5 },
                "time": 1700000000
            }
        });

        let snapshot = TelemetrySnapshot::from_raw(&raw);
        assert_eq!(snapshot.sensor_f64(SENSOR_SPEED), Some(42.5));
    }

    #[test]
    fn test_missing_sections_yield_empty_snapshot() {
        let snapshot = TelemetrySnapshot::from_raw(&json!({ "_id": "car-1" }));
        assert!(snapshot.sensors.is_empty());
        assert!(snapshot.position.is_none());
        assert!(snapshot.server_time.is_none());
        assert_eq!(snapshot.battery_percent(), None);
        assert!(!snapshot.is_charging());
    }

    #[test]
    fn test_numeric_charging_flag() {
        let raw = json!({
            "sensors": { "sensorsData": { "chargingStatus": 1 }, "time": 1 }
        });
        assert!(TelemetrySnapshot::from_raw(&raw).is_charging());

        let raw = json!({
            "sensors": { "sensorsData": { "chargingStatus": 0 }, "time": 1 }
        });
        assert!(!TelemetrySnapshot::from_raw(&raw).is_charging());
    }
}
