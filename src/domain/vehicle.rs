// Vehicle and organization records from the account-linking flow
use serde_json::Value;

/// One organization the authenticated account belongs to.
#[derive(Debug, Clone)]
pub struct Organization {
    pub id: String,
    pub name: String,
}

impl Organization {
    /// The API is inconsistent about its id key; accept `_id` or `id`.
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let id = string_field(raw, &["_id", "id"])?;
        let name = string_field(raw, &["name"]).unwrap_or_else(|| id.clone());
        Some(Self { id, name })
    }
}

/// One vehicle visible to the authenticated account.
#[derive(Debug, Clone)]
pub struct VehicleRecord {
    pub id: String,
    pub model: Option<String>,
    pub name: Option<String>,
    pub plate: Option<String>,
    pub vin: Option<String>,
}

impl VehicleRecord {
    pub fn from_raw(raw: &Value) -> Option<Self> {
        Some(Self {
            id: string_field(raw, &["_id", "id"])?,
            model: string_field(raw, &["model", "modelName"]),
            name: string_field(raw, &["name"]),
            plate: string_field(raw, &["plateNumber", "grz"]),
            vin: string_field(raw, &["vin"]),
        })
    }

    /// Human-readable label, e.g. `FREE Dream [A123BC] (VIN: LDP...)`.
    pub fn label(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(model) = &self.model {
            parts.push(model.clone());
        }
        if let Some(name) = &self.name {
            if self.model.as_deref() != Some(name) {
                parts.push(name.clone());
            }
        }
        if let Some(plate) = &self.plate {
            parts.push(format!("[{plate}]"));
        }
        if let Some(vin) = &self.vin {
            parts.push(format!("(VIN: {vin})"));
        }
        if parts.is_empty() {
            return self.id.clone();
        }
        parts.join(" ")
    }
}

fn string_field(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| raw.get(key).and_then(Value::as_str))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_vehicle_label() {
        let record = VehicleRecord::from_raw(&json!({
            "_id": "car-1",
            "model": "FREE",
            "name": "Dream",
            "plateNumber": "A123BC",
            "vin": "LDP31B961NE000001"
        }))
        .unwrap();
        assert_eq!(record.label(), "FREE Dream [A123BC] (VIN: LDP31B961NE000001)");
    }

    #[test]
    fn test_vehicle_label_falls_back_to_id() {
        let record = VehicleRecord::from_raw(&json!({ "id": "car-2" })).unwrap();
        assert_eq!(record.label(), "car-2");
    }

    #[test]
    fn test_duplicate_model_name_collapses() {
        let record = VehicleRecord::from_raw(&json!({
            "_id": "car-3",
            "model": "FREE",
            "name": "FREE"
        }))
        .unwrap();
        assert_eq!(record.label(), "FREE");
    }

    #[test]
    fn test_organization_requires_an_id() {
        assert!(Organization::from_raw(&json!({ "name": "Fleet" })).is_none());
        let org = Organization::from_raw(&json!({ "_id": "org-1" })).unwrap();
        assert_eq!(org.name, "org-1");
    }
}
