//! Core data models for the prediction services

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Number of input features every served model expects
pub const FEATURE_COUNT: usize = 5;

/// Ordered numeric encoding of one input record, as consumed by a model
pub type FeatureVector = [f64; FEATURE_COUNT];

/// Declared type of an input field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Int,
    Float,
}

/// Name and type of one input field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn int(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Int,
        }
    }

    pub const fn float(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Float,
        }
    }
}

/// A validated field value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
}

impl FieldValue {
    pub fn as_f64(self) -> f64 {
        match self {
            FieldValue::Int(v) => v as f64,
            FieldValue::Float(v) => v,
        }
    }

    pub fn as_i64(self) -> i64 {
        match self {
            FieldValue::Int(v) => v,
            FieldValue::Float(v) => v as i64,
        }
    }
}

/// Plant description accepted by the environmental impact endpoints
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactInput {
    pub material_type: i64,
    pub energy_manufacturing: f64,
    pub plant_size: f64,
    pub capacity_factor: f64,
    pub lifespan: f64,
}

/// Substation energy figures accepted by the efficiency endpoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EfficiencyInput {
    pub cumulative_energy_demand: f64,
    pub eroi: f64,
    pub net_energy_output: f64,
    pub raw_material_consumption: f64,
    pub recyclability_waste_generation: f64,
}

/// Single-key prediction body, e.g. `{"predicted_efficiency": 87.5}`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionResponse {
    pub key: &'static str,
    pub value: f64,
}

impl Serialize for PredictionResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.key, &self.value)?;
        map.end()
    }
}

/// Liveness body returned by `GET /`
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LivenessResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_response_is_single_key_object() {
        let response = PredictionResponse {
            key: "predicted_carbon_manufacturing",
            value: 42.14,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"predicted_carbon_manufacturing":42.14}"#);
    }

    #[test]
    fn test_field_value_conversions() {
        assert_eq!(FieldValue::Int(3).as_f64(), 3.0);
        assert_eq!(FieldValue::Float(2.5).as_f64(), 2.5);
        assert_eq!(FieldValue::Int(-7).as_i64(), -7);
    }
}
