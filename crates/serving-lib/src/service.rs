//! Service definitions
//!
//! A service is a fixed set of endpoints sharing one input schema. Each
//! endpoint binds a route to a logical model name and a response key.

use crate::error::ValidationError;
use crate::models::{EfficiencyInput, FeatureVector, ImpactInput};
use crate::registry::ModelSource;
use crate::schema::parse_features;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Validates a body and assembles its feature vector
pub type FeatureParser = fn(&Value) -> Result<FeatureVector, ValidationError>;

/// One prediction route bound to one model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub route: &'static str,
    pub model: &'static str,
    pub response_key: &'static str,
}

/// Environmental impact endpoints (Service A)
pub const IMPACT_ENDPOINTS: [Endpoint; 5] = [
    Endpoint {
        route: "/predict/carbon_manufacturing/",
        model: "carbon_model",
        response_key: "predicted_carbon_manufacturing",
    },
    Endpoint {
        route: "/predict/total_lifetime_emissions/",
        model: "lifetime_emissions_model",
        response_key: "predicted_total_lifetime_emissions",
    },
    Endpoint {
        route: "/predict/transportation_emissions/",
        model: "transportation_model",
        response_key: "predicted_transportation_emissions",
    },
    Endpoint {
        route: "/predict/recycling_benefits/",
        model: "recycling_model",
        response_key: "predicted_recycling_benefits",
    },
    Endpoint {
        route: "/predict/operational_emissions/",
        model: "operational_model",
        response_key: "predicted_operational_emissions",
    },
];

/// Substation efficiency endpoint (Service B)
pub const EFFICIENCY_ENDPOINTS: [Endpoint; 1] = [Endpoint {
    route: "/predict/",
    model: "efficiency_model",
    response_key: "predicted_efficiency",
}];

/// Which of the two deployable services this process runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    /// Multi-model environmental impact predictor
    #[default]
    Impact,
    /// Single-model efficiency predictor
    Efficiency,
}

impl ServiceKind {
    pub fn endpoints(self) -> &'static [Endpoint] {
        match self {
            ServiceKind::Impact => &IMPACT_ENDPOINTS,
            ServiceKind::Efficiency => &EFFICIENCY_ENDPOINTS,
        }
    }

    pub fn feature_parser(self) -> FeatureParser {
        match self {
            ServiceKind::Impact => parse_features::<ImpactInput>,
            ServiceKind::Efficiency => parse_features::<EfficiencyInput>,
        }
    }

    pub fn liveness_message(self) -> &'static str {
        match self {
            ServiceKind::Impact => "Renewable Energy Environmental Impact Predictor is live!",
            ServiceKind::Efficiency => "Power Substation Efficiency Predictor is live!",
        }
    }

    /// Logical model names required by this service
    pub fn model_names(self) -> impl Iterator<Item = &'static str> {
        self.endpoints().iter().map(|e| e.model)
    }

    /// Resolve artifact locations: `<model_dir>/<name>.onnx` unless overridden
    pub fn model_sources(
        self,
        model_dir: &Path,
        overrides: &HashMap<String, String>,
        checksums: &HashMap<String, String>,
    ) -> Vec<ModelSource> {
        self.model_names()
            .map(|name| {
                let path = overrides
                    .get(name)
                    .map(|p| model_dir.join(p))
                    .unwrap_or_else(|| model_dir.join(format!("{name}.onnx")));
                let source = ModelSource::new(name, path);
                match checksums.get(name) {
                    Some(sha) => source.with_checksum(sha.clone()),
                    None => source,
                }
            })
            .collect()
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceKind::Impact => write!(f, "impact"),
            ServiceKind::Efficiency => write!(f, "efficiency"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;
    use std::path::PathBuf;

    #[test]
    fn test_endpoint_tables_unique() {
        for kind in [ServiceKind::Impact, ServiceKind::Efficiency] {
            let routes: HashSet<_> = kind.endpoints().iter().map(|e| e.route).collect();
            let models: HashSet<_> = kind.model_names().collect();
            let keys: HashSet<_> = kind.endpoints().iter().map(|e| e.response_key).collect();
            assert_eq!(routes.len(), kind.endpoints().len());
            assert_eq!(models.len(), kind.endpoints().len());
            assert_eq!(keys.len(), kind.endpoints().len());
        }
    }

    #[test]
    fn test_routes_have_trailing_slash() {
        for endpoint in IMPACT_ENDPOINTS.iter().chain(EFFICIENCY_ENDPOINTS.iter()) {
            assert!(endpoint.route.starts_with("/predict/"));
            assert!(endpoint.route.ends_with('/'));
        }
    }

    #[test]
    fn test_default_model_sources() {
        let sources = ServiceKind::Impact.model_sources(
            Path::new("models"),
            &HashMap::new(),
            &HashMap::new(),
        );
        assert_eq!(sources.len(), 5);
        assert_eq!(sources[0].name, "carbon_model");
        assert_eq!(sources[0].path, PathBuf::from("models/carbon_model.onnx"));
        assert!(sources.iter().all(|s| s.expected_sha256.is_none()));
    }

    #[test]
    fn test_model_source_overrides() {
        let overrides = HashMap::from([(
            "efficiency_model".to_string(),
            "/opt/models/substation.json".to_string(),
        )]);
        let checksums = HashMap::from([("efficiency_model".to_string(), "ab".repeat(32))]);
        let sources =
            ServiceKind::Efficiency.model_sources(Path::new("models"), &overrides, &checksums);

        assert_eq!(sources.len(), 1);
        // Absolute overrides replace the directory
        assert_eq!(sources[0].path, PathBuf::from("/opt/models/substation.json"));
        assert_eq!(sources[0].expected_sha256.as_deref(), Some("ab".repeat(32).as_str()));
    }

    #[test]
    fn test_feature_parser_matches_schema() {
        let body = json!({
            "Cumulative_Energy_Demand": 100,
            "EROI": 10,
            "Net_Energy_Output": 50,
            "Raw_Material_Consumption": 30,
            "Recyclability_Waste_Generation": 0.7
        });
        let parse = ServiceKind::Efficiency.feature_parser();
        assert_eq!(parse(&body).unwrap(), [100.0, 10.0, 50.0, 30.0, 0.7]);
        assert!(ServiceKind::Impact.feature_parser()(&body).is_err());
    }

    #[test]
    fn test_service_kind_serde() {
        let kind: ServiceKind = serde_json::from_str("\"efficiency\"").unwrap();
        assert_eq!(kind, ServiceKind::Efficiency);
        assert_eq!(ServiceKind::default(), ServiceKind::Impact);
        assert_eq!(ServiceKind::Impact.to_string(), "impact");
    }
}
