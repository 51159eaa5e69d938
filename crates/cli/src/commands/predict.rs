//! Prediction commands

use anyhow::Result;
use clap::{Args, ValueEnum};
use serde_json::{Map, Value};

use crate::client::{ApiClient, EfficiencyRequest, ImpactRequest};
use crate::commands::report;
use crate::output::{format_prediction, metric_label, print_table, OutputFormat, PredictionRow};

/// Environmental impact metric to predict
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImpactTarget {
    CarbonManufacturing,
    TotalLifetimeEmissions,
    TransportationEmissions,
    RecyclingBenefits,
    OperationalEmissions,
    /// Every metric, one request each
    All,
}

const IMPACT_METRICS: [ImpactTarget; 5] = [
    ImpactTarget::CarbonManufacturing,
    ImpactTarget::TotalLifetimeEmissions,
    ImpactTarget::TransportationEmissions,
    ImpactTarget::RecyclingBenefits,
    ImpactTarget::OperationalEmissions,
];

impl ImpactTarget {
    /// `(route, response key)` pairs this target expands to
    pub fn routes(self) -> Vec<(&'static str, &'static str)> {
        match self {
            ImpactTarget::All => IMPACT_METRICS.iter().flat_map(|t| t.routes()).collect(),
            ImpactTarget::CarbonManufacturing => vec![(
                "/predict/carbon_manufacturing/",
                "predicted_carbon_manufacturing",
            )],
            ImpactTarget::TotalLifetimeEmissions => vec![(
                "/predict/total_lifetime_emissions/",
                "predicted_total_lifetime_emissions",
            )],
            ImpactTarget::TransportationEmissions => vec![(
                "/predict/transportation_emissions/",
                "predicted_transportation_emissions",
            )],
            ImpactTarget::RecyclingBenefits => vec![(
                "/predict/recycling_benefits/",
                "predicted_recycling_benefits",
            )],
            ImpactTarget::OperationalEmissions => vec![(
                "/predict/operational_emissions/",
                "predicted_operational_emissions",
            )],
        }
    }
}

pub const EFFICIENCY_ROUTE: &str = "/predict/";
pub const EFFICIENCY_KEY: &str = "predicted_efficiency";

/// Installation features for the impact service
#[derive(Debug, Clone, Args)]
pub struct ImpactArgs {
    /// Material category code
    #[arg(long, allow_negative_numbers = true)]
    pub material_type: i64,

    #[arg(long, allow_negative_numbers = true)]
    pub energy_manufacturing: f64,

    #[arg(long, allow_negative_numbers = true)]
    pub plant_size: f64,

    #[arg(long, allow_negative_numbers = true)]
    pub capacity_factor: f64,

    /// Expected lifespan in years
    #[arg(long, allow_negative_numbers = true)]
    pub lifespan: f64,
}

impl From<ImpactArgs> for ImpactRequest {
    fn from(args: ImpactArgs) -> Self {
        Self {
            material_type: args.material_type,
            energy_manufacturing: args.energy_manufacturing,
            plant_size: args.plant_size,
            capacity_factor: args.capacity_factor,
            lifespan: args.lifespan,
        }
    }
}

/// Substation features for the efficiency service
#[derive(Debug, Clone, Args)]
pub struct EfficiencyArgs {
    #[arg(long, allow_negative_numbers = true)]
    pub cumulative_energy_demand: f64,

    /// Energy returned on energy invested
    #[arg(long, allow_negative_numbers = true)]
    pub eroi: f64,

    #[arg(long, allow_negative_numbers = true)]
    pub net_energy_output: f64,

    #[arg(long, allow_negative_numbers = true)]
    pub raw_material_consumption: f64,

    #[arg(long, allow_negative_numbers = true)]
    pub recyclability_waste_generation: f64,
}

impl From<EfficiencyArgs> for EfficiencyRequest {
    fn from(args: EfficiencyArgs) -> Self {
        Self {
            cumulative_energy_demand: args.cumulative_energy_demand,
            eroi: args.eroi,
            net_energy_output: args.net_energy_output,
            raw_material_consumption: args.raw_material_consumption,
            recyclability_waste_generation: args.recyclability_waste_generation,
        }
    }
}

/// Predict one or all environmental impact metrics
pub async fn predict_impact(
    client: &ApiClient,
    target: ImpactTarget,
    args: ImpactArgs,
    format: OutputFormat,
) -> Result<()> {
    let request = ImpactRequest::from(args);

    let mut results = Vec::new();
    for (route, key) in target.routes() {
        let value = client
            .predict(route, key, &request)
            .await
            .map_err(|e| report(e, format))?;
        results.push((key, value));
    }

    print_predictions(&results, format)
}

/// Predict substation efficiency
pub async fn predict_efficiency(
    client: &ApiClient,
    args: EfficiencyArgs,
    format: OutputFormat,
) -> Result<()> {
    let request = EfficiencyRequest::from(args);
    let value = client
        .predict(EFFICIENCY_ROUTE, EFFICIENCY_KEY, &request)
        .await
        .map_err(|e| report(e, format))?;

    print_predictions(&[(EFFICIENCY_KEY, value)], format)
}

fn print_predictions(results: &[(&str, f64)], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let object: Map<String, Value> = results
                .iter()
                .map(|(key, value)| (key.to_string(), Value::from(*value)))
                .collect();
            println!("{}", serde_json::to_string_pretty(&object)?);
        }
        OutputFormat::Table => {
            let rows: Vec<PredictionRow> = results
                .iter()
                .map(|(key, value)| PredictionRow {
                    metric: metric_label(key),
                    prediction: format_prediction(*value),
                })
                .collect();
            print_table(&rows, format);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_expands_to_every_metric() {
        let routes = ImpactTarget::All.routes();
        assert_eq!(routes.len(), 5);
        assert!(routes
            .iter()
            .all(|(route, key)| route.starts_with("/predict/") && key.starts_with("predicted_")));
    }

    #[test]
    fn test_single_target_route() {
        assert_eq!(
            ImpactTarget::RecyclingBenefits.routes(),
            vec![("/predict/recycling_benefits/", "predicted_recycling_benefits")]
        );
    }

    #[test]
    fn test_route_and_key_share_a_suffix() {
        for (route, key) in ImpactTarget::All.routes() {
            let name = route.trim_start_matches("/predict/").trim_end_matches('/');
            assert_eq!(key, format!("predicted_{name}"));
        }
    }

    #[tokio::test]
    async fn test_predict_impact_all_hits_every_route() {
        let mut server = mockito::Server::new_async().await;
        let mut mocks = Vec::new();
        for (route, key) in ImpactTarget::All.routes() {
            mocks.push(
                server
                    .mock("POST", route)
                    .with_status(200)
                    .with_header("content-type", "application/json")
                    .with_body(format!(r#"{{"{key}": 1.25}}"#))
                    .create_async()
                    .await,
            );
        }

        let client = ApiClient::new(&server.url()).unwrap();
        let args = ImpactArgs {
            material_type: 2,
            energy_manufacturing: 1.0,
            plant_size: 1.0,
            capacity_factor: 0.3,
            lifespan: 25.0,
        };
        predict_impact(&client, ImpactTarget::All, args, OutputFormat::Json)
            .await
            .unwrap();

        for mock in mocks {
            mock.assert_async().await;
        }
    }

    #[tokio::test]
    async fn test_predict_efficiency_validation_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", EFFICIENCY_ROUTE)
            .with_status(422)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"detail": [{"type": "float_parsing", "loc": ["body", "EROI"], "msg": "Input should be a valid number, unable to parse string as a number", "input": "x"}]}"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let args = EfficiencyArgs {
            cumulative_energy_demand: 1.0,
            eroi: 2.0,
            net_energy_output: 3.0,
            raw_material_consumption: 4.0,
            recyclability_waste_generation: 5.0,
        };
        let err = predict_efficiency(&client, args, OutputFormat::Table)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("rejected"));
    }
}
