//! API client for communicating with a prediction server

use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// 422 with a per-field error list
    #[error("request rejected ({} field error(s))", .0.len())]
    Validation(Vec<ValidationIssue>),

    #[error("API error ({status}): {body}")]
    Status { status: StatusCode, body: String },

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// One entry of a 422 `detail` list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    #[serde(rename = "type")]
    pub kind: String,
    pub loc: Vec<Value>,
    pub msg: String,
    #[serde(default)]
    pub input: Value,
}

impl ValidationIssue {
    /// Location without the leading `body` segment, e.g. `Material_Type`
    pub fn field(&self) -> String {
        let parts: Vec<String> = self
            .loc
            .iter()
            .skip_while(|v| v.as_str() == Some("body"))
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();

        if parts.is_empty() {
            "body".to_string()
        } else {
            parts.join(".")
        }
    }
}

#[derive(Debug, Deserialize)]
struct ValidationBody {
    detail: Vec<ValidationIssue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Liveness {
    pub message: String,
}

/// Body for every environmental impact endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactRequest {
    #[serde(rename = "Material_Type")]
    pub material_type: i64,
    #[serde(rename = "Energy_Manufacturing")]
    pub energy_manufacturing: f64,
    #[serde(rename = "Plant_Size")]
    pub plant_size: f64,
    #[serde(rename = "Capacity_Factor")]
    pub capacity_factor: f64,
    #[serde(rename = "Lifespan")]
    pub lifespan: f64,
}

/// Body for the substation efficiency endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EfficiencyRequest {
    #[serde(rename = "Cumulative_Energy_Demand")]
    pub cumulative_energy_demand: f64,
    #[serde(rename = "EROI")]
    pub eroi: f64,
    #[serde(rename = "Net_Energy_Output")]
    pub net_energy_output: f64,
    #[serde(rename = "Raw_Material_Consumption")]
    pub raw_material_consumption: f64,
    #[serde(rename = "Recyclability_Waste_Generation")]
    pub recyclability_waste_generation: f64,
}

/// API client for a prediction server
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        let base_url = Url::parse(base_url)?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = self.base_url.join(path)?;
        let response = self.client.get(url).send().await?;
        Self::decode(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ApiResult<T> {
        let url = self.base_url.join(path)?;
        let response = self.client.post(url).json(body).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
        let status = response.status();

        if status == StatusCode::UNPROCESSABLE_ENTITY {
            let body = response.text().await.unwrap_or_default();
            return match serde_json::from_str::<ValidationBody>(&body) {
                Ok(parsed) => Err(ApiError::Validation(parsed.detail)),
                Err(_) => Err(ApiError::Status { status, body }),
            };
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }

        Ok(response.json().await?)
    }

    pub async fn liveness(&self) -> ApiResult<Liveness> {
        self.get("/").await
    }

    /// POST a body to a prediction route and extract `response_key`
    pub async fn predict<B: Serialize>(
        &self,
        route: &str,
        response_key: &str,
        body: &B,
    ) -> ApiResult<f64> {
        let response: HashMap<String, f64> = self.post(route, body).await?;
        response.get(response_key).copied().ok_or_else(|| {
            ApiError::UnexpectedResponse(format!("missing '{response_key}' in response"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn impact_request() -> ImpactRequest {
        ImpactRequest {
            material_type: 1,
            energy_manufacturing: 2.0,
            plant_size: 3.0,
            capacity_factor: 4.0,
            lifespan: 5.0,
        }
    }

    #[test]
    fn test_impact_request_uses_wire_names() {
        let value = serde_json::to_value(impact_request()).unwrap();
        assert_eq!(
            value,
            json!({
                "Material_Type": 1,
                "Energy_Manufacturing": 2.0,
                "Plant_Size": 3.0,
                "Capacity_Factor": 4.0,
                "Lifespan": 5.0
            })
        );
    }

    #[test]
    fn test_issue_field_strips_body() {
        let issue = ValidationIssue {
            kind: "missing".to_string(),
            loc: vec![json!("body"), json!("Lifespan")],
            msg: "Field required".to_string(),
            input: Value::Null,
        };
        assert_eq!(issue.field(), "Lifespan");

        let body_level = ValidationIssue {
            kind: "json_invalid".to_string(),
            loc: vec![json!("body"), json!(17)],
            msg: "JSON decode error".to_string(),
            input: Value::Null,
        };
        assert_eq!(body_level.field(), "17");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            ApiClient::new("not a url"),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_liveness() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message": "Power Substation Efficiency Predictor is live!"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let liveness = client.liveness().await.unwrap();

        assert_eq!(liveness.message, "Power Substation Efficiency Predictor is live!");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_predict_extracts_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/predict/carbon_manufacturing/")
            .match_body(mockito::Matcher::Json(json!({
                "Material_Type": 1,
                "Energy_Manufacturing": 2.0,
                "Plant_Size": 3.0,
                "Capacity_Factor": 4.0,
                "Lifespan": 5.0
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"predicted_carbon_manufacturing": 42.14}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let value = client
            .predict(
                "/predict/carbon_manufacturing/",
                "predicted_carbon_manufacturing",
                &impact_request(),
            )
            .await
            .unwrap();

        assert_eq!(value, 42.14);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_predict_wrong_key() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/predict/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"predicted_something_else": 1.0}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let result = client
            .predict("/predict/", "predicted_efficiency", &json!({}))
            .await;

        assert!(matches!(result, Err(ApiError::UnexpectedResponse(_))));
    }

    #[tokio::test]
    async fn test_validation_error_is_typed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/predict/")
            .with_status(422)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"detail": [{"type": "missing", "loc": ["body", "EROI"], "msg": "Field required", "input": {}}]}"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let result = client
            .predict("/predict/", "predicted_efficiency", &json!({}))
            .await;

        match result {
            Err(ApiError::Validation(issues)) => {
                assert_eq!(issues.len(), 1);
                assert_eq!(issues[0].field(), "EROI");
                assert_eq!(issues[0].kind, "missing");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_server_error_keeps_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/predict/")
            .with_status(500)
            .with_body(r#"{"detail": "Internal Server Error"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let result = client
            .predict("/predict/", "predicted_efficiency", &json!({}))
            .await;

        match result {
            Err(ApiError::Status { status, body }) => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert!(body.contains("Internal Server Error"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }
}
