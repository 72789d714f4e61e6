//! Prediction endpoint payloads. The models behind them are opaque.

use serde::{Deserialize, Serialize};

/// Body of `POST /ai/lifespan`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LifespanInput {
    pub age: f64,
}

/// Body of `POST /ai/health_score`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthScoreInput {
    pub age: f64,
    pub weight: f64,
}

/// Body of `POST /ai/breed_risk`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BreedRiskInput {
    pub age: f64,
}

/// `{prediction}` on success, `{error}` when the model is not loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionResponse {
    #[serde(default)]
    pub prediction: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A prediction value. Lifespan and health score are numeric, breed risk may be a label.
#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    Number(f64),
    Label(String),
}

impl std::fmt::Display for Prediction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Prediction::Number(n) => write!(f, "{}", n),
            Prediction::Label(s) => f.write_str(s),
        }
    }
}

impl Prediction {
    pub(crate) fn from_value(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(Prediction::Number)
                .unwrap_or_else(|| Prediction::Label(n.to_string())),
            serde_json::Value::String(s) => Prediction::Label(s),
            other => Prediction::Label(other.to_string()),
        }
    }
}
