//! Decoding of externally generated stock predictions
//!
//! The generative service is asked for a JSON array of objects with the
//! keys `producto`, `empresa`, `cantidad_actual`, `dias_hasta_quiebre`,
//! `alerta` and `nivel_riesgo`. Its output is untrusted: the decoder only
//! establishes shape, and the reconciler decides what to keep.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::classifier::RiskTier;

/// One prediction as returned by the generative service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPrediction {
    #[serde(rename = "producto")]
    pub product_name: String,
    #[serde(rename = "empresa")]
    pub company_name: String,
    #[serde(rename = "cantidad_actual", default, deserialize_with = "lenient_count")]
    pub current_quantity: Option<u32>,
    #[serde(rename = "dias_hasta_quiebre", default, deserialize_with = "lenient_count")]
    pub days_until_stockout: Option<u32>,
    #[serde(rename = "alerta", default)]
    pub message: Option<String>,
    #[serde(rename = "nivel_riesgo", default)]
    pub risk_level: Option<String>,
}

impl RawPrediction {
    /// The claimed tier, or `None` when the label is missing or unknown
    pub fn tier(&self) -> Option<RiskTier> {
        self.risk_level.as_deref().and_then(RiskTier::from_label)
    }
}

/// Accept integers, integral floats (`7.0`) and numeric strings; anything
/// else, including negatives and fractional values, decodes as absent.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(count_from_value))
}

fn count_from_value(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0).map(|f| f.round() as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

/// Why an external service produced no usable answer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceFailure {
    #[error("service is not configured")]
    NotConfigured,

    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("credentials were rejected")]
    InvalidCredentials,

    #[error("usage quota exceeded")]
    QuotaExceeded,

    #[error("rate limited")]
    RateLimited,

    #[error("no configured model is available")]
    ModelNotFound,

    #[error("upstream error: {0}")]
    Upstream(String),
}

impl ServiceFailure {
    /// Failures that will not clear up without operator action
    pub fn is_persistent(&self) -> bool {
        matches!(self, ServiceFailure::QuotaExceeded | ServiceFailure::InvalidCredentials)
    }

    /// Notice shown to users alongside fallback results. Plain outages and
    /// malformed output stay silent.
    pub fn advisory(&self) -> Option<&'static str> {
        match self {
            ServiceFailure::QuotaExceeded => Some(
                "The AI usage quota has been exceeded. Results are based on stock rules only until the quota resets.",
            ),
            ServiceFailure::InvalidCredentials => Some(
                "The AI API key is invalid or unauthorized. Results are based on stock rules only.",
            ),
            ServiceFailure::RateLimited | ServiceFailure::ModelNotFound => Some(
                "The AI service is temporarily unavailable. Results are based on stock rules only.",
            ),
            ServiceFailure::NotConfigured
            | ServiceFailure::Timeout
            | ServiceFailure::Connection(_)
            | ServiceFailure::Upstream(_) => None,
        }
    }
}

/// Outcome of asking the generative service for predictions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredictionSource {
    /// Structurally valid predictions
    Parsed(Vec<RawPrediction>),
    /// The service answered but not with a prediction array
    Malformed { reason: String },
    /// The service could not be reached or refused the request
    Unavailable(ServiceFailure),
}

impl PredictionSource {
    pub fn advisory(&self) -> Option<&'static str> {
        match self {
            PredictionSource::Unavailable(failure) => failure.advisory(),
            _ => None,
        }
    }
}

/// Remove a surrounding Markdown code fence, with or without a `json` tag
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = body
        .strip_prefix("json")
        .or_else(|| body.strip_prefix("JSON"))
        .unwrap_or(body);
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Decode generated text into a [`PredictionSource`]. Array elements that do
/// not match the prediction shape are skipped.
pub fn decode_predictions(text: &str) -> PredictionSource {
    let body = strip_code_fence(text);

    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            return PredictionSource::Malformed {
                reason: format!("response is not valid JSON: {}", e),
            }
        }
    };

    let Value::Array(items) = value else {
        return PredictionSource::Malformed {
            reason: "response is not a JSON array".to_string(),
        };
    };

    let predictions = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<RawPrediction>(item) {
            Ok(prediction) => Some(prediction),
            Err(e) => {
                tracing::warn!(index, error = %e, "Skipping malformed prediction element");
                None
            }
        })
        .collect();

    PredictionSource::Parsed(predictions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_fenced_array() {
        let text = "```json\n[{\"producto\":\"Mouse\",\"empresa\":\"Acme\",\"cantidad_actual\":2,\"dias_hasta_quiebre\":1,\"alerta\":\"low\",\"nivel_riesgo\":\"ALTO\"}]\n```";
        let PredictionSource::Parsed(preds) = decode_predictions(text) else {
            panic!("expected parsed predictions");
        };
        assert_eq!(preds.len(), 1);
        assert_eq!(preds[0].product_name, "Mouse");
        assert_eq!(preds[0].tier(), Some(RiskTier::High));
        assert_eq!(preds[0].days_until_stockout, Some(1));
    }

    #[test]
    fn null_days_decode_as_absent() {
        let text = r#"[{"producto":"A","empresa":"B","dias_hasta_quiebre":null,"nivel_riesgo":"NINGUNO"}]"#;
        let PredictionSource::Parsed(preds) = decode_predictions(text) else {
            panic!("expected parsed predictions");
        };
        assert_eq!(preds[0].days_until_stockout, None);
        assert_eq!(preds[0].tier(), Some(RiskTier::None));
    }

    #[test]
    fn lenient_numbers() {
        let text = r#"[{"producto":"A","empresa":"B","dias_hasta_quiebre":"4"},
                       {"producto":"C","empresa":"D","dias_hasta_quiebre":2.0},
                       {"producto":"E","empresa":"F","dias_hasta_quiebre":-3},
                       {"producto":"G","empresa":"H","dias_hasta_quiebre":2.5}]"#;
        let PredictionSource::Parsed(preds) = decode_predictions(text) else {
            panic!("expected parsed predictions");
        };
        assert_eq!(preds[0].days_until_stockout, Some(4));
        assert_eq!(preds[1].days_until_stockout, Some(2));
        assert_eq!(preds[2].days_until_stockout, None);
        assert_eq!(preds[3].days_until_stockout, None);
    }

    #[test]
    fn skips_elements_without_keys() {
        let text = r#"[{"empresa":"B"}, 7, {"producto":"A","empresa":"B"}]"#;
        let PredictionSource::Parsed(preds) = decode_predictions(text) else {
            panic!("expected parsed predictions");
        };
        assert_eq!(preds.len(), 1);
        assert_eq!(preds[0].product_name, "A");
    }

    #[test]
    fn non_array_is_malformed() {
        assert!(matches!(
            decode_predictions(r#"{"alerts": []}"#),
            PredictionSource::Malformed { .. }
        ));
        assert!(matches!(
            decode_predictions("I could not analyse the inventory."),
            PredictionSource::Malformed { .. }
        ));
    }

    #[test]
    fn strip_fence_variants() {
        assert_eq!(strip_code_fence("```\n[]\n```"), "[]");
        assert_eq!(strip_code_fence("  []  "), "[]");
        assert_eq!(strip_code_fence("```json[1]```"), "[1]");
    }

    #[test]
    fn advisories_follow_failure_kind() {
        assert!(ServiceFailure::QuotaExceeded.advisory().unwrap().contains("quota"));
        assert!(ServiceFailure::InvalidCredentials.is_persistent());
        assert!(!ServiceFailure::RateLimited.is_persistent());
        assert!(ServiceFailure::Timeout.advisory().is_none());
        assert!(PredictionSource::Malformed { reason: "x".into() }.advisory().is_none());
    }
}
