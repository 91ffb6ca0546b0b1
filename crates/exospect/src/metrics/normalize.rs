//! Canonical-schema normalization for the metrics payload.
//!
//! The upstream has renamed its metric fields several times; every logical
//! field has accumulated historical aliases. Normalization picks the first
//! present numeric alias per field, in a fixed priority order, and falls
//! back to the built-in constant when none are present. The alias lists are
//! declarative data — adding a newly observed alias is a one-line change.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::FetchError;

/// Canonical model-quality figures. All fields are fractions in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub accuracy: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub precision: f64,
}

/// Built-in fallback figures, served when the upstream is unreachable and
/// nothing is cached.
pub const DEFAULT_METRICS: ModelMetrics = ModelMetrics {
    accuracy: 0.9234,
    recall: 0.8876,
    f1_score: 0.9145,
    precision: 0.9567,
};

/// One logical metric field: its aliases in priority order and its default.
struct MetricField {
    aliases: &'static [&'static str],
    default: f64,
}

const ACCURACY: MetricField = MetricField {
    aliases: &["accuracy", "Accuracy"],
    default: DEFAULT_METRICS.accuracy,
};

const RECALL: MetricField = MetricField {
    aliases: &["recall", "candidate_recall", "Recall", "Candidate Recall"],
    default: DEFAULT_METRICS.recall,
};

const F1_SCORE: MetricField = MetricField {
    aliases: &[
        "f1_score",
        "confirmed_f1_score",
        "f1",
        "F1",
        "F1 Score",
        "Confirmed F1 Score",
    ],
    default: DEFAULT_METRICS.f1_score,
};

const PRECISION: MetricField = MetricField {
    aliases: &[
        "precision",
        "false_positive_precision",
        "Precision",
        "False Positive Precision",
    ],
    default: DEFAULT_METRICS.precision,
};

impl MetricField {
    fn pick(&self, obj: &serde_json::Map<String, Value>) -> f64 {
        self.aliases
            .iter()
            .find_map(|alias| obj.get(*alias).and_then(Value::as_f64))
            .unwrap_or(self.default)
    }
}

/// Normalize a raw metrics payload into the canonical schema.
///
/// The only hard failure is a payload that isn't a JSON object; missing or
/// non-numeric fields silently take their per-field defaults, absorbing
/// upstream schema drift.
pub fn normalize(raw: &Value) -> Result<ModelMetrics, FetchError> {
    let Some(obj) = raw.as_object() else {
        return Err(FetchError::Malformed(
            "metrics payload is not a JSON object".to_string(),
        ));
    };
    Ok(ModelMetrics {
        accuracy: ACCURACY.pick(obj),
        recall: RECALL.pick(obj),
        f1_score: F1_SCORE.pick(obj),
        precision: PRECISION.pick(obj),
    })
}
