use crate::errors::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ── Prediction records ──

/// Binary decision flag as emitted by a classifier: `1`, `true`, `"high"`, ...
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PredFlag {
    Number(serde_json::Number),
    Bool(bool),
    Text(String),
}

impl PredFlag {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(PredFlag::Number(n.clone())),
            Value::Bool(b) => Some(PredFlag::Bool(*b)),
            Value::String(s) => Some(PredFlag::Text(s.clone())),
            _ => None,
        }
    }

    /// `1`, `true` or the exact string `"high"`.
    #[inline]
    pub fn marks_high_risk(&self) -> bool {
        match self {
            PredFlag::Number(n) => n.as_f64() == Some(1.0),
            PredFlag::Bool(b) => *b,
            PredFlag::Text(s) => s == "high",
        }
    }

    /// Loose truthiness used for positive/negative badges on single results.
    #[inline]
    pub fn is_truthy(&self) -> bool {
        match self {
            PredFlag::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
            PredFlag::Bool(b) => *b,
            PredFlag::Text(s) => !s.is_empty(),
        }
    }
}

/// Output of a classifier-like model for one patient. Any subset of fields may be present.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassifierOutput {
    pub score: Option<f64>,
    pub pred: Option<PredFlag>,
    pub threshold: Option<f64>,
}

/// Output of a regressor-like model for one patient.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegressorOutput {
    pub prediction: Option<f64>,
}

/// One model's output for one patient, discriminated once at parse time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PredictionRecord {
    Classifier(ClassifierOutput),
    Regressor(RegressorOutput),
}

impl PredictionRecord {
    /// Batch payload rule: a mapping with a `score` key is a classifier record,
    /// otherwise one with a `prediction` key is a regressor record.
    /// Anything else (null, scalars, unrelated mappings) yields `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        if obj.contains_key("score") {
            Some(PredictionRecord::Classifier(classifier_output(obj)))
        } else if obj.contains_key("prediction") {
            Some(PredictionRecord::Regressor(regressor_output(obj)))
        } else {
            None
        }
    }

    /// Single-patient rule: classifier cards are keyed on `pred` rather than `score`.
    pub fn from_adhoc_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        if obj.contains_key("pred") {
            Some(PredictionRecord::Classifier(classifier_output(obj)))
        } else if obj.contains_key("prediction") {
            Some(PredictionRecord::Regressor(regressor_output(obj)))
        } else {
            None
        }
    }
}

fn classifier_output(obj: &Map<String, Value>) -> ClassifierOutput {
    ClassifierOutput {
        score: finite_number(obj.get("score")),
        pred: obj.get("pred").and_then(PredFlag::from_value),
        threshold: finite_number(obj.get("threshold")),
    }
}

fn regressor_output(obj: &Map<String, Value>) -> RegressorOutput {
    RegressorOutput {
        prediction: finite_number(obj.get("prediction")),
    }
}

#[inline]
fn finite_number(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64).filter(|v| v.is_finite())
}

// ── Patient entries ──

/// A named model field of a patient entry. `record` is `None` when the value
/// had neither shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOutput {
    pub model: String,
    pub record: Option<PredictionRecord>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientRiskEntry {
    pub patient_id: Option<String>,
    pub outputs: Vec<ModelOutput>,
}

impl From<Map<String, Value>> for PatientRiskEntry {
    fn from(map: Map<String, Value>) -> Self {
        let patient_id = match map.get("patient_id") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        let mut outputs: Vec<ModelOutput> = Vec::with_capacity(map.len());
        let mut nested: Option<&Map<String, Value>> = None;

        for (key, value) in &map {
            if key == "patient_id" {
                continue;
            }
            let record = PredictionRecord::from_value(value);
            // Batch scorer export: {patient_id, predictions: {Model: {...}}}
            if key == "predictions" && record.is_none() {
                if let Some(inner) = value.as_object() {
                    nested = Some(inner);
                    continue;
                }
            }
            outputs.push(ModelOutput { model: key.clone(), record });
        }

        if let Some(inner) = nested {
            for (key, value) in inner {
                if outputs.iter().any(|o| &o.model == key) {
                    continue;
                }
                outputs.push(ModelOutput {
                    model: key.clone(),
                    record: PredictionRecord::from_value(value),
                });
            }
        }

        Self { patient_id, outputs }
    }
}

// ── Artifacts ──

/// Per-model summary the upstream service writes next to the patient list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub threshold: Option<f64>,
    pub positives: Option<u64>,
    #[serde(alias = "total")]
    pub n: Option<u64>,
    #[serde(alias = "mean_prediction")]
    pub mean: Option<f64>,
    pub note: Option<String>,
    pub error: Option<String>,
}

/// Risk prediction artifact: `{models?: {...}, patients: [...]}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiskArtifact {
    pub models: Vec<(String, ModelSummary)>,
    pub patients: Vec<PatientRiskEntry>,
    /// Entries of `patients` that were not JSON objects.
    pub skipped_entries: usize,
}

impl RiskArtifact {
    pub fn from_json(raw: &str) -> EngineResult<Self> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> EngineResult<Self> {
        let Value::Object(mut root) = value else {
            return Err(EngineError::Artifact("risk artifact must be a JSON object".into()));
        };

        let mut artifact = RiskArtifact::default();

        match root.remove("patients") {
            None | Some(Value::Null) => {}
            Some(Value::Array(entries)) => {
                artifact.patients.reserve(entries.len());
                for entry in entries {
                    match entry {
                        Value::Object(map) => artifact.patients.push(PatientRiskEntry::from(map)),
                        _ => artifact.skipped_entries += 1,
                    }
                }
            }
            Some(_) => {
                return Err(EngineError::Artifact("`patients` must be an array".into()));
            }
        }

        // Newer exports nest the per-model block under `summary.counts`.
        let models = match root.remove("models") {
            Some(Value::Object(models)) => Some(models),
            _ => match root.remove("summary") {
                Some(Value::Object(mut summary)) => match summary.remove("counts") {
                    Some(Value::Object(counts)) => Some(counts),
                    _ => None,
                },
                _ => None,
            },
        };

        if let Some(models) = models {
            for (name, summary) in models {
                match serde_json::from_value::<ModelSummary>(summary) {
                    Ok(s) => artifact.models.push((name, s)),
                    Err(e) => tracing::debug!(model = %name, error = %e, "unreadable model summary"),
                }
            }
        }

        Ok(artifact)
    }

    pub fn summary_for(&self, model: &str) -> Option<&ModelSummary> {
        self.models.iter().find(|(name, _)| name == model).map(|(_, s)| s)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnomalyCounts {
    #[serde(alias = "n_anomalies")]
    pub n_flagged: Option<u64>,
    #[serde(alias = "total")]
    pub n_total: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnomalyPatient {
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(default)]
    pub zscore_any_gt3: bool,
    #[serde(default)]
    pub iqr_outlier: bool,
    /// Isolation-forest exports: 1 flagged, 0 normal.
    #[serde(default)]
    pub anomaly_flag: Option<u8>,
    #[serde(default)]
    pub anomaly_score: Option<f64>,
}

impl AnomalyPatient {
    pub fn is_flagged(&self) -> bool {
        self.zscore_any_gt3 || self.iqr_outlier || self.anomaly_flag == Some(1)
    }
}

/// Anomaly detection artifact: `{method?, summary?, patients?}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnomalyArtifact {
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub summary: Option<AnomalyCounts>,
    #[serde(default)]
    pub patients: Vec<AnomalyPatient>,
}
