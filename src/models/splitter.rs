use super::payload::{PatientRiskEntry, PredictionRecord};
use super::{ClassifierRecord, ModelKind, ModelSeries, RegressorRecord};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// A record whose shape disagreed with the kind its model was resolved to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeConflict {
    pub model: String,
    pub patient_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitResult {
    /// One series per model, in first-seen order.
    pub series: Vec<ModelSeries>,
    pub shape_conflicts: Vec<ShapeConflict>,
    /// (patient, model) pairs whose value had neither shape.
    pub skipped: usize,
    /// Records dropped because the patient already had one for that model.
    pub duplicates: usize,
}

impl SplitResult {
    pub fn get(&self, model: &str) -> Option<&ModelSeries> {
        self.series.iter().find(|s| s.name() == model)
    }
}

/// Partition patient entries into one ordered series per model.
///
/// Kind resolution: a model is a classifier if any patient carries a
/// classifier-shaped record for it, otherwise a regressor. Records of the
/// losing shape are dropped and reported in `shape_conflicts`.
/// Malformed or null values are skipped, never an error.
pub fn split(entries: &[PatientRiskEntry]) -> SplitResult {
    // Pass 1: resolve each model's kind.
    let mut kinds: Vec<(&str, ModelKind)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for entry in entries {
        for output in &entry.outputs {
            let Some(record) = &output.record else { continue };
            let kind = record_kind(record);
            match index.get(output.model.as_str()) {
                Some(&i) => {
                    if kind == ModelKind::Classifier {
                        kinds[i].1 = ModelKind::Classifier;
                    }
                }
                None => {
                    index.insert(output.model.as_str(), kinds.len());
                    kinds.push((output.model.as_str(), kind));
                }
            }
        }
    }

    // Pass 2: fill the series.
    let mut result = SplitResult {
        series: kinds.iter().map(|&(name, kind)| ModelSeries::new(name, kind)).collect(),
        ..SplitResult::default()
    };
    let mut seen: Vec<HashSet<&str>> = vec![HashSet::new(); kinds.len()];

    for entry in entries {
        for output in &entry.outputs {
            let Some(record) = &output.record else {
                result.skipped += 1;
                tracing::debug!(
                    model = %output.model,
                    patient = ?entry.patient_id,
                    "skipping value with no prediction shape"
                );
                continue;
            };
            let Some(&i) = index.get(output.model.as_str()) else { continue };

            if record_kind(record) != result.series[i].kind() {
                tracing::warn!(
                    model = %output.model,
                    patient = ?entry.patient_id,
                    "model reports both classifier and regressor shapes, keeping classifier"
                );
                result.shape_conflicts.push(ShapeConflict {
                    model: output.model.clone(),
                    patient_id: entry.patient_id.clone(),
                });
                continue;
            }

            if let Some(pid) = entry.patient_id.as_deref() {
                if !seen[i].insert(pid) {
                    result.duplicates += 1;
                    tracing::debug!(model = %output.model, patient = pid, "duplicate patient record dropped");
                    continue;
                }
            }

            match (&mut result.series[i], record) {
                (ModelSeries::Classifier { records, .. }, PredictionRecord::Classifier(out)) => {
                    records.push(ClassifierRecord {
                        patient_id: entry.patient_id.clone(),
                        score: out.score,
                        pred: out.pred.clone(),
                        threshold: out.threshold,
                    });
                }
                (ModelSeries::Regressor { records, .. }, PredictionRecord::Regressor(out)) => {
                    records.push(RegressorRecord {
                        patient_id: entry.patient_id.clone(),
                        prediction: out.prediction,
                    });
                }
                _ => {}
            }
        }
    }

    result
}

#[inline]
fn record_kind(record: &PredictionRecord) -> ModelKind {
    match record {
        PredictionRecord::Classifier(_) => ModelKind::Classifier,
        PredictionRecord::Regressor(_) => ModelKind::Regressor,
    }
}
