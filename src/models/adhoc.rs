//! Single-patient prediction summary.
//!
//! An ad-hoc prediction returns one record per model for a single patient.
//! Classifier records become risk cards, regressor records become value cards;
//! everything else is ignored.

use super::payload::{PredFlag, PredictionRecord};
use crate::errors::{EngineError, EngineResult};
use crate::risk::ScoreLevel;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifierCard {
    pub model: String,
    pub positive: bool,
    pub score: Option<f64>,
    /// score * 100, absent score read as 0
    pub score_percent: f64,
    pub level: ScoreLevel,
    pub pred: Option<PredFlag>,
    pub threshold: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressorCard {
    pub model: String,
    pub prediction: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdhocSummary {
    pub classifiers: Vec<ClassifierCard>,
    pub regressors: Vec<RegressorCard>,
    pub positives: usize,
}

/// Summarise `{Model: {...}, ...}`. Model order follows the payload.
pub fn summarize_adhoc(result: &Value) -> EngineResult<AdhocSummary> {
    let obj = result
        .as_object()
        .ok_or_else(|| EngineError::InvalidRequest("prediction result must be a JSON object".into()))?;

    let mut summary = AdhocSummary::default();
    for (model, value) in obj {
        match PredictionRecord::from_adhoc_value(value) {
            Some(PredictionRecord::Classifier(out)) => {
                let positive = out.pred.as_ref().is_some_and(PredFlag::is_truthy);
                let score = out.score.unwrap_or(0.0);
                summary.positives += usize::from(positive);
                summary.classifiers.push(ClassifierCard {
                    model: model.clone(),
                    positive,
                    score: out.score,
                    score_percent: score * 100.0,
                    level: ScoreLevel::from_score(score),
                    pred: out.pred,
                    threshold: out.threshold,
                });
            }
            Some(PredictionRecord::Regressor(out)) => {
                summary.regressors.push(RegressorCard {
                    model: model.clone(),
                    prediction: out.prediction,
                });
            }
            None => {
                tracing::debug!(model = %model, "ignoring ad-hoc value with no prediction shape");
            }
        }
    }
    Ok(summary)
}
