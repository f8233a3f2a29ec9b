use super::aggregate::{summarize_values, ValueSummary};
use crate::config::EngineConfig;
use crate::models::payload::{ModelSummary, RiskArtifact};
use crate::models::splitter::{split, ShapeConflict};
use crate::models::{ClassifierRecord, ModelSeries, RegressorRecord};
use crate::risk::ranking::{positive_rate, rank, HighRiskEntry, RankingPolicy};
use crate::viz::bands::{BandCount, QuartileBands, RiskBands};
use crate::viz::histogram::{bin, bin_risk_scores, threshold_marker};
use crate::viz::{risk_chart_bins, value_chart_bins, ChartBin};
use serde::Serialize;
use smallvec::SmallVec;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifierView {
    pub name: String,
    pub records: usize,
    /// Records carrying a score.
    pub scored: usize,
    pub bins: Vec<ChartBin>,
    pub bands: SmallVec<[BandCount; 5]>,
    pub threshold: Option<f64>,
    pub threshold_marker: Option<f64>,
    pub high_risk: Vec<HighRiskEntry>,
    pub positive_rate: Option<f64>,
    pub reported: Option<ModelSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressorView {
    pub name: String,
    pub records: usize,
    pub bins: Vec<ChartBin>,
    pub quartiles: SmallVec<[BandCount; 4]>,
    pub summary: Option<ValueSummary>,
    pub reported: Option<ModelSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ModelView {
    Classifier(ClassifierView),
    Regressor(RegressorView),
}

impl ModelView {
    pub fn name(&self) -> &str {
        match self {
            Self::Classifier(v) => &v.name,
            Self::Regressor(v) => &v.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedModel {
    pub name: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dashboard {
    pub models: Vec<ModelView>,
    pub shape_conflicts: Vec<ShapeConflict>,
    pub skipped_records: usize,
    pub duplicate_records: usize,
    pub failed_models: Vec<FailedModel>,
}

impl Dashboard {
    pub fn model(&self, name: &str) -> Option<&ModelView> {
        self.models.iter().find(|m| m.name() == name)
    }
}

/// Full pipeline: split the payload, then bin, band and rank every series.
/// Pure: identical input and config give identical output.
pub fn build_dashboard(artifact: &RiskArtifact, cfg: &EngineConfig) -> Dashboard {
    let split = split(&artifact.patients);
    let bands = RiskBands::new(cfg.risk_band_boundaries);
    let policy = RankingPolicy {
        fallback_cutoff: cfg.fallback_cutoff,
        limit: cfg.high_risk_limit,
    };

    let models = split
        .series
        .iter()
        .map(|series| {
            let reported = artifact.summary_for(series.name()).cloned();
            match series {
                ModelSeries::Classifier { name, records } => {
                    ModelView::Classifier(classifier_view(name, records, reported, &bands, &policy, cfg))
                }
                ModelSeries::Regressor { name, records } => {
                    ModelView::Regressor(regressor_view(name, records, reported, cfg))
                }
            }
        })
        .collect();

    let failed_models = artifact
        .models
        .iter()
        .filter_map(|(name, s)| {
            s.error.as_ref().map(|e| FailedModel { name: name.clone(), error: e.clone() })
        })
        .collect();

    Dashboard {
        models,
        shape_conflicts: split.shape_conflicts,
        skipped_records: split.skipped + artifact.skipped_entries,
        duplicate_records: split.duplicates,
        failed_models,
    }
}

pub fn classifier_view(
    name: &str,
    records: &[ClassifierRecord],
    reported: Option<ModelSummary>,
    bands: &RiskBands,
    policy: &RankingPolicy,
    cfg: &EngineConfig,
) -> ClassifierView {
    let scores: Vec<f64> = records.iter().filter_map(|r| r.score).collect();
    let hist = bin_risk_scores(&scores, cfg.risk_bins, cfg.risk_clamp_epsilon);
    let threshold = records.iter().find_map(|r| r.threshold);

    ClassifierView {
        name: name.to_string(),
        records: records.len(),
        scored: scores.len(),
        bins: risk_chart_bins(&hist, bands),
        bands: bands.count_bins(&hist),
        threshold,
        threshold_marker: threshold.and_then(|t| threshold_marker(t, cfg.risk_bins)),
        high_risk: rank(records, policy),
        positive_rate: positive_rate(records, policy.fallback_cutoff),
        reported,
    }
}

pub fn regressor_view(
    name: &str,
    records: &[RegressorRecord],
    reported: Option<ModelSummary>,
    cfg: &EngineConfig,
) -> RegressorView {
    let values: Vec<f64> = records.iter().filter_map(|r| r.prediction).collect();
    let hist = bin(&values, cfg.value_bins, None);
    let bins = value_chart_bins(&hist);
    let colors: Vec<String> = bins.iter().map(|b| b.color.clone()).collect();

    RegressorView {
        name: name.to_string(),
        records: records.len(),
        quartiles: QuartileBands::new(cfg.value_bins).count(&hist, &colors),
        bins,
        summary: summarize_values(&values),
        reported,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_artifact() -> RiskArtifact {
        RiskArtifact::from_value(json!({
            "models": {
                "Readmission": {"threshold": 0.6, "positives": 2, "n": 5},
                "Mortality": {"error": "model artifact not found"}
            },
            "patients": [
                {"patient_id": "p1", "Readmission": {"score": 0.91, "pred": 1, "threshold": 0.6}, "LOS": {"prediction": 3.0}},
                {"patient_id": "p2", "Readmission": {"score": 0.12, "pred": 0, "threshold": 0.6}, "LOS": {"prediction": 7.5}},
                {"patient_id": "p3", "Readmission": {"score": 0.64, "pred": 1, "threshold": 0.6}, "LOS": {"prediction": 12.0}},
                {"patient_id": "p4", "Readmission": null, "LOS": {"prediction": 5.25}},
                {"patient_id": "p5", "Readmission": {"score": 1.0, "threshold": 0.6}, "LOS": "n/a"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_classifier_view() {
        let dash = build_dashboard(&sample_artifact(), &EngineConfig::default());
        let Some(ModelView::Classifier(view)) = dash.model("Readmission") else {
            panic!("Readmission should be a classifier");
        };

        assert_eq!(view.records, 4);
        assert_eq!(view.scored, 4);
        assert_eq!(view.bins.len(), 20);
        assert_eq!(view.bins.iter().map(|b| b.count).sum::<u64>(), 4);
        assert_eq!(view.bands.iter().map(|b| b.count).sum::<u64>(), 4);
        assert_eq!(view.bands[4].count, 2, "0.91 and 1.0 are High");
        assert_eq!(view.threshold, Some(0.6));
        let marker = view.threshold_marker.unwrap();
        assert!((marker - 0.6).abs() < 1e-9, "marker={marker}");

        let ids: Vec<_> = view.high_risk.iter().map(|e| e.patient_id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["p5", "p1", "p3"]);
        assert!((view.positive_rate.unwrap() - 0.75).abs() < 1e-12);
        assert_eq!(view.reported.as_ref().and_then(|r| r.positives), Some(2));
    }

    #[test]
    fn test_regressor_view() {
        let dash = build_dashboard(&sample_artifact(), &EngineConfig::default());
        let Some(ModelView::Regressor(view)) = dash.model("LOS") else {
            panic!("LOS should be a regressor");
        };

        assert_eq!(view.records, 4);
        assert_eq!(view.bins.len(), 20);
        assert_eq!(view.quartiles.len(), 4);
        assert_eq!(view.quartiles.iter().map(|q| q.count).sum::<u64>(), 4);
        let s = view.summary.unwrap();
        assert_eq!((s.min, s.max), (3.0, 12.0));
        assert!((s.mean - 6.9375).abs() < 1e-12);
        assert!(view.reported.is_none());
    }

    #[test]
    fn test_dashboard_bookkeeping() {
        let dash = build_dashboard(&sample_artifact(), &EngineConfig::default());
        assert_eq!(dash.models.len(), 2);
        assert_eq!(dash.skipped_records, 2, "null Readmission and string LOS");
        assert_eq!(dash.failed_models.len(), 1);
        assert_eq!(dash.failed_models[0].name, "Mortality");
    }

    #[test]
    fn test_empty_payload_is_no_data() {
        let artifact = RiskArtifact::from_value(json!({"patients": []})).unwrap();
        let dash = build_dashboard(&artifact, &EngineConfig::default());
        assert!(dash.models.is_empty());
        assert!(dash.shape_conflicts.is_empty());
    }

    #[test]
    fn test_classifier_without_scores_has_no_bins() {
        let artifact = RiskArtifact::from_value(json!({
            "patients": [{"patient_id": "p1", "M": {"score": null, "pred": true}}]
        }))
        .unwrap();
        let dash = build_dashboard(&artifact, &EngineConfig::default());
        let Some(ModelView::Classifier(view)) = dash.model("M") else { panic!("expected classifier") };
        assert!(view.bins.is_empty());
        assert!(view.bands.iter().all(|b| b.count == 0 && b.percentage == 0.0));
        assert_eq!(view.high_risk.len(), 1);
    }

    #[test]
    fn test_config_overrides_flow_through() {
        let cfg = EngineConfig {
            risk_bins: 10,
            value_bins: 8,
            high_risk_limit: 1,
            ..EngineConfig::default()
        };
        let dash = build_dashboard(&sample_artifact(), &cfg);
        let Some(ModelView::Classifier(c)) = dash.model("Readmission") else { panic!() };
        assert_eq!(c.bins.len(), 10);
        assert_eq!(c.high_risk.len(), 1);
        let Some(ModelView::Regressor(r)) = dash.model("LOS") else { panic!() };
        assert_eq!(r.bins.len(), 8);
    }

    #[test]
    fn test_pipeline_is_idempotent() {
        let artifact = sample_artifact();
        let cfg = EngineConfig::default();
        let a = serde_json::to_string(&build_dashboard(&artifact, &cfg)).unwrap();
        let b = serde_json::to_string(&build_dashboard(&artifact, &cfg)).unwrap();
        assert_eq!(a, b);
    }
}
