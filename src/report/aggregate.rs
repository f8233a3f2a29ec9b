//! Small derived statistics consumed by presentation.
//! All functions are pure.

use crate::models::payload::AnomalyArtifact;
use serde::Serialize;
use statrs::statistics::Statistics;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueSummary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Sample standard deviation; `None` below two observations.
    pub std_dev: Option<f64>,
}

/// min / max / mean over the finite values. `None` when there are none.
pub fn summarize_values(values: &[f64]) -> Option<ValueSummary> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }

    let std_dev = if finite.len() > 1 {
        Some(Statistics::std_dev(finite.iter()))
    } else {
        None
    };

    Some(ValueSummary {
        count: finite.len(),
        min: Statistics::min(finite.iter()),
        max: Statistics::max(finite.iter()),
        mean: Statistics::mean(finite.iter()),
        std_dev,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalySummary {
    pub method: Option<String>,
    pub flagged: u64,
    pub total: Option<u64>,
    pub flag_rate: Option<f64>,
    pub zscore_flags: u64,
    pub iqr_flags: u64,
}

/// Flag counts of an anomaly artifact. The artifact's own summary wins; the
/// flagged-patient list fills in what it leaves out.
pub fn summarize_anomalies(artifact: &AnomalyArtifact) -> AnomalySummary {
    let zscore_flags = artifact.patients.iter().filter(|p| p.zscore_any_gt3).count() as u64;
    let iqr_flags = artifact.patients.iter().filter(|p| p.iqr_outlier).count() as u64;
    let listed = artifact
        .patients
        .iter()
        .filter(|p| p.is_flagged())
        .count() as u64;

    let counts = artifact.summary.as_ref();
    let flagged = counts.and_then(|c| c.n_flagged).unwrap_or(listed);
    let total = counts.and_then(|c| c.n_total);
    let flag_rate = total.filter(|&t| t > 0).map(|t| flagged as f64 / t as f64);

    AnomalySummary {
        method: artifact.method.clone(),
        flagged,
        total,
        flag_rate,
        zscore_flags,
        iqr_flags,
    }
}
