use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Requests ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunAnalysisRequest {
    pub dataset_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy_id: Option<i64>,
}

// ── Responses ──

/// Reply of `POST /analytics/run`. The two paths point at JSON artifacts
/// retrievable through `GET /artifacts/get`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunAnalysisResponse {
    #[serde(default)]
    pub summary: Option<Value>,
    #[serde(default)]
    pub risk_json: Option<String>,
    #[serde(default)]
    pub anomaly_json: Option<String>,
}

impl RunAnalysisResponse {
    /// Artifact paths that were actually returned, in fetch order.
    pub fn artifact_paths(&self) -> impl Iterator<Item = &str> {
        self.risk_json
            .as_deref()
            .into_iter()
            .chain(self.anomaly_json.as_deref())
            .filter(|p| !p.is_empty())
    }
}
