use crate::analytics::types::RunAnalysisRequest;
use crate::errors::{EngineError, EngineResult};
use crate::models::adhoc::{summarize_adhoc, AdhocSummary};
use crate::models::payload::{AnomalyArtifact, RiskArtifact};
use crate::report::aggregate::summarize_anomalies;
use crate::report::dashboard::{build_dashboard, Dashboard};
use crate::state::{AnalysisView, AppState, CounterSnapshot};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use portable_atomic::Ordering::Relaxed;
use serde_json::Value;
use std::sync::Arc;

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Count an upstream failure on its way out.
fn upstream<T>(state: &AppState, result: EngineResult<T>) -> EngineResult<T> {
    if let Err(e) = &result {
        state.counters.upstream_errors.fetch_add(1, Relaxed);
        tracing::warn!("analytics upstream error: {e}");
    }
    result
}

/// POST /api/dashboard -- risk artifact in, dashboard out (pure, no upstream)
pub async fn post_dashboard(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> EngineResult<Json<Dashboard>> {
    let artifact = RiskArtifact::from_value(body).map_err(|e| match e {
        EngineError::Artifact(msg) => EngineError::InvalidRequest(msg),
        other => other,
    })?;
    let dashboard = build_dashboard(&artifact, &state.config.engine);
    state.counters.dashboards_built.fetch_add(1, Relaxed);
    Ok(Json(dashboard))
}

/// POST /api/adhoc -- single prediction result. Accepts the bare model map
/// or the upstream reply `{patient_id, predictions: {...}}`.
pub async fn post_adhoc(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> EngineResult<Json<AdhocSummary>> {
    let result = match body.get("predictions") {
        Some(inner @ Value::Object(_)) => inner,
        _ => &body,
    };
    let summary = summarize_adhoc(result)?;
    state.counters.adhoc_summaries.fetch_add(1, Relaxed);
    Ok(Json(summary))
}

/// POST /api/analysis/run -- run upstream, fetch artifacts, build and publish
pub async fn post_run_analysis(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RunAnalysisRequest>,
) -> EngineResult<Json<AnalysisView>> {
    let run = upstream(&state, state.client.run_analysis(&req).await)?;

    let risk_path = run
        .risk_json
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| EngineError::Artifact("analysis run returned no risk artifact".into()))?;
    let raw: Value = upstream(&state, state.client.fetch_artifact(risk_path).await)?;
    state.counters.artifacts_fetched.fetch_add(1, Relaxed);
    let artifact = RiskArtifact::from_value(raw)?;

    // A failed anomaly fetch leaves `anomalies` empty.
    let anomalies = match run.anomaly_json.as_deref().filter(|p| !p.is_empty()) {
        Some(path) => match upstream(&state, state.client.fetch_artifact::<AnomalyArtifact>(path).await) {
            Ok(a) => {
                state.counters.artifacts_fetched.fetch_add(1, Relaxed);
                Some(summarize_anomalies(&a))
            }
            Err(_) => None,
        },
        None => None,
    };

    let dashboard = build_dashboard(&artifact, &state.config.engine);
    state.counters.dashboards_built.fetch_add(1, Relaxed);
    state.counters.analyses_run.fetch_add(1, Relaxed);

    tracing::info!(
        dataset_id = req.dataset_id,
        models = dashboard.models.len(),
        conflicts = dashboard.shape_conflicts.len(),
        skipped = dashboard.skipped_records,
        "analysis dashboard built"
    );

    let view = AnalysisView {
        dataset_id: req.dataset_id,
        strategy_id: req.strategy_id,
        summary: run.summary,
        dashboard,
        anomalies,
        generated_at: chrono::Utc::now().to_rfc3339(),
    };
    state.publish(view.clone());
    Ok(Json(view))
}

/// GET /api/dashboard/latest -- last published analysis (from watch channel, no lock)
pub async fn get_latest(State(state): State<Arc<AppState>>) -> Json<Option<AnalysisView>> {
    Json(state.latest())
}

/// GET /api/datasets -- upstream dataset list
pub async fn get_datasets(State(state): State<Arc<AppState>>) -> EngineResult<Json<Value>> {
    let datasets = upstream(&state, state.client.list_datasets().await)?;
    Ok(Json(datasets))
}

/// GET /api/counters -- performance counters (lock-free reads)
pub async fn get_counters(State(state): State<Arc<AppState>>) -> Json<CounterSnapshot> {
    Json(state.counters.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, EngineConfig};
    use serde_json::json;

    fn test_state() -> Arc<AppState> {
        AppState::new(AppConfig {
            analytics_base_url: "http://127.0.0.1:9".into(),
            server_port: 0,
            upstream_timeout_secs: 1,
            static_dir: "dashboard/dist".into(),
            engine: EngineConfig::default(),
        })
    }

    #[tokio::test]
    async fn test_post_dashboard_counts() {
        let state = test_state();
        let body = json!({
            "patients": [
                {"patient_id": "p1", "ModelA": {"score": 0.9}, "ModelB": {"prediction": 2.0}}
            ]
        });
        let Json(dash) = post_dashboard(State(state.clone()), Json(body)).await.unwrap();
        assert_eq!(dash.models.len(), 2);
        assert_eq!(state.counters.snapshot().dashboards_built, 1);
    }

    #[tokio::test]
    async fn test_post_dashboard_rejects_bad_root() {
        let err = post_dashboard(State(test_state()), Json(json!([1]))).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_post_adhoc_unwraps_predictions() {
        let body = json!({
            "patient_id": "p7",
            "predictions": {"SepsisEarlyWarning": {"score": 0.7, "pred": 1}},
            "strategy_id": null
        });
        let Json(summary) = post_adhoc(State(test_state()), Json(body)).await.unwrap();
        assert_eq!(summary.classifiers.len(), 1);
        assert_eq!(summary.positives, 1);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_counted() {
        let state = test_state();
        let err = get_datasets(State(state.clone())).await.unwrap_err();
        assert_eq!(err.status_code(), 502);
        assert_eq!(state.counters.snapshot().upstream_errors, 1);
    }

    #[test]
    fn test_error_response_status() {
        let resp = EngineError::InvalidRequest("nope".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let resp = EngineError::AnalyticsApi { status: 500, body: String::new() }.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }
}
