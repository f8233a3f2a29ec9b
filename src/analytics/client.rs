use super::types::*;
use crate::errors::{EngineError, EngineResult};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Client for the upstream analytics service. One attempt per call; all
/// methods return Result, never panic.
#[derive(Clone)]
pub struct AnalyticsClient {
    client: Client,
    base_url: String,
}

impl AnalyticsClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .pool_max_idle_per_host(4)
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn read_json<T: DeserializeOwned>(resp: Response, what: &str) -> EngineResult<T> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(EngineError::AnalyticsApi {
                status: status.as_u16(),
                body,
            });
        }

        resp.json::<T>().await.map_err(|e| EngineError::Parse(format!("{what}: {e}")))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> EngineResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.get(&url).send().await?;
        Self::read_json(resp, &format!("GET {path}")).await
    }

    // ── Endpoints ──

    /// GET /datasets, passed through untouched.
    pub async fn list_datasets(&self) -> EngineResult<Value> {
        self.get("/datasets").await
    }

    /// POST /analytics/run
    pub async fn run_analysis(&self, req: &RunAnalysisRequest) -> EngineResult<RunAnalysisResponse> {
        let url = format!("{}/analytics/run", self.base_url);
        tracing::info!(dataset_id = req.dataset_id, strategy_id = ?req.strategy_id, "requesting analysis run");
        let resp = self.client.post(&url).json(req).send().await?;
        Self::read_json(resp, "POST /analytics/run").await
    }

    /// GET /artifacts/get?path=... A body that is not the expected JSON is an
    /// artifact error rather than a request error.
    pub async fn fetch_artifact<T: DeserializeOwned>(&self, path: &str) -> EngineResult<T> {
        let url = format!("{}/artifacts/get", self.base_url);
        let resp = self.client.get(&url).query(&[("path", path)]).send().await?;
        Self::read_json(resp, &format!("artifact {path}"))
            .await
            .map_err(|e| match e {
                EngineError::Parse(msg) => EngineError::Artifact(msg),
                other => other,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalised() {
        let client = AnalyticsClient::new("http://127.0.0.1:8000///", 5);
        assert_eq!(client.base_url(), "http://127.0.0.1:8000");
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_network_error() {
        // port 9 (discard) is not expected to host an HTTP service
        let client = AnalyticsClient::new("http://127.0.0.1:9", 2);
        let err = client.list_datasets().await.unwrap_err();
        assert!(matches!(err, EngineError::Network(_)), "got {err:?}");
        assert_eq!(err.status_code(), 502);
    }
}
