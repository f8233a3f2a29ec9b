use crate::analytics::client::AnalyticsClient;
use crate::config::AppConfig;
use crate::report::aggregate::AnomalySummary;
use crate::report::dashboard::Dashboard;
use portable_atomic::{AtomicU64, Ordering};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;

// ── Published analysis ──

/// Everything the service learned from one upstream analysis run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AnalysisView {
    pub dataset_id: i64,
    pub strategy_id: Option<i64>,
    pub summary: Option<Value>,
    pub dashboard: Dashboard,
    pub anomalies: Option<AnomalySummary>,
    pub generated_at: String,
}

// ── Performance counters (lock-free) ──

pub struct PerfCounters {
    pub dashboards_built: AtomicU64,
    pub adhoc_summaries: AtomicU64,
    pub analyses_run: AtomicU64,
    pub artifacts_fetched: AtomicU64,
    pub upstream_errors: AtomicU64,
}

impl PerfCounters {
    pub fn new() -> Self {
        Self {
            dashboards_built: AtomicU64::new(0),
            adhoc_summaries: AtomicU64::new(0),
            analyses_run: AtomicU64::new(0),
            artifacts_fetched: AtomicU64::new(0),
            upstream_errors: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            dashboards_built: self.dashboards_built.load(Ordering::Relaxed),
            adhoc_summaries: self.adhoc_summaries.load(Ordering::Relaxed),
            analyses_run: self.analyses_run.load(Ordering::Relaxed),
            artifacts_fetched: self.artifacts_fetched.load(Ordering::Relaxed),
            upstream_errors: self.upstream_errors.load(Ordering::Relaxed),
        }
    }
}

impl Default for PerfCounters {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CounterSnapshot {
    pub dashboards_built: u64,
    pub adhoc_summaries: u64,
    pub analyses_run: u64,
    pub artifacts_fetched: u64,
    pub upstream_errors: u64,
}

// ── Application shared state (channels, not locks) ──

pub struct AppState {
    pub config: AppConfig,
    pub client: AnalyticsClient,

    // Last published analysis (watch = last write wins, readers never block)
    pub latest_tx: watch::Sender<Option<AnalysisView>>,
    pub latest_rx: watch::Receiver<Option<AnalysisView>>,

    pub counters: PerfCounters,
}

impl AppState {
    pub fn new(config: AppConfig) -> Arc<Self> {
        let client = AnalyticsClient::new(&config.analytics_base_url, config.upstream_timeout_secs);
        let (latest_tx, latest_rx) = watch::channel(None);

        Arc::new(Self {
            config,
            client,
            latest_tx,
            latest_rx,
            counters: PerfCounters::new(),
        })
    }

    #[inline]
    pub fn publish(&self, view: AnalysisView) {
        self.latest_tx.send_replace(Some(view));
    }

    pub fn latest(&self) -> Option<AnalysisView> {
        self.latest_rx.borrow().clone()
    }
}
